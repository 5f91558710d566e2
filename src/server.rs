use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        Html, IntoResponse, Redirect,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::chat::{ChatView, Event, Key, html, render};
use crate::config::AppConfig;
use crate::session::Session;

/// How often idle sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = AppState::new(Arc::clone(&config))?;
    info!(
        name: "backend.config.loaded",
        base_url = %state.sessions.client().base_url(),
        "Backend configuration loaded"
    );

    // Probe in the background; the backend may come up after us.
    let probe = state.sessions.client().clone();
    tokio::spawn(async move {
        match probe.health().await {
            Ok(()) => info!(name: "backend.health.ok", "Backend is reachable"),
            Err(e) => warn!(
                name: "backend.health.failed",
                kind = e.kind(),
                error = %e,
                "Backend health check failed; chat requests will fail until it is up"
            ),
        }
    });

    state.sessions.spawn_sweeper(SWEEP_INTERVAL);
    let app = router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/sessions/{id}/view", get(api_view))
        .route("/sessions/{id}/stream", get(api_stream))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/sessions/{id}", get(chat_page))
        .route("/sessions/{id}/send", post(send_handler))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the session named in the path, or 404 for a malformed ID.
fn open_session(state: &AppState, id: &str) -> Result<Session, StatusCode> {
    state.sessions.open(id).ok_or_else(|| {
        debug!(session_id = %id.escape_debug(), "Rejected malformed session id");
        StatusCode::NOT_FOUND
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Start a new conversation.
async fn index_handler(State(state): State<AppState>) -> Redirect {
    let session = state.sessions.create();
    info!(session_id = %session.id(), "Started chat session");
    Redirect::to(&format!("/sessions/{}", session.id()))
}

/// GET /sessions/{id} - Render the chat page.
async fn chat_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let session = open_session(&state, &id)?;
    Ok(Html(html::page(session.id(), &session.view())))
}

/// Form body of the input bar.
#[derive(Debug, Deserialize)]
struct SendForm {
    /// Input bar contents.
    #[serde(default)]
    message: String,
    /// Which control submitted the form. The page itself always posts
    /// `button`, since a browser submits an Enter press through the default
    /// button. Other clients may post `enter`; both go through the same
    /// transition.
    #[serde(default)]
    via: Option<String>,
}

/// POST /sessions/{id}/send - Submit the input bar.
async fn send_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<SendForm>,
) -> Result<Redirect, (StatusCode, String)> {
    let session = open_session(&state, &id).map_err(|status| (status, String::new()))?;
    let trigger = match form.via.as_deref() {
        Some("enter") => Event::KeyPressed(Key::Enter),
        _ => Event::SendClicked,
    };

    submit(&session, form.message, trigger).await.map_err(|e| {
        warn!(session_id = %session.id(), error = %e, "Dropped submission");
        (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    })?;

    Ok(Redirect::to(&format!("/sessions/{}", session.id())))
}

/// Feed the input text and the trigger, then wait until both are applied so
/// the following page load shows the result.
async fn submit(
    session: &Session,
    message: String,
    trigger: Event,
) -> Result<(), crate::chat::store::StoreClosed> {
    session.dispatch(Event::InputChanged(message))?;
    session.dispatch(trigger)?;
    session.chat().flush().await
}

/// GET /health - Liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/sessions/{id}/view - Current view model as JSON.
async fn api_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChatView>, StatusCode> {
    Ok(Json(open_session(&state, &id)?.view()))
}

/// GET /api/sessions/{id}/stream - One `view` event per state change.
async fn api_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>> + Send>, StatusCode> {
    let session = open_session(&state, &id)?;
    info!(session_id = %session.id(), "Starting view stream");

    let stream = WatchStream::new(session.chat().subscribe()).map(|chat| {
        let json = serde_json::to_string(&render(&chat)).unwrap_or_else(|_| "{}".to_string());
        Ok(SseEvent::default().event("view").data(json))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
