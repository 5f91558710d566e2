//! Session handles and the in-memory session registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::RagClient;
use crate::chat::store::StoreClosed;
use crate::chat::{ChatStore, ChatView, Event};

/// Sessions idle for longer than this are removed by the sweeper.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Longest session ID accepted from a request path.
const MAX_ID_LEN: usize = 64;

/// Whether `id` may name a session: 1 to 64 ASCII letters, digits, `-` or `_`.
///
/// Accepted IDs are safe to echo into URLs, headers and HTML attributes.
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// A single chat session.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Unique session identifier.
    id: String,
    /// The conversation.
    chat: ChatStore,
    /// Last dispatched event.
    last_activity: RwLock<DateTime<Utc>>,
}

impl Session {
    fn new(id: String, client: RagClient) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                chat: ChatStore::spawn(client),
                last_activity: RwLock::new(Utc::now()),
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The session's chat store.
    #[must_use]
    pub fn chat(&self) -> &ChatStore {
        &self.inner.chat
    }

    /// Forward an event to the chat store and mark the session active.
    pub fn dispatch(&self, event: Event) -> Result<(), StoreClosed> {
        self.touch();
        self.inner.chat.dispatch(event)
    }

    /// Render the current conversation.
    #[must_use]
    pub fn view(&self) -> ChatView {
        self.inner.chat.view()
    }

    fn touch(&self) {
        let mut guard = self.inner.last_activity.write().unwrap();
        *guard = Utc::now();
    }

    /// Check if the session has been idle longer than `timeout`.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let last = *self.inner.last_activity.read().unwrap();
        // A negative span means the clock moved backwards; keep the session.
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }
}

/// Thread-safe registry of sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    client: RagClient,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Create an empty registry whose sessions talk to `client`.
    #[must_use]
    pub fn new(client: RagClient) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                client,
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create a new session and return it.
    #[must_use]
    pub fn create(&self) -> Session {
        self.get_or_create(&Uuid::new_v4().to_string())
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        let guard = self.inner.sessions.read().unwrap();
        guard.get(id).cloned()
    }

    /// Get a session by ID, creating it if it doesn't exist.
    #[must_use]
    pub fn get_or_create(&self, id: &str) -> Session {
        if let Some(session) = self.get(id) {
            return session;
        }

        let mut guard = self.inner.sessions.write().unwrap();
        guard
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(session_id = %id, "Created session");
                Session::new(id.to_string(), self.inner.client.clone())
            })
            .clone()
    }

    /// Get or create the session named by a client-supplied `id`.
    ///
    /// Returns `None` without touching the registry when `id` is not a valid
    /// session ID.
    #[must_use]
    pub fn open(&self, id: &str) -> Option<Session> {
        is_valid_id(id).then(|| self.get_or_create(id))
    }

    /// The backend client shared by every session.
    #[must_use]
    pub fn client(&self) -> &RagClient {
        &self.inner.client
    }

    /// Remove a session by ID.
    pub fn remove(&self, id: &str) -> Option<Session> {
        let mut guard = self.inner.sessions.write().unwrap();
        guard.remove(id)
    }

    /// Get the number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.sessions.read().unwrap().len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all sessions idle longer than [`DEFAULT_SESSION_TIMEOUT`].
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_with_timeout(DEFAULT_SESSION_TIMEOUT)
    }

    /// Remove sessions that have been inactive longer than the timeout.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.inner.sessions.write().unwrap();
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    /// Periodically drop idle sessions.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = store.cleanup_expired();
                if removed > 0 {
                    info!(
                        name: "session.expired",
                        removed,
                        remaining = store.len(),
                        "Removed idle sessions"
                    );
                }
            }
        })
    }

    /// List all session IDs.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.inner
            .sessions
            .read()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }
}
