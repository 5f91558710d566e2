//! Per-session state store.
//!
//! Each store owns one update task. Events are applied strictly in arrival
//! order through [`update`], so the loading flag checked at submission time is
//! the only guard needed to keep a single request in flight. When an update
//! returns [`Command::SendChat`] the store spawns the request; its outcome is
//! fed back into the same queue as [`Event::ChatCompleted`].
//!
//! Subscribers observe snapshots through a [`watch`] channel and re-render on
//! change. [`ChatStore::flush`] waits until everything queued so far has been
//! applied.

use thiserror::Error;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::backend::{ChatRequest, RagClient};

use super::render::{ChatView, render};
use super::state::ChatState;
use super::update::{Command, Event, update};

/// The store's update task has stopped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("chat store is closed")]
pub struct StoreClosed;

/// Items on a store's queue.
#[derive(Debug)]
enum Input {
    Event(Event),
    /// Answered once every earlier item has been applied.
    Flush(oneshot::Sender<()>),
}

/// Handle to a session's chat state.
///
/// Cloning the handle is cheap; the update task stops once every handle is
/// dropped.
#[derive(Debug, Clone)]
pub struct ChatStore {
    events: UnboundedSender<Input>,
    state: watch::Receiver<ChatState>,
}

impl ChatStore {
    /// Start a store backed by `client`. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn(client: RagClient) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ChatState::new());

        tokio::spawn(run(client, events_tx.downgrade(), events_rx, state_tx));

        Self {
            events: events_tx,
            state: state_rx,
        }
    }

    /// Queue an event for the update task.
    pub fn dispatch(&self, event: Event) -> Result<(), StoreClosed> {
        self.events
            .send(Input::Event(event))
            .map_err(|SendError(_)| StoreClosed)
    }

    /// Wait until every event dispatched so far has been applied.
    pub async fn flush(&self) -> Result<(), StoreClosed> {
        let (tx, rx) = oneshot::channel();
        self.events
            .send(Input::Flush(tx))
            .map_err(|SendError(_)| StoreClosed)?;
        rx.await.ok().ok_or(StoreClosed)
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ChatState {
        self.state.borrow().clone()
    }

    /// Render the current state.
    #[must_use]
    pub fn view(&self) -> ChatView {
        render(&self.state.borrow())
    }

    /// A receiver that is notified after every processed event.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.clone()
    }

    /// Wait until the state satisfies `predicate`.
    ///
    /// Returns `None` if the store stops first.
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&ChatState) -> bool,
    ) -> Option<ChatState> {
        let mut rx = self.state.clone();
        let state = rx.wait_for(predicate).await.ok()?;
        Some(state.clone())
    }
}

async fn run(
    client: RagClient,
    events_tx: WeakUnboundedSender<Input>,
    mut events: UnboundedReceiver<Input>,
    state: watch::Sender<ChatState>,
) {
    while let Some(input) = events.recv().await {
        let event = match input {
            Input::Event(event) => event,
            Input::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };
        let mut command = None;
        state.send_modify(|current| command = update(current, event));

        if let Some(Command::SendChat(request)) = command {
            spawn_request(client.clone(), request, events_tx.clone());
        }
    }
    debug!("Chat store stopped");
}

fn spawn_request(client: RagClient, request: ChatRequest, events: WeakUnboundedSender<Input>) {
    tokio::spawn(async move {
        info!(
            name: "chat.request.sent",
            top_k = request.top_k,
            message_length = request.message.len(),
            "Chat request sent"
        );

        let call = tokio::spawn(async move { client.chat(&request).await });

        // The completion event is sent on every path, including a panicked call.
        let outcome = match call.await {
            Ok(Ok(response)) => {
                info!(
                    name: "chat.request.completed",
                    sources = response.sources().len(),
                    "Chat request completed"
                );
                Ok(response)
            }
            Ok(Err(err)) => {
                warn!(
                    name: "chat.request.failed",
                    kind = err.kind(),
                    error = %err,
                    "Chat request failed"
                );
                Err(err.to_string())
            }
            Err(join_error) => {
                error!(
                    name: "chat.request.aborted",
                    error = %join_error,
                    "Chat request task did not finish"
                );
                Err(join_error.to_string())
            }
        };

        match events.upgrade() {
            Some(tx) => {
                if tx.send(Input::Event(Event::ChatCompleted(outcome))).is_err() {
                    debug!("Chat store stopped before the response arrived");
                }
            }
            None => debug!("Chat store dropped before the response arrived"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::state::{Message, Role};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    fn send(store: &ChatStore, text: &str) {
        store
            .dispatch(Event::InputChanged(text.to_string()))
            .unwrap();
        store.dispatch(Event::SendClicked).unwrap();
    }

    async fn settled(store: &ChatStore, messages: usize) -> ChatState {
        tokio::time::timeout(
            Duration::from_secs(5),
            store.wait_until(|s| s.messages().len() == messages && !s.is_loading()),
        )
        .await
        .expect("store did not settle")
        .expect("store closed")
    }

    #[tokio::test]
    async fn answer_and_sources_reach_the_state() {
        let server = backend(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "X",
            "sources": [{ "source": "doc1", "score": 0.842 }]
        })))
        .await;
        let store = ChatStore::spawn(RagClient::new(server.uri()).unwrap());

        send(&store, "question");
        let state = settled(&store, 2).await;

        assert_eq!(
            state.messages(),
            &[Message::user("question"), Message::assistant("X")]
        );
        assert_eq!(store.view().sources[0].to_string(), "doc1 (score 0.842)");
        assert_eq!(state.input(), "");
    }

    #[tokio::test]
    async fn second_send_while_in_flight_issues_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "answer": "first answer" }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
        let store = ChatStore::spawn(RagClient::new(server.uri()).unwrap());

        send(&store, "first");
        send(&store, "second");
        let state = settled(&store, 2).await;

        assert_eq!(state.messages()[0], Message::user("first"));
        assert_eq!(state.messages()[1], Message::assistant("first answer"));
        assert_eq!(state.input(), "second");
        server.verify().await;
    }

    #[tokio::test]
    async fn server_error_becomes_inline_message() {
        let server =
            backend(ResponseTemplate::new(500).set_body_string("{\"detail\":\"Empty index\"}"))
                .await;
        let store = ChatStore::spawn(RagClient::new(server.uri()).unwrap());

        send(&store, "question");
        let state = settled(&store, 2).await;

        let reply = &state.messages()[1];
        assert_eq!(reply.role, Role::Assistant);
        assert!(reply.content.starts_with("Error:"));
        assert!(reply.content.contains("{\"detail\":\"Empty index\"}"));
        assert!(state.sources().is_empty());
    }

    #[tokio::test]
    async fn unreachable_backend_becomes_inline_message() {
        // Nothing listens on the discard port.
        let store = ChatStore::spawn(RagClient::new("http://127.0.0.1:9").unwrap());

        send(&store, "question");
        let state = settled(&store, 2).await;

        assert!(state.messages()[1].content.starts_with("Error: HTTP error"));
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn blank_input_never_calls_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let store = ChatStore::spawn(RagClient::new(server.uri()).unwrap());

        send(&store, "   ");
        store.flush().await.unwrap();

        let state = store.snapshot();
        assert!(state.messages().is_empty());
        assert!(!state.is_loading());
        server.verify().await;
    }

    #[tokio::test]
    async fn subscribers_see_each_change() {
        let server = backend(ResponseTemplate::new(200).set_body_json(json!({ "answer": "A" })))
            .await;
        let store = ChatStore::spawn(RagClient::new(server.uri()).unwrap());
        let mut rx = store.subscribe();

        send(&store, "q");
        rx.changed().await.unwrap();
        settled(&store, 2).await;

        assert_eq!(rx.borrow_and_update().messages().len(), 2);
    }
}
