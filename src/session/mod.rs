//! Chat session management.
//!
//! Every browser conversation gets its own [`Session`] that owns a
//! [`crate::chat::ChatStore`]. New sessions get a UUID; IDs taken from request
//! paths must pass [`is_valid_id`]. Sessions live in memory only and
//! are dropped after a period of inactivity.
//!
//! # Example
//!
//! ```rust,no_run
//! use jarvis_chat::backend::RagClient;
//! use jarvis_chat::chat::Event;
//! use jarvis_chat::session::SessionStore;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SessionStore::new(RagClient::new("http://localhost:8000")?);
//! let session = store.create();
//! session.dispatch(Event::InputChanged("Hello!".into()))?;
//! session.dispatch(Event::SendClicked)?;
//! # Ok(())
//! # }
//! ```

mod registry;

pub use registry::{DEFAULT_SESSION_TIMEOUT, Session, SessionStore, is_valid_id};
