//! Client for the retrieval-augmented chat backend.
//!
//! The backend itself (retrieval, embedding, answer synthesis) is an external
//! service. This module only speaks its HTTP contract:
//!
//! - `POST /api/chat` with `{"message": ..., "top_k": 4}`
//! - `GET /api/health`
//!
//! # Example
//!
//! ```rust,no_run
//! use jarvis_chat::backend::{ChatRequest, RagClient};
//!
//! # async fn example() -> Result<(), jarvis_chat::backend::BackendError> {
//! let client = RagClient::new("http://localhost:8000")?;
//! let response = client.chat(&ChatRequest::new("What is in the handbook?")).await?;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod types;

pub use client::RagClient;
pub use error::BackendError;
pub use types::{ChatRequest, ChatResponse, DEFAULT_TOP_K, SourceCitation};
