//! Wire types for the chat backend.

use serde::{Deserialize, Serialize};

/// Number of documents the backend is asked to retrieve per question.
pub const DEFAULT_TOP_K: u32 = 4;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    /// The user's question.
    pub message: String,
    /// Maximum number of retrieved documents the backend should consider.
    pub top_k: u32,
}

impl ChatRequest {
    /// Build a request with the fixed retrieval depth.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Successful response from `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    /// Synthesized answer text.
    pub answer: String,
    /// Documents the answer was grounded on. Absent and `null` both mean none.
    #[serde(default)]
    sources: Option<Vec<SourceCitation>>,
}

impl ChatResponse {
    #[must_use]
    pub fn new(answer: impl Into<String>, sources: Vec<SourceCitation>) -> Self {
        Self {
            answer: answer.into(),
            sources: Some(sources),
        }
    }

    /// Source citations, empty when the backend sent none.
    #[must_use]
    pub fn sources(&self) -> &[SourceCitation] {
        self.sources.as_deref().unwrap_or_default()
    }

    /// Split into answer and citations.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SourceCitation>) {
        (self.answer, self.sources.unwrap_or_default())
    }
}

/// A pointer to a document used to produce an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    /// Document identifier (usually a file name).
    pub source: String,
    /// Relevance score reported by the retriever.
    pub score: f64,
}
