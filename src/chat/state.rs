//! Conversation state.

use serde::{Deserialize, Serialize};

use crate::backend::SourceCitation;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Everything the chat view holds for one session.
///
/// Only [`crate::chat::update`] mutates this. The message log is append-only;
/// the source list is replaced wholesale on every successful answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    messages: Vec<Message>,
    input: String,
    loading: bool,
    sources: Vec<SourceCitation>,
}

impl ChatState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation log in chronological order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current contents of the input bar.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// True while a chat request is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Citations from the most recent successful answer.
    #[must_use]
    pub fn sources(&self) -> &[SourceCitation] {
        &self.sources
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn set_input(&mut self, input: String) {
        self.input = input;
    }

    pub(crate) fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(crate) fn replace_sources(&mut self, sources: Vec<SourceCitation>) {
        self.sources = sources;
    }
}
