//! State transitions for the chat view.
//!
//! [`update`] is the only place [`ChatState`] changes. It never performs I/O:
//! when a submission is accepted it returns a [`Command`] describing the
//! request to issue, and the request's outcome comes back later as
//! [`Event::ChatCompleted`].

use crate::backend::{ChatRequest, ChatResponse};

use super::state::{ChatState, Message};

/// Keys the input bar reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

/// Something that happened to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The input bar now holds this text.
    InputChanged(String),
    /// A key was pressed inside the input bar.
    KeyPressed(Key),
    /// The send button was clicked.
    SendClicked,
    /// The outstanding chat request finished. Errors carry their description.
    ChatCompleted(Result<ChatResponse, String>),
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Issue exactly one chat request to the backend.
    SendChat(ChatRequest),
}

/// Apply `event` to `state`.
pub fn update(state: &mut ChatState, event: Event) -> Option<Command> {
    match event {
        Event::InputChanged(text) => {
            state.set_input(text);
            None
        }
        Event::KeyPressed(Key::Enter) | Event::SendClicked => submit(state),
        Event::KeyPressed(Key::Other) => None,
        Event::ChatCompleted(outcome) => {
            complete(state, outcome);
            None
        }
    }
}

fn submit(state: &mut ChatState) -> Option<Command> {
    if state.is_loading() {
        return None;
    }
    let question = state.input().trim();
    if question.is_empty() {
        return None;
    }
    let question = question.to_string();

    state.push(Message::user(question.clone()));
    state.take_input();
    state.set_loading(true);

    Some(Command::SendChat(ChatRequest::new(question)))
}

fn complete(state: &mut ChatState, outcome: Result<ChatResponse, String>) {
    match outcome {
        Ok(response) => {
            let (answer, sources) = response.into_parts();
            state.push(Message::assistant(answer));
            state.replace_sources(sources);
        }
        Err(description) => {
            state.push(Message::assistant(format!("Error: {description}")));
        }
    }
    state.set_loading(false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SourceCitation;
    use crate::chat::state::Role;

    fn typed(text: &str) -> ChatState {
        let mut state = ChatState::new();
        update(&mut state, Event::InputChanged(text.to_string()));
        state
    }

    fn in_flight(question: &str) -> ChatState {
        let mut state = typed(question);
        assert!(update(&mut state, Event::SendClicked).is_some());
        state
    }

    #[test]
    fn empty_or_whitespace_input_is_ignored() {
        for text in ["", "   ", "\n\t "] {
            let mut state = typed(text);
            assert_eq!(update(&mut state, Event::SendClicked), None);
            assert_eq!(update(&mut state, Event::KeyPressed(Key::Enter)), None);
            assert!(state.messages().is_empty());
            assert!(!state.is_loading());
        }
    }

    #[test]
    fn submit_appends_trimmed_user_message_and_requests_once() {
        let mut state = typed("  what is RAG?  ");
        let command = update(&mut state, Event::SendClicked);

        assert_eq!(
            command,
            Some(Command::SendChat(ChatRequest::new("what is RAG?")))
        );
        assert_eq!(state.messages(), &[Message::user("what is RAG?")]);
        assert_eq!(state.input(), "");
        assert!(state.is_loading());
    }

    #[test]
    fn submit_while_loading_is_ignored() {
        let mut state = in_flight("first");
        update(&mut state, Event::InputChanged("second".to_string()));

        assert_eq!(update(&mut state, Event::SendClicked), None);
        assert_eq!(update(&mut state, Event::KeyPressed(Key::Enter)), None);
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.input(), "second");
    }

    #[test]
    fn enter_matches_send_button() {
        let mut by_key = typed("hello");
        let mut by_click = typed("hello");

        let key_command = update(&mut by_key, Event::KeyPressed(Key::Enter));
        let click_command = update(&mut by_click, Event::SendClicked);

        assert_eq!(key_command, click_command);
        assert_eq!(by_key, by_click);
    }

    #[test]
    fn other_keys_do_not_submit() {
        let mut state = typed("hello");
        assert_eq!(update(&mut state, Event::KeyPressed(Key::Other)), None);
        assert!(state.messages().is_empty());
    }

    #[test]
    fn success_appends_answer_and_replaces_sources() {
        let mut state = in_flight("q");
        let response = ChatResponse::new(
            "X",
            vec![SourceCitation {
                source: "doc1".to_string(),
                score: 0.842,
            }],
        );

        update(&mut state, Event::ChatCompleted(Ok(response)));

        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1], Message::assistant("X"));
        assert_eq!(state.sources().len(), 1);
        assert_eq!(state.sources()[0].source, "doc1");
        assert!(!state.is_loading());
        assert_eq!(state.input(), "");
    }

    #[test]
    fn sources_are_replaced_not_accumulated() {
        let mut state = in_flight("q1");
        let first = ChatResponse::new(
            "a1",
            vec![
                SourceCitation {
                    source: "a.md".to_string(),
                    score: 0.9,
                },
                SourceCitation {
                    source: "b.md".to_string(),
                    score: 0.8,
                },
            ],
        );
        update(&mut state, Event::ChatCompleted(Ok(first)));

        update(&mut state, Event::InputChanged("q2".to_string()));
        update(&mut state, Event::SendClicked);
        update(
            &mut state,
            Event::ChatCompleted(Ok(ChatResponse::new("a2", Vec::new()))),
        );

        assert!(state.sources().is_empty());
        assert_eq!(state.messages().len(), 4);
    }

    #[test]
    fn failure_appends_single_error_message() {
        let mut state = in_flight("q");
        update(
            &mut state,
            Event::ChatCompleted(Err("Internal Server Error".to_string())),
        );

        let assistant: Vec<_> = state
            .messages()
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
        assert_eq!(assistant[0].content, "Error: Internal Server Error");
        assert!(!state.is_loading());
        assert_eq!(state.input(), "");
    }

    #[test]
    fn failure_keeps_previous_sources() {
        let mut state = in_flight("q1");
        let response = ChatResponse::new(
            "a1",
            vec![SourceCitation {
                source: "kept.md".to_string(),
                score: 0.5,
            }],
        );
        update(&mut state, Event::ChatCompleted(Ok(response)));

        update(&mut state, Event::InputChanged("q2".to_string()));
        update(&mut state, Event::SendClicked);
        update(&mut state, Event::ChatCompleted(Err("boom".to_string())));

        assert_eq!(state.sources()[0].source, "kept.md");
    }
}
