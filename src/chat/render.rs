//! Pure rendering of [`ChatState`] into a framework-independent view model.

use std::fmt;

use serde::Serialize;

use super::state::{ChatState, Role};

/// Shown when the conversation is empty.
pub const PLACEHOLDER: &str = "Ask anything about your ingested docs.";

/// Shown after the last message while a request is outstanding.
pub const THINKING: &str = "Thinking…";

/// Everything needed to draw the chat view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatView {
    /// Static prompt, present only when there are no messages.
    pub placeholder: Option<&'static str>,
    /// Conversation bubbles in log order.
    pub bubbles: Vec<Bubble>,
    /// Whether the thinking indicator follows the last bubble.
    pub thinking: bool,
    /// Source list below the conversation. Empty means the list is hidden.
    pub sources: Vec<SourceLine>,
    /// The input bar.
    pub input: InputBar,
}

/// Horizontal placement of a bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Right,
}

/// Visual style of a bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleStyle {
    User,
    Assistant,
}

impl BubbleStyle {
    /// CSS classes for this style.
    #[must_use]
    pub fn classes(self) -> &'static str {
        match self {
            Self::User => "bubble bubble-user",
            Self::Assistant => "bubble bubble-assistant",
        }
    }
}

impl Alignment {
    /// CSS classes for this alignment.
    #[must_use]
    pub fn classes(self) -> &'static str {
        match self {
            Self::Left => "row row-left",
            Self::Right => "row row-right",
        }
    }
}

/// A single rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bubble {
    pub alignment: Alignment,
    pub style: BubbleStyle,
    pub text: String,
}

/// A rendered source citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLine {
    /// Document identifier.
    pub source: String,
    /// Score formatted to exactly three decimals.
    pub score: String,
}

impl fmt::Display for SourceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (score {})", self.source, self.score)
    }
}

/// The input control and its send button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputBar {
    pub value: String,
    pub send_disabled: bool,
}

/// Render the view model for `state`.
#[must_use]
pub fn render(state: &ChatState) -> ChatView {
    let bubbles = state
        .messages()
        .iter()
        .map(|message| match message.role {
            Role::User => Bubble {
                alignment: Alignment::Right,
                style: BubbleStyle::User,
                text: message.content.clone(),
            },
            Role::Assistant => Bubble {
                alignment: Alignment::Left,
                style: BubbleStyle::Assistant,
                text: message.content.clone(),
            },
        })
        .collect::<Vec<_>>();

    let sources = state
        .sources()
        .iter()
        .map(|citation| SourceLine {
            source: citation.source.clone(),
            score: format_score(citation.score),
        })
        .collect();

    ChatView {
        placeholder: bubbles.is_empty().then_some(PLACEHOLDER),
        bubbles,
        thinking: state.is_loading(),
        sources,
        input: InputBar {
            value: state.input().to_string(),
            send_disabled: state.is_loading(),
        },
    }
}

/// Format `score` with exactly three decimals.
///
/// `{:.3}` rounds an exact half to even (`0.0625` gives `0.062`). Scores round
/// halves away from zero instead (`0.063`), matching JavaScript's `toFixed`.
fn format_score(score: f64) -> String {
    let rounded = format!("{score:.3}");
    if !score.is_finite() {
        return rounded;
    }

    // Any value that is exactly halfway between two three-decimal numbers has
    // a terminating expansion of four fractional digits, the last being 5.
    let exact = format!("{:.64}", score.abs());
    let Some((whole, frac)) = exact.split_once('.') else {
        return rounded;
    };
    let is_half = frac.as_bytes()[3] == b'5' && frac.bytes().skip(4).all(|b| b == b'0');
    if !is_half {
        return rounded;
    }

    let mut digits = format!("{whole}{}", &frac[..3]).into_bytes();
    let mut carry = true;
    for digit in digits.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            carry = false;
            break;
        }
    }
    if carry {
        digits.insert(0, b'1');
    }

    let (int_part, frac_part) = digits.split_at(digits.len() - 3);
    format!(
        "{sign}{}.{}",
        String::from_utf8_lossy(int_part),
        String::from_utf8_lossy(frac_part),
        sign = if score.is_sign_negative() { "-" } else { "" },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatResponse, SourceCitation};
    use crate::chat::update::{Event, update};

    fn answered(answer: &str, sources: Vec<SourceCitation>) -> ChatState {
        let mut state = ChatState::new();
        update(&mut state, Event::InputChanged("question".to_string()));
        update(&mut state, Event::SendClicked);
        update(
            &mut state,
            Event::ChatCompleted(Ok(ChatResponse::new(answer, sources))),
        );
        state
    }

    #[test]
    fn empty_log_shows_placeholder() {
        let view = render(&ChatState::new());
        assert_eq!(view.placeholder, Some(PLACEHOLDER));
        assert!(view.bubbles.is_empty());
        assert!(!view.thinking);
        assert!(!view.input.send_disabled);
    }

    #[test]
    fn user_right_assistant_left_in_order() {
        let view = render(&answered("answer", Vec::new()));

        assert_eq!(view.placeholder, None);
        assert_eq!(
            view.bubbles,
            vec![
                Bubble {
                    alignment: Alignment::Right,
                    style: BubbleStyle::User,
                    text: "question".to_string(),
                },
                Bubble {
                    alignment: Alignment::Left,
                    style: BubbleStyle::Assistant,
                    text: "answer".to_string(),
                },
            ]
        );
    }

    #[test]
    fn loading_shows_thinking_and_disables_send() {
        let mut state = ChatState::new();
        update(&mut state, Event::InputChanged("q".to_string()));
        update(&mut state, Event::SendClicked);

        let view = render(&state);
        assert!(view.thinking);
        assert!(view.input.send_disabled);
        assert_eq!(view.input.value, "");
    }

    #[test]
    fn sources_use_three_decimals() {
        let view = render(&answered(
            "X",
            vec![
                SourceCitation {
                    source: "doc1".to_string(),
                    score: 0.842,
                },
                SourceCitation {
                    source: "notes.md".to_string(),
                    score: 0.5,
                },
            ],
        ));

        let lines: Vec<String> = view.sources.iter().map(ToString::to_string).collect();
        assert_eq!(lines, vec!["doc1 (score 0.842)", "notes.md (score 0.500)"]);
    }

    #[test]
    fn exact_half_scores_round_away_from_zero() {
        assert_eq!(format_score(0.0625), "0.063");
        assert_eq!(format_score(0.1875), "0.188");
        assert_eq!(format_score(0.3125), "0.313");
        assert_eq!(format_score(-0.0625), "-0.063");
        assert_eq!(format_score(2.5625), "2.563");
    }

    #[test]
    fn other_scores_round_to_nearest() {
        assert_eq!(format_score(0.0005), "0.001");
        assert_eq!(format_score(0.842), "0.842");
        assert_eq!(format_score(0.12349), "0.123");
        assert_eq!(format_score(0.9999), "1.000");
        assert_eq!(format_score(1.0), "1.000");
        assert_eq!(format_score(f64::NAN), "NaN");
    }

    #[test]
    fn source_line_uses_half_away_rounding() {
        let view = render(&answered(
            "X",
            vec![SourceCitation {
                source: "doc1".to_string(),
                score: 0.0625,
            }],
        ));
        assert_eq!(view.sources[0].to_string(), "doc1 (score 0.063)");
    }

    #[test]
    fn no_sources_means_empty_list() {
        let view = render(&answered("X", Vec::new()));
        assert!(view.sources.is_empty());
    }
}
