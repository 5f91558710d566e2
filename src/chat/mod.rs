//! The chat view: state, updates, rendering and the per-session store.
//!
//! The view is split along a unidirectional data flow:
//!
//! - [`state`]: the data a conversation holds
//! - [`update`]: the pure `update(state, event)` transition
//! - [`render`]: the pure `render(state)` view model
//! - [`html`]: HTML output for the view model
//! - [`store`]: a serialized event queue per session that runs the one
//!   network effect and publishes snapshots to subscribers

pub mod html;
pub mod render;
pub mod state;
pub mod store;
pub mod update;

pub use render::{Alignment, Bubble, BubbleStyle, ChatView, SourceLine, render};
pub use state::{ChatState, Message, Role};
pub use store::ChatStore;
pub use update::{Command, Event, Key, update};
