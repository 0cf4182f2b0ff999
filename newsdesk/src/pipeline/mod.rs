//! Pipeline status narration.
//!
//! While the backend answers a question it emits named phase events over a
//! socket. This module parses them, turns them into status lines and keeps
//! the transient narrative for the current question.

mod events;
mod narrator;
mod socket;

pub use events::{PipelineEvent, PipelineEventKind};
pub use narrator::{LoggedEvent, Narrator};
pub use socket::{connect, PipelineSocket};
