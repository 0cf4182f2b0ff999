//! Active conversation state and its terminal rendering.

mod render;
mod store;

pub(crate) use render::truncate;
pub use render::{render_message, render_session_row, render_sources};
pub use store::ConversationStore;
