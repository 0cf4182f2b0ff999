//! Data models exchanged with the news assistant backend.

mod document;
mod message;
mod session;
mod system;
mod user;

pub use document::{
    BatchOutcome, Document, DocumentPage, DocumentQuery, IngestResult, RssIngestResult, RssItem,
};
pub use message::{ChatMessage, ContextPassage, MessageRole};
pub use session::ChatSession;
pub use system::{Health, ServerConfig, Stats};
pub use user::User;
