//! HTTP client for the news assistant REST API.
//!
//! Endpoints:
//! - POST /api/auth/login, GET /api/auth/me
//! - GET|POST /api/chat/sessions, GET|DELETE /api/chat/sessions/{id}
//! - POST|DELETE /api/chat/sessions/{id}/messages
//! - POST /api/documents/upload (multipart), /api/documents/url, /api/documents/text
//! - GET /api/documents, DELETE /api/documents/{id}
//! - POST /api/rss/preview, /api/rss/ingest
//! - GET /api/stats, /api/health, /api/config

mod chat;
mod client;
mod documents;
mod system;

pub use chat::AssistantReply;
pub use client::ApiClient;
pub use system::LoginResponse;
