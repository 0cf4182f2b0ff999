//! Backend health, configuration and statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Response of the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Per-component status, e.g. `database -> ok`.
    #[serde(default)]
    pub components: BTreeMap<String, String>,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "ok" | "healthy" | "up")
    }
}

/// Retrieval configuration reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default)]
    pub llm_model: Option<String>,
    #[serde(default)]
    pub top_k: Option<u32>,
    #[serde(default)]
    pub chunk_size: Option<u32>,
}

/// Knowledge-base and conversation statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total_documents: usize,
    #[serde(default)]
    pub total_chunks: usize,
    #[serde(default)]
    pub total_sessions: usize,
    #[serde(default)]
    pub total_messages: usize,
    #[serde(default)]
    pub documents_by_source: BTreeMap<String, usize>,
}
