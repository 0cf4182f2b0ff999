//! Knowledge-base document and ingestion models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document stored in the remote knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub chunk_count: usize,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of a document listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentPage {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub total: usize,
}

/// Filters for listing documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub search: Option<String>,
    pub source: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl DocumentQuery {
    /// Render as a query string (including the leading `?`), or empty.
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref search) = self.search {
            parts.push(format!("search={}", urlencoding::encode(search)));
        }
        if let Some(ref source) = self.source {
            parts.push(format!("source={}", urlencoding::encode(source)));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("limit={limit}"));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("offset={offset}"));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("?{}", parts.join("&"))
        }
    }
}

/// Result of ingesting a single file, URL or text body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResult {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub chunks_created: usize,
    #[serde(default)]
    pub message: Option<String>,
}

/// An entry of an RSS feed preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Outcome of ingesting an RSS feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RssIngestResult {
    #[serde(default)]
    pub ingested: usize,
    #[serde(default)]
    pub skipped: usize,
    #[serde(default)]
    pub failed: usize,
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Success/failure tally of a batch upload loop.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: usize,
    /// Item label and error message for each failure.
    pub failures: Vec<(String, String)>,
}

impl BatchOutcome {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, item: impl Into<String>, error: impl std::fmt::Display) {
        self.failures.push((item.into(), error.to_string()));
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed()
    }
}
