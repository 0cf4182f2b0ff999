//! Pipeline event parsing.
//!
//! Frames arrive as JSON text, either `{"event": "<name>", "data": {...}}`
//! or the two-element array form `["<name>", {...}]`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed vocabulary of phase events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineEventKind {
    EmbeddingStart,
    EmbeddingDone,
    SearchStart,
    SearchResults,
    RagContext,
    AiStart,
    AiDone,
}

impl PipelineEventKind {
    pub const ALL: [Self; 7] = [
        Self::EmbeddingStart,
        Self::EmbeddingDone,
        Self::SearchStart,
        Self::SearchResults,
        Self::RagContext,
        Self::AiStart,
        Self::AiDone,
    ];

    /// Wire name of the event.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmbeddingStart => "embedding_start",
            Self::EmbeddingDone => "embedding_done",
            Self::SearchStart => "search_start",
            Self::SearchResults => "search_results",
            Self::RagContext => "rag_context",
            Self::AiStart => "ai_start",
            Self::AiDone => "ai_done",
        }
    }

    /// Parse a wire name. Anything outside the vocabulary is `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for PipelineEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recognised pipeline event with its opaque payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineEvent {
    pub kind: PipelineEventKind,
    pub payload: Value,
}

impl PipelineEvent {
    pub const fn new(kind: PipelineEventKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    /// Parse a socket text frame.
    ///
    /// Returns `None` for malformed JSON, frames without an event name and
    /// names outside the vocabulary.
    pub fn parse_frame(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let value: Value = serde_json::from_str(text).ok()?;

        let (name, payload) = match value {
            Value::Object(mut obj) => {
                let name = obj
                    .get("event")
                    .or_else(|| obj.get("type"))
                    .and_then(Value::as_str)
                    .map(String::from)?;
                let payload = obj.remove("data").unwrap_or(Value::Null);
                (name, payload)
            }
            Value::Array(mut items) if !items.is_empty() => {
                let payload = if items.len() > 1 {
                    items.swap_remove(1)
                } else {
                    Value::Null
                };
                let name = items.first().and_then(Value::as_str).map(String::from)?;
                (name, payload)
            }
            _ => return None,
        };

        PipelineEventKind::parse(&name).map(|kind| Self::new(kind, payload))
    }

    /// Count carried by the payload: `count`, else the length of the first
    /// of `results`, `passages` or `context` that is an array, else 0.
    pub fn count(&self) -> usize {
        if let Some(n) = self.payload.get("count").and_then(Value::as_u64) {
            return usize::try_from(n).unwrap_or(usize::MAX);
        }
        ["results", "passages", "context"]
            .iter()
            .find_map(|key| self.payload.get(*key).and_then(Value::as_array))
            .map_or(0, Vec::len)
    }

    /// The status line this event narrates.
    pub fn status_line(&self) -> String {
        match self.kind {
            PipelineEventKind::EmbeddingStart => "Embedding your question...".to_string(),
            PipelineEventKind::EmbeddingDone => "Question embedded".to_string(),
            PipelineEventKind::SearchStart => "Searching the knowledge base...".to_string(),
            PipelineEventKind::SearchResults => {
                let n = self.count();
                format!("Found {n} candidate {}", plural(n, "passage"))
            }
            PipelineEventKind::RagContext => {
                let n = self.count();
                format!("Using {n} context {}", plural(n, "passage"))
            }
            PipelineEventKind::AiStart => "Generating answer...".to_string(),
            PipelineEventKind::AiDone => "Answer ready".to_string(),
        }
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}
