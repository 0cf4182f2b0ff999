//! Chat session model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::ChatMessage;

/// A conversation owned by the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Ordered by `created_at`. Listing endpoints omit this.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Message count reported by listing endpoints.
    #[serde(default)]
    pub message_count: Option<usize>,
}

impl ChatSession {
    /// Title for display, falling back to a short id.
    pub fn display_title(&self) -> String {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => format!("Session {}", self.id.chars().take(8).collect::<String>()),
        }
    }

    /// Most recent activity time.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_title_falls_back_to_id() {
        let json = r#"{"id":"0192f0c4-aaaa-bbbb","title":"  ","created_at":"2026-01-01T00:00:00Z"}"#;
        let session: ChatSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.display_title(), "Session 0192f0c4");
        assert!(session.messages.is_empty());
        assert_eq!(session.last_activity(), session.created_at);
    }

    #[test]
    fn short_id_counts_characters_not_bytes() {
        let json = r#"{"id":"aññññ-1","created_at":"2026-01-01T00:00:00Z"}"#;
        let session: ChatSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.display_title(), "Session aññññ-1");

        let json = r#"{"id":"ñññññññññññ","created_at":"2026-01-01T00:00:00Z"}"#;
        let session: ChatSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.display_title(), "Session ññññññññ");
    }
}
