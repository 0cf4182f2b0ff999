//! Chat message model with cited context passages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the assistant.
    Assistant,
}

impl MessageRole {
    /// Wire name of the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse a role name, accepting the aliases some backends emit.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" | "human" => Some(Self::User),
            "assistant" | "ai" | "bot" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl TryFrom<String> for MessageRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown message role: {value}"))
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A retrieved excerpt attached to an assistant answer as evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPassage {
    /// Title of the source document.
    #[serde(default)]
    pub title: String,
    /// Publisher or feed the document came from.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Relevance score reported by the retriever.
    #[serde(default, alias = "score")]
    pub relevance_score: f64,
    #[serde(default, alias = "content")]
    pub excerpt: String,
    #[serde(default)]
    pub matched_terms: Vec<String>,
}

/// A message in a chat session. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Server id, or a client-generated `UUIDv7` for locally composed messages.
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Passages the answer cites. Empty for user messages.
    #[serde(default, alias = "context")]
    pub sources: Vec<ContextPassage>,
}

impl ChatMessage {
    /// Compose a user message locally, stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc::now(),
            sources: Vec::new(),
        }
    }

    /// Whether any cited passages are attached.
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_accepts_aliases() {
        assert_eq!(MessageRole::parse("human"), Some(MessageRole::User));
        assert_eq!(MessageRole::parse("ai"), Some(MessageRole::Assistant));
        assert_eq!(MessageRole::parse("system"), None);
    }

    #[test]
    fn deserialize_assistant_with_sources() {
        let json = r#"{
            "id": "m-1",
            "role": "assistant",
            "content": "Rates held steady.",
            "created_at": "2026-03-01T10:00:00Z",
            "sources": [{
                "title": "Central bank holds",
                "source": "Reuters",
                "url": "https://example.com/a",
                "score": 0.82,
                "excerpt": "The bank left rates unchanged",
                "matched_terms": ["rates"]
            }]
        }"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role, MessageRole::Assistant);
        assert!(msg.has_sources());
        assert!((msg.sources[0].relevance_score - 0.82).abs() < f64::EPSILON);
        assert_eq!(msg.sources[0].matched_terms, vec!["rates"]);
    }

    #[test]
    fn deserialize_role_alias() {
        let json = r#"{"id":"m","role":"ai","content":"x","created_at":"2026-03-01T10:00:00Z"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(serde_json::to_value(msg.role).unwrap(), "assistant");

        let bad = r#"{"id":"m","role":"system","content":"x","created_at":"2026-03-01T10:00:00Z"}"#;
        assert!(serde_json::from_str::<ChatMessage>(bad).is_err());
    }

    #[test]
    fn user_message_has_fresh_id() {
        let a = ChatMessage::user("hello");
        let b = ChatMessage::user("hello");
        assert_ne!(a.id, b.id);
        assert_eq!(a.role, MessageRole::User);
        assert!(!a.has_sources());
    }
}
