//! Chat session endpoints.

use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{ChatMessage, ChatSession, ContextPassage};

/// Response to sending a message.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantReply {
    /// The assistant's answer.
    #[serde(alias = "assistant_message")]
    pub message: ChatMessage,
    /// Passages returned alongside the message rather than inside it.
    #[serde(default)]
    pub sources: Vec<ContextPassage>,
}

impl AssistantReply {
    /// The answer with every cited passage attached to it.
    pub fn into_message(self) -> ChatMessage {
        let mut message = self.message;
        if message.sources.is_empty() {
            message.sources = self.sources;
        }
        message
    }
}

impl ApiClient {
    pub async fn list_sessions(&self) -> ApiResult<Vec<ChatSession>> {
        self.send(self.request(Method::GET, "/api/chat/sessions"))
            .await
    }

    pub async fn create_session(&self, title: Option<&str>) -> ApiResult<ChatSession> {
        let body = json!({ "title": title });
        self.send(self.request(Method::POST, "/api/chat/sessions").json(&body))
            .await
    }

    /// Fetch a session with its messages.
    pub async fn get_session(&self, session_id: &str) -> ApiResult<ChatSession> {
        let path = format!("/api/chat/sessions/{}", urlencoding::encode(session_id));
        self.send(self.request(Method::GET, &path)).await
    }

    pub async fn delete_session(&self, session_id: &str) -> ApiResult<()> {
        let path = format!("/api/chat/sessions/{}", urlencoding::encode(session_id));
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    /// Remove every message of a session, keeping the session itself.
    pub async fn clear_session(&self, session_id: &str) -> ApiResult<()> {
        let path = format!(
            "/api/chat/sessions/{}/messages",
            urlencoding::encode(session_id)
        );
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    /// Ask a question in a session. Pipeline events for it arrive on the socket.
    pub async fn send_message(&self, session_id: &str, content: &str) -> ApiResult<AssistantReply> {
        let path = format!(
            "/api/chat/sessions/{}/messages",
            urlencoding::encode(session_id)
        );
        let body = json!({ "content": content });
        self.send(self.request(Method::POST, &path).json(&body)).await
    }
}
