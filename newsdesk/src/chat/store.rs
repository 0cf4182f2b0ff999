//! In-memory state of the conversation being viewed.

use std::time::Duration;

use tokio::time::Instant;

use crate::models::{ChatMessage, ChatSession};
use crate::pipeline::{Narrator, PipelineEvent};

/// Messages of the active session plus the pipeline narrative.
#[derive(Debug)]
pub struct ConversationStore {
    session_id: Option<String>,
    title: Option<String>,
    messages: Vec<ChatMessage>,
    narrator: Narrator,
}

impl ConversationStore {
    pub const fn new(status_clear_delay: Duration) -> Self {
        Self {
            session_id: None,
            title: None,
            messages: Vec::new(),
            narrator: Narrator::new(status_clear_delay),
        }
    }

    /// Make `session` the active conversation.
    pub fn load(&mut self, session: ChatSession) {
        self.session_id = Some(session.id);
        self.title = session.title;
        self.messages.clear();
        for message in session.messages {
            self.push(message);
        }
    }

    /// Drop every message of the active session.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Start a new question: reset the narrative, then append the user's message.
    pub fn begin_question(&mut self, text: &str) -> &ChatMessage {
        self.narrator.begin_question();
        let index = self.push(ChatMessage::user(text));
        &self.messages[index]
    }

    /// Record the assistant's answer.
    pub fn complete_question(&mut self, reply: ChatMessage) -> &ChatMessage {
        let index = self.push(reply);
        &self.messages[index]
    }

    /// Forward a pipeline event. Returns the new status line, if any.
    pub fn apply_event(&mut self, event: PipelineEvent, now: Instant) -> Option<&str> {
        self.narrator.apply(event, now)
    }

    /// Fire due status clears. Returns whether the status list was cleared.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.narrator.tick(now)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub const fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    /// Insert keeping messages ordered by creation time. Equal timestamps
    /// keep arrival order.
    fn push(&mut self, message: ChatMessage) -> usize {
        let index = self
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        self.messages.insert(index, message);
        index
    }
}
