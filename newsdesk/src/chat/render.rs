//! Plain-text rendering for the terminal.

use std::fmt::Write;

use crate::models::{ChatMessage, ChatSession, ContextPassage, MessageRole};

const EXCERPT_PREVIEW: usize = 160;

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// A message with its header line and, for answers, the cited sources.
pub fn render_message(message: &ChatMessage) -> String {
    let label = match message.role {
        MessageRole::User => "YOU",
        MessageRole::Assistant => "ASSISTANT",
    };
    let mut out = format!(
        "[{label}] {}\n{}\n",
        message.created_at.format("%Y-%m-%d %H:%M"),
        message.content.trim_end()
    );
    if message.has_sources() {
        out.push('\n');
        out.push_str(&render_sources(&message.sources));
    }
    out
}

/// Numbered list of cited passages.
pub fn render_sources(sources: &[ContextPassage]) -> String {
    let mut out = String::from("Sources:\n");
    for (i, passage) in sources.iter().enumerate() {
        let title = if passage.title.is_empty() {
            "(untitled)"
        } else {
            passage.title.as_str()
        };
        let _ = write!(out, "  {}. {title}", i + 1);
        if !passage.source.is_empty() {
            let _ = write!(out, " | {}", passage.source);
        }
        let _ = writeln!(out, " ({:.2})", passage.relevance_score);

        if let Some(ref url) = passage.url {
            let _ = writeln!(out, "     {url}");
        }
        let excerpt = passage.excerpt.trim();
        if !excerpt.is_empty() {
            let _ = writeln!(out, "     \"{}\"", truncate(excerpt, EXCERPT_PREVIEW));
        }
        if !passage.matched_terms.is_empty() {
            let _ = writeln!(out, "     matched: {}", passage.matched_terms.join(", "));
        }
    }
    out
}

/// One row of the session table.
pub fn render_session_row(session: &ChatSession) -> String {
    let count = session
        .message_count
        .unwrap_or(session.messages.len())
        .to_string();
    format!(
        "{:<38} {:<30} {:<8} {}",
        session.id,
        truncate(&session.display_title(), 28),
        count,
        session.last_activity().format("%Y-%m-%d %H:%M"),
    )
}
