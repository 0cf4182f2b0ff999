//! Status narrative for one question/answer cycle.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use super::events::{PipelineEvent, PipelineEventKind};

/// A recognised event as it was received, kept for the current cycle.
#[derive(Debug, Clone)]
pub struct LoggedEvent {
    pub kind: PipelineEventKind,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

/// Turns pipeline events into an ordered list of status lines.
///
/// No two adjacent lines are identical. `ai_done` schedules the whole list
/// to be cleared after `clear_delay`; scheduled clears are never cancelled,
/// not even by a new question.
#[derive(Debug)]
pub struct Narrator {
    statuses: Vec<String>,
    streaming: bool,
    events: Vec<LoggedEvent>,
    clear_delay: Duration,
    /// Deadlines of scheduled clears, in scheduling order.
    pending_clears: Vec<Instant>,
}

impl Narrator {
    pub const fn new(clear_delay: Duration) -> Self {
        Self {
            statuses: Vec::new(),
            streaming: false,
            events: Vec::new(),
            clear_delay,
            pending_clears: Vec::new(),
        }
    }

    /// Reset the narrative and the event log for a new question.
    pub fn begin_question(&mut self) {
        self.statuses.clear();
        self.events.clear();
    }

    /// Handle one event received at `now`.
    ///
    /// Returns the status line if one was appended.
    pub fn apply(&mut self, event: PipelineEvent, now: Instant) -> Option<&str> {
        debug!(event = %event.kind, "pipeline event");

        let line = event.status_line();
        match event.kind {
            PipelineEventKind::AiStart => self.streaming = true,
            PipelineEventKind::AiDone => {
                self.streaming = false;
                self.pending_clears.push(now + self.clear_delay);
            }
            _ => {}
        }

        self.events.push(LoggedEvent {
            kind: event.kind,
            payload: event.payload,
            received_at: Utc::now(),
        });

        if self.push_status(line) {
            self.statuses.last().map(String::as_str)
        } else {
            None
        }
    }

    /// Fire every scheduled clear whose deadline is at or before `now`.
    ///
    /// Returns whether the status list was cleared.
    pub fn tick(&mut self, now: Instant) -> bool {
        let before = self.pending_clears.len();
        self.pending_clears.retain(|deadline| *deadline > now);
        if self.pending_clears.len() == before {
            return false;
        }
        debug!(lines = self.statuses.len(), "clearing pipeline status");
        self.statuses.clear();
        true
    }

    /// Earliest pending clear deadline.
    pub fn next_clear(&self) -> Option<Instant> {
        self.pending_clears.iter().min().copied()
    }

    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    pub const fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn events(&self) -> &[LoggedEvent] {
        &self.events
    }

    fn push_status(&mut self, line: String) -> bool {
        if self.statuses.last() == Some(&line) {
            return false;
        }
        self.statuses.push(line);
        true
    }
}

impl Default for Narrator {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: PipelineEventKind) -> PipelineEvent {
        PipelineEvent::new(kind, Value::Null)
    }

    fn results(count: u64) -> PipelineEvent {
        PipelineEvent::new(PipelineEventKind::SearchResults, json!({ "count": count }))
    }

    fn full_cycle() -> Vec<PipelineEvent> {
        vec![
            event(PipelineEventKind::EmbeddingStart),
            event(PipelineEventKind::EmbeddingDone),
            event(PipelineEventKind::SearchStart),
            results(5),
            PipelineEvent::new(PipelineEventKind::RagContext, json!({"count": 3})),
            event(PipelineEventKind::AiStart),
            event(PipelineEventKind::AiDone),
        ]
    }

    #[test]
    fn narrates_a_full_cycle_in_order() {
        let mut narrator = Narrator::default();
        let now = Instant::now();
        for e in full_cycle() {
            narrator.apply(e, now);
        }
        assert_eq!(
            narrator.statuses(),
            [
                "Embedding your question...",
                "Question embedded",
                "Searching the knowledge base...",
                "Found 5 candidate passages",
                "Using 3 context passages",
                "Generating answer...",
                "Answer ready",
            ]
        );
        assert_eq!(narrator.events().len(), 7);
    }

    #[test]
    fn suppresses_adjacent_duplicates_only() {
        let mut narrator = Narrator::default();
        let now = Instant::now();

        assert!(narrator.apply(event(PipelineEventKind::SearchStart), now).is_some());
        assert!(narrator.apply(event(PipelineEventKind::SearchStart), now).is_none());
        narrator.apply(results(2), now);
        narrator.apply(event(PipelineEventKind::SearchStart), now);

        assert_eq!(
            narrator.statuses(),
            [
                "Searching the knowledge base...",
                "Found 2 candidate passages",
                "Searching the knowledge base...",
            ]
        );
        // Suppressed lines are still logged.
        assert_eq!(narrator.events().len(), 4);
    }

    #[test]
    fn no_adjacent_duplicates_for_any_sequence() {
        // Walk a deterministic pseudo-random sequence over the vocabulary.
        let mut narrator = Narrator::default();
        let now = Instant::now();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let kind = PipelineEventKind::ALL[(seed % 7) as usize];
            let payload = json!({ "count": (seed >> 8) % 3 });
            narrator.apply(PipelineEvent::new(kind, payload), now);
        }
        assert!(narrator.statuses().windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn streaming_follows_ai_start_and_done() {
        let mut narrator = Narrator::default();
        let now = Instant::now();
        assert!(!narrator.is_streaming());

        narrator.apply(event(PipelineEventKind::AiStart), now);
        assert!(narrator.is_streaming());

        narrator.apply(event(PipelineEventKind::AiDone), now);
        assert!(!narrator.is_streaming());
    }

    #[test]
    fn clears_three_seconds_after_ai_done() {
        let mut narrator = Narrator::default();
        let start = Instant::now();
        for e in full_cycle() {
            narrator.apply(e, start);
        }

        assert_eq!(narrator.next_clear(), Some(start + Duration::from_secs(3)));
        assert!(!narrator.tick(start + Duration::from_millis(2999)));
        assert!(!narrator.statuses().is_empty());

        assert!(narrator.tick(start + Duration::from_secs(3)));
        assert!(narrator.statuses().is_empty());
        assert!(narrator.next_clear().is_none());
    }

    #[test]
    fn new_question_resets_before_first_event() {
        let mut narrator = Narrator::default();
        let now = Instant::now();
        for e in full_cycle() {
            narrator.apply(e, now);
        }

        narrator.begin_question();
        assert!(narrator.statuses().is_empty());
        assert!(narrator.events().is_empty());

        narrator.apply(event(PipelineEventKind::EmbeddingStart), now);
        assert_eq!(narrator.statuses(), ["Embedding your question..."]);
    }

    #[test]
    fn pending_clear_survives_a_new_question() {
        let mut narrator = Narrator::default();
        let start = Instant::now();
        narrator.apply(event(PipelineEventKind::AiDone), start);

        narrator.begin_question();
        narrator.apply(event(PipelineEventKind::EmbeddingStart), start + Duration::from_secs(1));

        assert!(narrator.tick(start + Duration::from_secs(3)));
        assert!(narrator.statuses().is_empty());
    }

    #[test]
    fn each_ai_done_schedules_its_own_clear() {
        let mut narrator = Narrator::new(Duration::from_secs(3));
        let start = Instant::now();
        narrator.apply(event(PipelineEventKind::AiDone), start);
        narrator.apply(event(PipelineEventKind::SearchStart), start);
        narrator.apply(event(PipelineEventKind::AiDone), start + Duration::from_secs(2));

        assert!(narrator.tick(start + Duration::from_secs(3)));
        assert_eq!(narrator.next_clear(), Some(start + Duration::from_secs(5)));

        narrator.apply(event(PipelineEventKind::SearchStart), start + Duration::from_secs(4));
        assert!(narrator.tick(start + Duration::from_secs(5)));
        assert!(narrator.statuses().is_empty());
    }
}
