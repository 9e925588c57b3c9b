//! Progress events emitted while a question is processed.
//!
//! A transport (CLI spinner, SSE stream, log) implements [`ProgressSink`];
//! the pipeline and engine only ever call [`ProgressSink::emit`].

use serde::Serialize;
use std::sync::mpsc::Sender;

/// One traversal phase of the graph query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    EntityProperties,
    DirectRelations,
    FirstHop,
    SecondHop,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::EntityProperties => "entity properties",
            Phase::DirectRelations => "direct relations",
            Phase::FirstHop => "first hop",
            Phase::SecondHop => "second hop",
        }
    }
}

/// A status update for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    Started {
        question: String,
    },
    Extracted {
        entities: usize,
        relations: usize,
    },
    /// Running totals after a phase.
    PhaseCompleted {
        phase: Phase,
        entity_properties: usize,
        triples: usize,
    },
    Answer {
        text: String,
    },
    Failed {
        reason: String,
    },
    /// Always the last event of a spawned run.
    Finished,
}

impl PipelineEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineEvent::Finished)
    }
}

/// Receives progress events.
pub trait ProgressSink {
    fn emit(&self, event: PipelineEvent);
}

/// Discards every event.
impl ProgressSink for () {
    fn emit(&self, _event: PipelineEvent) {}
}

/// Forwards events to a channel; a dropped receiver is ignored.
impl ProgressSink for Sender<PipelineEvent> {
    fn emit(&self, event: PipelineEvent) {
        let _ = self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_channel_sink() {
        let (tx, rx) = mpsc::channel();
        tx.emit(PipelineEvent::Extracted {
            entities: 1,
            relations: 2,
        });
        tx.emit(PipelineEvent::Finished);

        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (tx, rx) = mpsc::channel::<PipelineEvent>();
        drop(rx);
        tx.emit(PipelineEvent::Finished);
        ().emit(PipelineEvent::Finished);
    }

    #[test]
    fn test_event_json() {
        let event = PipelineEvent::PhaseCompleted {
            phase: Phase::FirstHop,
            entity_properties: 1,
            triples: 4,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "phase_completed");
        assert_eq!(json["phase"], "first_hop");
        assert_eq!(json["triples"], 4);
    }
}
