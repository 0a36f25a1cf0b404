//! Event handler contract for note event workers.

use std::time::Instant;

use async_trait::async_trait;
use uuid::Uuid;

use notekeeper_core::NoteEvent;

/// Context provided to event handlers.
#[derive(Debug, Clone)]
pub struct EventContext {
    /// The event being processed.
    pub event: NoteEvent,
    /// Worker shard the event was routed to.
    pub shard: usize,
    /// When the event was taken off the queue.
    pub started_at: Instant,
}

impl EventContext {
    pub fn new(event: NoteEvent, shard: usize) -> Self {
        Self {
            event,
            shard,
            started_at: Instant::now(),
        }
    }

    pub fn note_id(&self) -> Uuid {
        self.event.note_id()
    }

    /// Milliseconds since the event was taken off the queue.
    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// A targeted update was written. Carries the update pattern name.
    Updated(&'static str),
    /// Nothing to do (note gone, no topics, blank content, ...).
    Skipped(String),
    /// The event failed and was dropped. Nothing is retried.
    Failed(String),
}

impl EventOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Short human-readable description for logs and worker events.
    pub fn describe(&self) -> String {
        match self {
            Self::Updated(pattern) => format!("updated ({})", pattern),
            Self::Skipped(reason) => format!("skipped: {}", reason),
            Self::Failed(error) => format!("failed: {}", error),
        }
    }
}

/// Trait for note event handlers.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handler name used in logs.
    fn name(&self) -> &'static str;

    /// Process one event. Failures are reported through the outcome, never
    /// by panicking or returning an error.
    async fn handle(&self, ctx: EventContext) -> EventOutcome;
}
