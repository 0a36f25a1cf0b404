//! Sharded worker pool for note events.
//!
//! Events are routed to one of `shards` bounded queues by note id, so events
//! for the same note are processed one at a time and in publish order.
//! Different notes proceed in parallel with no ordering between them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use notekeeper_core::{defaults, Error, NoteEvent, Result};

use crate::handler::{EventContext, EventHandler, EventOutcome};

/// Configuration for the event worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Whether to process events at all.
    pub enabled: bool,
    /// Number of shards (parallel workers).
    pub shards: usize,
    /// Bounded queue depth per shard.
    pub queue_capacity: usize,
    /// Upper bound on handling one event.
    pub event_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            shards: defaults::JOB_MAX_CONCURRENT,
            queue_capacity: defaults::JOB_QUEUE_CAPACITY,
            event_timeout: Duration::from_secs(defaults::JOB_TIMEOUT_SECS),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `JOB_WORKER_ENABLED` | `true` | Enable/disable event processing |
    /// | `JOB_MAX_CONCURRENT` | `4` | Number of worker shards |
    /// | `JOB_QUEUE_CAPACITY` | `256` | Queue depth per shard |
    pub fn from_env() -> Self {
        let enabled = std::env::var("JOB_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let shards = std::env::var("JOB_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::JOB_MAX_CONCURRENT)
            .max(1);

        let queue_capacity = std::env::var("JOB_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::JOB_QUEUE_CAPACITY)
            .max(1);

        Self {
            enabled,
            shards,
            queue_capacity,
            ..Self::default()
        }
    }

    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards.max(1);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = timeout;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// A shard picked up a note event.
    EventStarted {
        note_id: Uuid,
        kind: &'static str,
        shard: usize,
    },
    /// The handler finished (including skips).
    EventCompleted {
        note_id: Uuid,
        kind: &'static str,
        outcome: EventOutcome,
        duration_ms: u64,
    },
    /// The handler failed, timed out, or panicked.
    EventFailed {
        note_id: Uuid,
        kind: &'static str,
        error: String,
    },
    WorkerStarted,
    WorkerStopped,
}

/// Shard index for a note.
pub fn shard_for(note_id: Uuid, shards: usize) -> usize {
    (note_id.as_u128() % shards.max(1) as u128) as usize
}

/// Enqueues note events onto the worker's shards.
///
/// Producers call [`EventPublisher::publish`] only after the transaction that
/// wrote the note has committed.
#[derive(Clone)]
pub struct EventPublisher {
    shards: Arc<Vec<mpsc::Sender<NoteEvent>>>,
}

impl EventPublisher {
    /// Enqueue an event, waiting for queue space.
    pub async fn publish(&self, event: NoteEvent) -> Result<()> {
        if self.shards.is_empty() {
            debug!(
                subsystem = "jobs",
                component = "publisher",
                note_id = %event.note_id(),
                "Worker disabled, dropping event"
            );
            return Ok(());
        }

        let shard = shard_for(event.note_id(), self.shards.len());
        self.shards[shard]
            .send(event)
            .await
            .map_err(|_| Error::Job("Event worker is not running".into()))
    }

    /// Number of shards events are spread over (0 when disabled).
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    supervisor: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Stop accepting events, drain what is queued, and wait for the shards
    /// to exit.
    pub async fn shutdown(mut self) -> Result<()> {
        // Shards may already be gone; the signal is still recorded.
        self.shutdown_tx.send_replace(true);

        if let Some(supervisor) = self.supervisor.take() {
            supervisor
                .await
                .map_err(|e| Error::Internal(format!("Worker supervisor panicked: {}", e)))?;
        }
        Ok(())
    }
}

/// Worker pool that feeds note events to an [`EventHandler`].
pub struct EventWorker {
    config: WorkerConfig,
    handler: Arc<dyn EventHandler>,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl EventWorker {
    pub fn new(handler: Arc<dyn EventHandler>, config: WorkerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            config,
            handler,
            event_tx,
        }
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Spawn the shards. Returns the publisher producers use and a handle
    /// to shut the shards down.
    pub fn start(self) -> (EventPublisher, WorkerHandle) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        if !self.config.enabled {
            info!(
                subsystem = "jobs",
                component = "worker",
                "Event worker is disabled, not starting"
            );
            let publisher = EventPublisher {
                shards: Arc::new(Vec::new()),
            };
            let handle = WorkerHandle {
                shutdown_tx,
                supervisor: None,
            };
            return (publisher, handle);
        }

        let mut senders = Vec::with_capacity(self.config.shards);
        let mut shards = JoinSet::new();
        for shard in 0..self.config.shards {
            let (tx, rx) = mpsc::channel(self.config.queue_capacity);
            senders.push(tx);
            let runner = ShardRunner {
                shard,
                handler: self.handler.clone(),
                event_tx: self.event_tx.clone(),
                event_timeout: self.config.event_timeout,
            };
            shards.spawn(runner.run(rx, shutdown_rx.clone()));
        }

        info!(
            subsystem = "jobs",
            component = "worker",
            handler = self.handler.name(),
            shards = self.config.shards,
            queue_capacity = self.config.queue_capacity,
            "Event worker started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let event_tx = self.event_tx.clone();
        let supervisor = tokio::spawn(async move {
            while let Some(result) = shards.join_next().await {
                if let Err(e) = result {
                    error!(subsystem = "jobs", component = "worker", error = ?e, "Shard task panicked");
                }
            }
            let _ = event_tx.send(WorkerEvent::WorkerStopped);
            info!(subsystem = "jobs", component = "worker", "Event worker stopped");
        });

        let publisher = EventPublisher {
            shards: Arc::new(senders),
        };
        let handle = WorkerHandle {
            shutdown_tx,
            supervisor: Some(supervisor),
        };
        (publisher, handle)
    }
}

/// One shard's processing loop.
struct ShardRunner {
    shard: usize,
    handler: Arc<dyn EventHandler>,
    event_tx: broadcast::Sender<WorkerEvent>,
    event_timeout: Duration,
}

impl ShardRunner {
    async fn run(self, mut rx: mpsc::Receiver<NoteEvent>, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                biased;
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                next = rx.recv() => match next {
                    Some(event) => self.execute(event).await,
                    None => return,
                },
            }
        }

        // Refuse new events, then finish what was already accepted.
        rx.close();
        let mut drained = 0usize;
        while let Some(event) = rx.recv().await {
            self.execute(event).await;
            drained += 1;
        }
        debug!(
            subsystem = "jobs",
            component = "worker",
            shard = self.shard,
            drained,
            "Shard stopped"
        );
    }

    async fn execute(&self, event: NoteEvent) {
        let note_id = event.note_id();
        let kind = event.kind();

        let _ = self.event_tx.send(WorkerEvent::EventStarted {
            note_id,
            kind,
            shard: self.shard,
        });

        let handler = self.handler.clone();
        let ctx = EventContext::new(event, self.shard);
        let started_at = ctx.started_at;
        let timeout = self.event_timeout;
        let task = tokio::spawn(async move { tokio::time::timeout(timeout, handler.handle(ctx)).await });

        let outcome = match task.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                warn!(
                    subsystem = "jobs",
                    component = "worker",
                    note_id = %note_id,
                    event_kind = kind,
                    timeout_secs = timeout.as_secs(),
                    "Event exceeded timeout"
                );
                EventOutcome::Failed(format!("Event exceeded timeout of {}s", timeout.as_secs()))
            }
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "worker",
                    note_id = %note_id,
                    event_kind = kind,
                    error = ?e,
                    "Event handler panicked"
                );
                EventOutcome::Failed(format!("Event handler panicked: {}", e))
            }
        };

        let duration_ms = started_at.elapsed().as_millis() as u64;
        let worker_event = match outcome {
            EventOutcome::Failed(error) => WorkerEvent::EventFailed {
                note_id,
                kind,
                error,
            },
            outcome => WorkerEvent::EventCompleted {
                note_id,
                kind,
                outcome,
                duration_ms,
            },
        };
        let _ = self.event_tx.send(worker_event);
    }
}
