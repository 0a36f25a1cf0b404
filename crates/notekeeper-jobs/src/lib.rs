//! # notekeeper-jobs
//!
//! Asynchronous note enrichment for notekeeper.
//!
//! This crate provides:
//! - The [`NoteProcessor`] that classifies, summarizes, and embeds notes in
//!   response to lifecycle events
//! - A sharded [`EventWorker`] that runs events for the same note in order
//! - Lifecycle notifications via broadcast channels
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use notekeeper_jobs::{EventWorker, NoteEvent, NoteProcessor, WorkerConfig};
//!
//! let processor = NoteProcessor::from_database(&db, classifier, embedder, config.processor);
//! let worker = EventWorker::new(Arc::new(processor), WorkerConfig::from_env());
//! let (publisher, handle) = worker.start();
//!
//! // After the note insert commits:
//! publisher.publish(NoteEvent::created(note_id)).await?;
//!
//! // Graceful shutdown drains queued events.
//! handle.shutdown().await?;
//! ```

pub mod handler;
pub mod processor;
pub mod worker;

// Re-export core types
pub use notekeeper_core::*;

pub use handler::{EventContext, EventHandler, EventOutcome};
pub use processor::NoteProcessor;
pub use worker::{shard_for, EventPublisher, EventWorker, WorkerConfig, WorkerEvent, WorkerHandle};
