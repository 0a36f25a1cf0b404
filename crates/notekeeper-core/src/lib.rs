//! # notekeeper-core
//!
//! Core types, traits, and abstractions for the notekeeper service.
//!
//! This crate provides the note/topic/user data model, the note lifecycle
//! events, the repository and model-client traits, configuration, and the
//! shared error type that the other notekeeper crates depend on.

pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::CoreConfig;
pub use error::{Error, Result};
pub use events::NoteEvent;
pub use models::*;
pub use traits::*;

/// Re-export pgvector's Vector type for embedding storage.
pub use pgvector::Vector;
