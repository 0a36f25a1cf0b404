//! Note lifecycle events consumed by the note processor.
//!
//! Producers publish these only after the transaction that wrote the note
//! row has committed, so a handler always finds the row it refers to.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post-commit note event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NoteEvent {
    /// A note row was inserted.
    NoteCreated { note_id: Uuid },
    /// The text content of a note was edited.
    NoteContentUpdated { note_id: Uuid, new_content: String },
}

impl NoteEvent {
    pub fn created(note_id: Uuid) -> Self {
        Self::NoteCreated { note_id }
    }

    pub fn content_updated(note_id: Uuid, new_content: impl Into<String>) -> Self {
        Self::NoteContentUpdated {
            note_id,
            new_content: new_content.into(),
        }
    }

    /// Note the event refers to. Events are sharded on this id.
    pub fn note_id(&self) -> Uuid {
        match self {
            Self::NoteCreated { note_id } | Self::NoteContentUpdated { note_id, .. } => *note_id,
        }
    }

    /// Short kind name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoteCreated { .. } => "created",
            Self::NoteContentUpdated { .. } => "content_updated",
        }
    }
}
