//! Note enrichment pipeline.
//!
//! `NoteCreated` runs classify, embed, persist. `NoteContentUpdated` re-embeds
//! the new content and, when configured, refreshes the summary. Each event
//! ends in at most one targeted update; errors are logged with the note id
//! and swallowed at the event boundary.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use notekeeper_core::config::ProcessorConfig;
use notekeeper_core::{
    NoteClassifier, NoteEvent, NoteRepository, NoteType, NoteUpdate, Result, TextEmbedder,
    TopicRepository,
};
use notekeeper_db::{Database, PgNoteRepository, PgTopicRepository};

use crate::handler::{EventContext, EventHandler, EventOutcome};

/// Applies classification and embedding results to notes.
pub struct NoteProcessor {
    notes: Arc<dyn NoteRepository>,
    topics: Arc<dyn TopicRepository>,
    classifier: Arc<dyn NoteClassifier>,
    embedder: Arc<dyn TextEmbedder>,
    config: ProcessorConfig,
}

impl NoteProcessor {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        topics: Arc<dyn TopicRepository>,
        classifier: Arc<dyn NoteClassifier>,
        embedder: Arc<dyn TextEmbedder>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            notes,
            topics,
            classifier,
            embedder,
            config,
        }
    }

    /// Processor backed by the PostgreSQL repositories.
    pub fn from_database(
        db: &Database,
        classifier: Arc<dyn NoteClassifier>,
        embedder: Arc<dyn TextEmbedder>,
        config: ProcessorConfig,
    ) -> Self {
        Self::new(
            Arc::new(PgNoteRepository::new(db.pool().clone())),
            Arc::new(PgTopicRepository::new(db.pool().clone())),
            classifier,
            embedder,
            config,
        )
    }

    /// Handle one event, catching and logging any error.
    pub async fn process(&self, event: &NoteEvent) -> EventOutcome {
        let note_id = event.note_id();
        let start = Instant::now();

        let result = match event {
            NoteEvent::NoteCreated { note_id } => self.handle_created(*note_id).await,
            NoteEvent::NoteContentUpdated {
                note_id,
                new_content,
            } => self.handle_content_updated(*note_id, new_content).await,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(outcome) => {
                info!(
                    subsystem = "jobs",
                    component = "processor",
                    note_id = %note_id,
                    event_kind = event.kind(),
                    outcome = %outcome.describe(),
                    duration_ms,
                    "Note event processed"
                );
                outcome
            }
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "processor",
                    note_id = %note_id,
                    event_kind = event.kind(),
                    error = %e,
                    duration_ms,
                    "Note event failed"
                );
                EventOutcome::Failed(e.to_string())
            }
        }
    }

    /// Classify, embed, and persist a newly created note.
    #[instrument(skip(self), fields(subsystem = "jobs", component = "processor", op = "note_created", note_id = %note_id))]
    pub async fn handle_created(&self, note_id: Uuid) -> Result<EventOutcome> {
        let Some(note) = self.notes.find_note_by_id(note_id).await? else {
            warn!("Note not found, skipping");
            return Ok(EventOutcome::Skipped("note not found".into()));
        };

        let topics = self.topics.find_topics_by_owner(note.owner_id).await?;
        if topics.is_empty() {
            warn!(user_id = %note.owner_id, "Owner has no topics, skipping classification");
            return Ok(EventOutcome::Skipped("owner has no topics".into()));
        }

        let Some(classification) = self.classifier.classify_note(&note, &topics).await? else {
            warn!("Classifier returned no result, skipping");
            return Ok(EventOutcome::Skipped("no classification".into()));
        };

        let extracted_content = match note.note_type {
            NoteType::Text => None,
            NoteType::Image | NoteType::Document => classification
                .content
                .clone()
                .filter(|c| !c.trim().is_empty()),
        };

        let content_to_embed = match note.note_type {
            NoteType::Text => note.non_blank_content(),
            NoteType::Image | NoteType::Document => extracted_content.as_deref(),
        };

        let embedding = match content_to_embed {
            Some(text) => self.embedder.embed(Some(text)).await,
            None => {
                debug!("No content to embed");
                None
            }
        };

        let update =
            NoteUpdate::for_classification(&classification, extracted_content, embedding);
        debug!(
            update_pattern = update.name(),
            topic_id = %classification.topic_id,
            "Persisting classification"
        );
        self.notes.apply_update(note_id, &update).await?;

        Ok(EventOutcome::Updated(update.name()))
    }

    /// Re-embed edited content. The topic is never re-selected.
    #[instrument(skip(self, new_content), fields(subsystem = "jobs", component = "processor", op = "note_content_updated", note_id = %note_id, content_len = new_content.len()))]
    pub async fn handle_content_updated(
        &self,
        note_id: Uuid,
        new_content: &str,
    ) -> Result<EventOutcome> {
        if new_content.trim().is_empty() {
            debug!("Blank content, nothing to embed");
            return Ok(EventOutcome::Skipped("blank content".into()));
        }

        let Some(note) = self.notes.find_note_by_id(note_id).await? else {
            warn!("Note not found, skipping");
            return Ok(EventOutcome::Skipped("note not found".into()));
        };

        let Some(embedding) = self.embedder.embed(Some(new_content)).await else {
            warn!("Embedding unavailable, leaving note unchanged");
            return Ok(EventOutcome::Skipped("embedding unavailable".into()));
        };

        let summary = if self.config.resummarize_on_edit && note.note_type == NoteType::Text {
            self.resummarize(note, new_content).await?
        } else {
            None
        };

        let update = match summary {
            Some(ai_summary) => NoteUpdate::EmbeddingAndSummary {
                embedding,
                ai_summary,
            },
            None => NoteUpdate::Embedding { embedding },
        };
        debug!(update_pattern = update.name(), "Persisting re-embedding");
        self.notes.apply_update(note_id, &update).await?;

        Ok(EventOutcome::Updated(update.name()))
    }

    /// Fresh summary for edited text. A failed model call keeps the
    /// previous summary.
    async fn resummarize(
        &self,
        mut note: notekeeper_core::Note,
        new_content: &str,
    ) -> Result<Option<String>> {
        let topics = self.topics.find_topics_by_owner(note.owner_id).await?;
        if topics.is_empty() {
            debug!("No topics, keeping the previous summary");
            return Ok(None);
        }
        note.content = Some(new_content.to_string());

        let summary = match self.classifier.summarize_note(&note, &topics).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Summary failed, keeping the previous one");
                return Ok(None);
            }
        };
        if summary.is_none() {
            debug!("No usable summary, keeping the previous one");
        }
        Ok(summary)
    }
}

#[async_trait]
impl EventHandler for NoteProcessor {
    fn name(&self) -> &'static str {
        "note_processor"
    }

    async fn handle(&self, ctx: EventContext) -> EventOutcome {
        let outcome = self.process(&ctx.event).await;
        debug!(
            subsystem = "jobs",
            component = "processor",
            note_id = %ctx.note_id(),
            shard = ctx.shard,
            outcome = %outcome.describe(),
            duration_ms = ctx.elapsed_ms(),
            "Event handled"
        );
        outcome
    }
}
