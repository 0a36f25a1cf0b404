//! Core traits for notekeeper abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::Vector;

// =============================================================================
// NOTE REPOSITORY TRAITS
// =============================================================================

/// A targeted write against one note row.
///
/// Each variant sets only the columns it names; nothing else on the row is
/// touched.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteUpdate {
    /// `{topic, ai_summary}`
    Classification { topic_id: Uuid, ai_summary: String },
    /// `{topic, ai_summary, content}`
    ClassificationWithContent {
        topic_id: Uuid,
        ai_summary: String,
        content: String,
    },
    /// `{topic, ai_summary, embedding}`
    ClassificationAndEmbedding {
        topic_id: Uuid,
        ai_summary: String,
        embedding: Vector,
    },
    /// `{topic, ai_summary, content, embedding}`
    All {
        topic_id: Uuid,
        ai_summary: String,
        content: String,
        embedding: Vector,
    },
    /// `{embedding, ai_summary}`
    EmbeddingAndSummary {
        embedding: Vector,
        ai_summary: String,
    },
    /// `{embedding}`
    Embedding { embedding: Vector },
}

impl NoteUpdate {
    /// Pick the update for a classified note given what else succeeded.
    pub fn for_classification(
        classification: &Classification,
        extracted_content: Option<String>,
        embedding: Option<Vector>,
    ) -> Self {
        let topic_id = classification.topic_id;
        let ai_summary = classification.ai_summary.clone();
        match (extracted_content, embedding) {
            (Some(content), Some(embedding)) => Self::All {
                topic_id,
                ai_summary,
                content,
                embedding,
            },
            (Some(content), None) => Self::ClassificationWithContent {
                topic_id,
                ai_summary,
                content,
            },
            (None, Some(embedding)) => Self::ClassificationAndEmbedding {
                topic_id,
                ai_summary,
                embedding,
            },
            (None, None) => Self::Classification {
                topic_id,
                ai_summary,
            },
        }
    }

    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Classification { .. } => "classification",
            Self::ClassificationWithContent { .. } => "classification_with_content",
            Self::ClassificationAndEmbedding { .. } => "classification_and_embedding",
            Self::All { .. } => "all",
            Self::EmbeddingAndSummary { .. } => "embedding_and_summary",
            Self::Embedding { .. } => "embedding",
        }
    }
}

/// Repository for note rows.
///
/// Reads return the projection without the embedding column; writes are
/// targeted multi-column updates.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Fetch the current row, or `None` if it does not exist.
    async fn find_note_by_id(&self, id: Uuid) -> Result<Option<Note>>;

    async fn update_classification(
        &self,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
    ) -> Result<()>;

    async fn update_classification_with_content(
        &self,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        content: &str,
    ) -> Result<()>;

    async fn update_classification_and_embedding(
        &self,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        embedding: &Vector,
    ) -> Result<()>;

    async fn update_all(
        &self,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        content: &str,
        embedding: &Vector,
    ) -> Result<()>;

    async fn update_embedding_and_summary(
        &self,
        note_id: Uuid,
        embedding: &Vector,
        ai_summary: &str,
    ) -> Result<()>;

    /// Overwrite only the embedding column.
    async fn update_embedding(&self, note_id: Uuid, embedding: &Vector) -> Result<()>;

    /// Dispatch a [`NoteUpdate`] to the matching targeted write.
    async fn apply_update(&self, note_id: Uuid, update: &NoteUpdate) -> Result<()> {
        match update {
            NoteUpdate::Classification {
                topic_id,
                ai_summary,
            } => {
                self.update_classification(note_id, *topic_id, ai_summary)
                    .await
            }
            NoteUpdate::ClassificationWithContent {
                topic_id,
                ai_summary,
                content,
            } => {
                self.update_classification_with_content(note_id, *topic_id, ai_summary, content)
                    .await
            }
            NoteUpdate::ClassificationAndEmbedding {
                topic_id,
                ai_summary,
                embedding,
            } => {
                self.update_classification_and_embedding(note_id, *topic_id, ai_summary, embedding)
                    .await
            }
            NoteUpdate::All {
                topic_id,
                ai_summary,
                content,
                embedding,
            } => {
                self.update_all(note_id, *topic_id, ai_summary, content, embedding)
                    .await
            }
            NoteUpdate::EmbeddingAndSummary {
                embedding,
                ai_summary,
            } => {
                self.update_embedding_and_summary(note_id, embedding, ai_summary)
                    .await
            }
            NoteUpdate::Embedding { embedding } => self.update_embedding(note_id, embedding).await,
        }
    }
}

/// Repository for topics.
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// All topics owned by a user.
    async fn find_topics_by_owner(&self, owner_id: Uuid) -> Result<Vec<Topic>>;
}

// =============================================================================
// VECTOR INDEX TRAITS
// =============================================================================

/// Nearest-neighbour search over note embeddings.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Overwrite the embedding for a note.
    async fn upsert_embedding(&self, note_id: Uuid, embedding: &Vector) -> Result<()>;

    /// Up to `k` notes owned by `owner_id` whose cosine distance to `query`
    /// is at most `max_distance`, ascending by distance then note id.
    /// Notes without an embedding are never returned.
    async fn find_similar_notes(
        &self,
        owner_id: Uuid,
        topic_id: Option<Uuid>,
        query: &Vector,
        k: i64,
        max_distance: f64,
    ) -> Result<Vec<SimilarNote>>;
}

// =============================================================================
// FILE ACCESS
// =============================================================================

/// Read-only access to uploaded note files, keyed by path relative to the
/// upload root.
#[async_trait]
pub trait FileReader: Send + Sync {
    /// Size in bytes, or `None` when no readable file exists at the path.
    async fn file_size(&self, relative_path: &str) -> Result<Option<u64>>;

    /// Full file contents.
    async fn read(&self, relative_path: &str) -> Result<Vec<u8>>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns a vector of embedding vectors, one per input text.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Binary attachment sent inline with a chat prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
    pub file_name: Option<String>,
}

impl MediaAttachment {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Generation options for one chat call. `None` uses the backend default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// A single-turn chat request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub media: Option<MediaAttachment>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            ..Default::default()
        }
    }

    pub fn with_media(mut self, media: MediaAttachment) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

/// Backend for chat completion with optional inline media.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one chat completion and return the raw response text.
    async fn chat(&self, request: &ChatRequest) -> Result<String>;

    /// Get the default model name.
    fn model_name(&self) -> &str;
}

/// Combined inference backend supporting both embedding and chat.
#[async_trait]
pub trait InferenceBackend: EmbeddingBackend + ChatBackend {
    /// Check if the backend is available and responding.
    async fn health_check(&self) -> Result<bool>;
}

// =============================================================================
// PIPELINE TRAITS
// =============================================================================

/// Turns text into a fixed-length embedding, degrading to `None`.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// `None` for blank input or any model-side failure.
    async fn embed(&self, text: Option<&str>) -> Option<Vector>;
}

/// Classifies notes into topics and synthesizes answers from context.
#[async_trait]
pub trait NoteClassifier: Send + Sync {
    /// Classify a note against its owner's topics.
    ///
    /// Returns `Ok(None)` when `topics` is empty. The returned topic id is
    /// always one of `topics`.
    async fn classify_note(&self, note: &Note, topics: &[Topic])
        -> Result<Option<Classification>>;

    /// Fresh summary for a note whose text changed.
    ///
    /// Unlike [`NoteClassifier::classify_note`] this never synthesizes a
    /// fallback: a model failure is `Err` and unusable output is `Ok(None)`.
    async fn summarize_note(&self, note: &Note, topics: &[Topic]) -> Result<Option<String>>;

    /// Answer `query` from a prepared notes context block.
    async fn generate_answer(&self, query: &str, notes_context: &str) -> Result<String>;
}
