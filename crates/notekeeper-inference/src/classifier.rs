//! Note classifier: topic selection, summary and content extraction.
//!
//! A note is shown to the chat model in one of two modalities:
//!
//! - **file**: IMAGE and DOCUMENT notes whose file is readable and under the
//!   per-type size cap are sent with the file bytes attached.
//! - **text**: everything else. Metadata plus, for TEXT notes, the content.
//!
//! Any error in file modality retries once in text modality. If text
//! modality fails too, the note lands in the fallback topic with an error
//! summary so the pipeline still moves forward.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use notekeeper_core::config::ClassifierConfig;
use notekeeper_core::{
    defaults, fallback_topic, ChatBackend, ChatOptions, ChatRequest, Classification, FileReader,
    MediaAttachment, Note, NoteClassifier, NoteType, Result, Topic,
};

use crate::media::mime_for_path;
use crate::parse::{parse_classification, resolve};
use crate::prompts::{self, Modality};

/// Chat-model-backed [`NoteClassifier`].
pub struct Classifier {
    chat: Arc<dyn ChatBackend>,
    files: Arc<dyn FileReader>,
    config: ClassifierConfig,
}

/// Prompt pieces shared by both modalities.
struct PromptParts {
    metadata: String,
    topics: String,
}

impl Classifier {
    pub fn new(
        chat: Arc<dyn ChatBackend>,
        files: Arc<dyn FileReader>,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            chat,
            files,
            config,
        }
    }

    fn classify_options() -> ChatOptions {
        ChatOptions {
            model: None,
            temperature: Some(defaults::CLASSIFY_TEMPERATURE),
            max_tokens: Some(defaults::CLASSIFY_MAX_TOKENS),
        }
    }

    fn size_cap(&self, note_type: NoteType) -> u64 {
        match note_type {
            NoteType::Image => self.config.max_image_bytes,
            _ => self.config.max_document_bytes,
        }
    }

    /// The note's file as an attachment, if it qualifies for file modality.
    ///
    /// `Ok(None)` means text modality: not a file note, no file on disk, or
    /// over the cap. `Err` is an I/O failure while checking or reading.
    async fn attachment(&self, note: &Note) -> Result<Option<MediaAttachment>> {
        let Some(path) = note.file_url.as_deref().filter(|_| note.note_type.is_file_backed())
        else {
            return Ok(None);
        };

        let Some(size) = self.files.file_size(path).await? else {
            warn!(
                subsystem = "inference",
                component = "classifier",
                note_id = %note.id,
                path,
                "File not found, falling back to text classification"
            );
            return Ok(None);
        };

        let cap = self.size_cap(note.note_type);
        if size > cap {
            warn!(
                subsystem = "inference",
                component = "classifier",
                note_id = %note.id,
                file_size = size,
                max_size = cap,
                "File too large, falling back to text classification"
            );
            return Ok(None);
        }

        let data = self.files.read(path).await?;
        Ok(Some(MediaAttachment {
            mime_type: mime_for_path(path).to_string(),
            data,
            file_name: note.file_name().map(str::to_string),
        }))
    }

    async fn classify_with_file(
        &self,
        note: &Note,
        modality: Modality,
        media: MediaAttachment,
        parts: &PromptParts,
        topics: &[Topic],
        fallback_id: Uuid,
    ) -> Result<Classification> {
        info!(
            subsystem = "inference",
            component = "classifier",
            note_id = %note.id,
            modality = modality.as_str(),
            file_size = media.data.len(),
            mime_type = %media.mime_type,
            "Classifying note with file analysis"
        );

        let request = ChatRequest::new(
            prompts::system_prompt(modality),
            prompts::file_user_prompt(note.note_type, &parts.metadata, &parts.topics),
        )
        .with_media(media)
        .with_options(Self::classify_options());

        let raw = self.chat.chat(&request).await?;
        let response = parse_classification(&raw)?;
        Ok(resolve(response, topics, note.note_type, fallback_id))
    }

    async fn classify_with_text(
        &self,
        note: &Note,
        parts: &PromptParts,
        topics: &[Topic],
        fallback_id: Uuid,
    ) -> Result<Classification> {
        let request = ChatRequest::new(
            prompts::system_prompt(Modality::Text),
            prompts::text_user_prompt(
                &parts.metadata,
                &prompts::content_block(note),
                &parts.topics,
            ),
        )
        .with_options(Self::classify_options());

        let raw = self.chat.chat(&request).await?;
        let response = parse_classification(&raw).unwrap_or_else(|e| {
            warn!(
                subsystem = "inference",
                component = "classifier",
                note_id = %note.id,
                error = %e,
                response_len = raw.len(),
                "Classifier output unparseable, using fallback topic"
            );
            Default::default()
        });
        // Only the file modality sees the file, so only it may extract content.
        let mut classification = resolve(response, topics, note.note_type, fallback_id);
        classification.content = None;
        Ok(classification)
    }
}

#[async_trait]
impl NoteClassifier for Classifier {
    async fn classify_note(
        &self,
        note: &Note,
        topics: &[Topic],
    ) -> Result<Option<Classification>> {
        let Some(fallback) = fallback_topic(topics) else {
            warn!(
                subsystem = "inference",
                component = "classifier",
                note_id = %note.id,
                "No topics available, skipping classification"
            );
            return Ok(None);
        };
        let fallback_id = fallback.id;
        let start = Instant::now();

        info!(
            subsystem = "inference",
            component = "classifier",
            op = "classify",
            note_id = %note.id,
            note_type = %note.note_type,
            topic_count = topics.len(),
            "Classifying note"
        );

        let parts = PromptParts {
            metadata: prompts::note_metadata(note),
            topics: prompts::topics_block(topics),
        };

        let file_attempt = match Modality::for_file(note.note_type) {
            Some(modality) => match self.attachment(note).await {
                Ok(Some(media)) => Some(
                    self.classify_with_file(note, modality, media, &parts, topics, fallback_id)
                        .await,
                ),
                Ok(None) => None,
                Err(e) => Some(Err(e)),
            },
            None => None,
        };

        let result = match file_attempt {
            Some(Ok(classification)) => Ok(classification),
            Some(Err(e)) => {
                warn!(
                    subsystem = "inference",
                    component = "classifier",
                    note_id = %note.id,
                    error = %e,
                    "File classification failed, falling back to text classification"
                );
                self.classify_with_text(note, &parts, topics, fallback_id)
                    .await
            }
            None => {
                self.classify_with_text(note, &parts, topics, fallback_id)
                    .await
            }
        };

        let classification = match result {
            Ok(classification) => classification,
            Err(e) => {
                error!(
                    subsystem = "inference",
                    component = "classifier",
                    note_id = %note.id,
                    error = %e,
                    "Classification failed, using fallback topic"
                );
                Classification {
                    topic_id: fallback_id,
                    ai_summary: format!("Error during classification: {}", e),
                    content: None,
                }
            }
        };

        debug!(
            subsystem = "inference",
            component = "classifier",
            note_id = %note.id,
            topic_id = %classification.topic_id,
            has_content = classification.content.is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Note classified"
        );
        Ok(Some(classification))
    }

    async fn summarize_note(&self, note: &Note, topics: &[Topic]) -> Result<Option<String>> {
        let request = ChatRequest::new(
            prompts::system_prompt(Modality::Text),
            prompts::text_user_prompt(
                &prompts::note_metadata(note),
                &prompts::content_block(note),
                &prompts::topics_block(topics),
            ),
        )
        .with_options(Self::classify_options());

        let raw = self.chat.chat(&request).await?;
        let summary = match parse_classification(&raw) {
            Ok(response) => response.ai_summary.filter(|s| !s.trim().is_empty()),
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "classifier",
                    note_id = %note.id,
                    error = %e,
                    response_len = raw.len(),
                    "Summary output unparseable"
                );
                None
            }
        };
        debug!(
            subsystem = "inference",
            component = "classifier",
            op = "summarize",
            note_id = %note.id,
            has_summary = summary.is_some(),
            "Note summarized"
        );
        Ok(summary)
    }

    async fn generate_answer(&self, query: &str, notes_context: &str) -> Result<String> {
        let request = ChatRequest::new(
            prompts::ANSWER_SYSTEM_PROMPT,
            prompts::answer_user_prompt(query, notes_context),
        )
        .with_options(ChatOptions {
            model: None,
            temperature: Some(defaults::ANSWER_TEMPERATURE),
            max_tokens: Some(defaults::ANSWER_MAX_TOKENS),
        });

        let answer = self.chat.chat(&request).await?;
        info!(
            subsystem = "inference",
            component = "classifier",
            op = "generate_answer",
            response_len = answer.len(),
            "Generated answer"
        );
        Ok(answer)
    }
}
