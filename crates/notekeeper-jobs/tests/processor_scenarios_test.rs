//! End-to-end note processing scenarios against in-memory repositories and
//! the mock model backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use notekeeper_core::config::ProcessorConfig;
use notekeeper_core::{
    Classification, CoreConfig, Error, Note, NoteClassifier, NoteEvent, NoteRepository, NoteType,
    Result, Topic, TopicRepository, Vector,
};
use notekeeper_inference::mock::{MockFileReader, MockInferenceBackend, MockReply};
use notekeeper_inference::{Classifier, Embedder};
use notekeeper_jobs::{EventOutcome, NoteProcessor};

// =============================================================================
// IN-MEMORY REPOSITORIES
// =============================================================================

#[derive(Default)]
struct MemoryNotes {
    notes: Mutex<HashMap<Uuid, Note>>,
    embeddings: Mutex<HashMap<Uuid, Vector>>,
    writes: Mutex<Vec<(Uuid, &'static str)>>,
}

impl MemoryNotes {
    fn insert(&self, note: Note) {
        self.notes.lock().unwrap().insert(note.id, note);
    }

    fn get(&self, id: Uuid) -> Note {
        self.notes.lock().unwrap()[&id].clone()
    }

    fn embedding(&self, id: Uuid) -> Option<Vector> {
        self.embeddings.lock().unwrap().get(&id).cloned()
    }

    fn writes(&self) -> Vec<(Uuid, &'static str)> {
        self.writes.lock().unwrap().clone()
    }

    fn write(
        &self,
        id: Uuid,
        pattern: &'static str,
        topic_id: Option<Uuid>,
        ai_summary: Option<&str>,
        content: Option<&str>,
        embedding: Option<&Vector>,
    ) -> Result<()> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", id)))?;
        if let Some(topic_id) = topic_id {
            note.topic_id = topic_id;
        }
        if let Some(summary) = ai_summary {
            note.ai_summary = Some(summary.to_string());
        }
        if let Some(content) = content {
            note.content = Some(content.to_string());
        }
        if let Some(embedding) = embedding {
            self.embeddings.lock().unwrap().insert(id, embedding.clone());
        }
        self.writes.lock().unwrap().push((id, pattern));
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for MemoryNotes {
    async fn find_note_by_id(&self, id: Uuid) -> Result<Option<Note>> {
        Ok(self.notes.lock().unwrap().get(&id).cloned())
    }

    async fn update_classification(&self, note_id: Uuid, topic_id: Uuid, ai_summary: &str) -> Result<()> {
        self.write(note_id, "classification", Some(topic_id), Some(ai_summary), None, None)
    }

    async fn update_classification_with_content(
        &self,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        content: &str,
    ) -> Result<()> {
        self.write(
            note_id,
            "classification_with_content",
            Some(topic_id),
            Some(ai_summary),
            Some(content),
            None,
        )
    }

    async fn update_classification_and_embedding(
        &self,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        embedding: &Vector,
    ) -> Result<()> {
        self.write(
            note_id,
            "classification_and_embedding",
            Some(topic_id),
            Some(ai_summary),
            None,
            Some(embedding),
        )
    }

    async fn update_all(
        &self,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        content: &str,
        embedding: &Vector,
    ) -> Result<()> {
        self.write(
            note_id,
            "all",
            Some(topic_id),
            Some(ai_summary),
            Some(content),
            Some(embedding),
        )
    }

    async fn update_embedding_and_summary(
        &self,
        note_id: Uuid,
        embedding: &Vector,
        ai_summary: &str,
    ) -> Result<()> {
        self.write(
            note_id,
            "embedding_and_summary",
            None,
            Some(ai_summary),
            None,
            Some(embedding),
        )
    }

    async fn update_embedding(&self, note_id: Uuid, embedding: &Vector) -> Result<()> {
        self.write(note_id, "embedding", None, None, None, Some(embedding))
    }
}

#[derive(Default)]
struct MemoryTopics {
    topics: Vec<Topic>,
}

#[async_trait]
impl TopicRepository for MemoryTopics {
    async fn find_topics_by_owner(&self, owner_id: Uuid) -> Result<Vec<Topic>> {
        Ok(self
            .topics
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

/// Classifier whose model call always fails.
struct FailingClassifier;

#[async_trait]
impl NoteClassifier for FailingClassifier {
    async fn classify_note(&self, _note: &Note, _topics: &[Topic]) -> Result<Option<Classification>> {
        Err(Error::Inference("model unavailable".into()))
    }

    async fn summarize_note(&self, _note: &Note, _topics: &[Topic]) -> Result<Option<String>> {
        Err(Error::Inference("model unavailable".into()))
    }

    async fn generate_answer(&self, _query: &str, _notes_context: &str) -> Result<String> {
        Err(Error::Inference("model unavailable".into()))
    }
}

// =============================================================================
// FIXTURE
// =============================================================================

struct Fixture {
    owner: Uuid,
    t_default: Uuid,
    t_shopping: Uuid,
    notes: Arc<MemoryNotes>,
    topics: Arc<MemoryTopics>,
    backend: MockInferenceBackend,
}

impl Fixture {
    fn new() -> Self {
        let owner = Uuid::new_v4();
        let t_default = Uuid::new_v4();
        let t_shopping = Uuid::new_v4();
        let topic = |id: Uuid, name: &str, is_default: bool| Topic {
            id,
            owner_id: owner,
            name: name.to_string(),
            description: None,
            ai_summary: None,
            is_default,
        };
        Self {
            owner,
            t_default,
            t_shopping,
            notes: Arc::new(MemoryNotes::default()),
            topics: Arc::new(MemoryTopics {
                topics: vec![
                    topic(t_default, "General", true),
                    topic(t_shopping, "Shopping", false),
                ],
            }),
            backend: MockInferenceBackend::new(),
        }
    }

    fn note(&self, note_type: NoteType, title: &str, content: Option<&str>, file_url: Option<&str>) -> Uuid {
        let note = Note {
            id: Uuid::new_v4(),
            owner_id: self.owner,
            topic_id: self.t_default,
            title: title.to_string(),
            description: None,
            ai_summary: None,
            note_type,
            content: content.map(String::from),
            file_url: file_url.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let id = note.id;
        self.notes.insert(note);
        id
    }

    fn reply(&self, topic_id: Uuid, summary: &str, content: Option<&str>) {
        let body = serde_json::json!({
            "topicId": topic_id.to_string(),
            "aiSummary": summary,
            "content": content,
        });
        self.backend.push_reply(MockReply::Text(body.to_string()));
    }

    fn processor(&self, files: MockFileReader, config: ProcessorConfig) -> NoteProcessor {
        let classifier = Classifier::new(
            Arc::new(self.backend.clone()),
            Arc::new(files),
            CoreConfig::default().classifier,
        );
        self.processor_with(Arc::new(classifier), config)
    }

    fn processor_with(&self, classifier: Arc<dyn NoteClassifier>, config: ProcessorConfig) -> NoteProcessor {
        NoteProcessor::new(
            self.notes.clone(),
            self.topics.clone(),
            classifier,
            Arc::new(Embedder::new(Arc::new(self.backend.clone()))),
            config,
        )
    }
}

fn resummarize() -> ProcessorConfig {
    ProcessorConfig {
        resummarize_on_edit: true,
    }
}

// =============================================================================
// NOTE CREATED
// =============================================================================

#[tokio::test]
async fn test_text_note_classified_and_embedded() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Text, "Grocery list", Some("buy milk eggs bread"), None);
    fx.reply(fx.t_shopping, "A short shopping list.", None);

    let outcome = fx
        .processor(MockFileReader::new(), ProcessorConfig::default())
        .process(&NoteEvent::created(id))
        .await;

    assert_eq!(outcome, EventOutcome::Updated("classification_and_embedding"));
    let note = fx.notes.get(id);
    assert_eq!(note.topic_id, fx.t_shopping);
    assert_eq!(note.ai_summary.as_deref(), Some("A short shopping list."));
    assert_eq!(note.content.as_deref(), Some("buy milk eggs bread"));

    let embedding = fx.notes.embedding(id).expect("embedding written");
    assert_eq!(embedding.as_slice().len(), 1536);
    assert_eq!(fx.backend.get_calls().iter().find(|c| c.operation == "embed").unwrap().input, "buy milk eggs bread");
}

#[tokio::test]
async fn test_image_note_with_file_writes_content_and_embedding() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Image, "Chart", None, Some("u1/abc.png"));
    fx.reply(
        fx.t_default,
        "Bar chart of monthly sales.",
        Some("A bar chart showing sales rising from Jan to Jun."),
    );
    let files = MockFileReader::new().with_file("u1/abc.png", vec![0u8; 300 * 1024]);

    let outcome = fx
        .processor(files, ProcessorConfig::default())
        .process(&NoteEvent::created(id))
        .await;

    assert_eq!(outcome, EventOutcome::Updated("all"));
    let note = fx.notes.get(id);
    assert_eq!(note.topic_id, fx.t_default);
    assert_eq!(note.ai_summary.as_deref(), Some("Bar chart of monthly sales."));
    assert_eq!(
        note.content.as_deref(),
        Some("A bar chart showing sales rising from Jan to Jun.")
    );
    assert!(fx.notes.embedding(id).is_some());

    let chat = fx.backend.chat_calls();
    assert_eq!(chat.len(), 1);
    assert_eq!(chat[0].mime_type.as_deref(), Some("image/png"));
    let embeds: Vec<_> = fx
        .backend
        .get_calls()
        .into_iter()
        .filter(|c| c.operation == "embed")
        .collect();
    assert_eq!(embeds.len(), 1);
    assert_eq!(embeds[0].input, "A bar chart showing sales rising from Jan to Jun.");
}

#[tokio::test]
async fn test_oversized_image_classified_from_metadata_only() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Image, "Chart", None, Some("u1/abc.png"));
    fx.reply(fx.t_default, "Image titled Chart.", None);
    let files = MockFileReader::new().with_file("u1/abc.png", vec![0u8; 10 * 1024 * 1024]);

    let outcome = fx
        .processor(files, ProcessorConfig::default())
        .process(&NoteEvent::created(id))
        .await;

    assert_eq!(outcome, EventOutcome::Updated("classification"));
    let note = fx.notes.get(id);
    assert_eq!(note.topic_id, fx.t_default);
    assert_eq!(note.ai_summary.as_deref(), Some("Image titled Chart."));
    assert!(note.content.is_none());
    assert!(fx.notes.embedding(id).is_none());
    assert_eq!(fx.backend.embed_call_count(), 0);
    assert!(fx.backend.chat_calls()[0].mime_type.is_none());
}

#[tokio::test]
async fn test_missing_file_still_gets_topic_and_summary() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Document, "Scan", None, Some("u1/gone.pdf"));
    fx.reply(fx.t_default, "Document titled Scan.", None);

    let outcome = fx
        .processor(MockFileReader::new(), ProcessorConfig::default())
        .process(&NoteEvent::created(id))
        .await;

    assert_eq!(outcome, EventOutcome::Updated("classification"));
    assert_eq!(fx.notes.get(id).ai_summary.as_deref(), Some("Document titled Scan."));
}

#[tokio::test]
async fn test_classifier_error_leaves_note_untouched() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Text, "Plans", Some("ship it"), None);
    let before = fx.notes.get(id);

    let outcome = fx
        .processor_with(Arc::new(FailingClassifier), ProcessorConfig::default())
        .process(&NoteEvent::created(id))
        .await;

    assert!(outcome.is_failure());
    assert!(fx.notes.writes().is_empty());
    assert_eq!(fx.notes.get(id), before);
    assert_eq!(fx.backend.embed_call_count(), 0);
}

#[tokio::test]
async fn test_model_failure_lands_in_default_topic() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Text, "Plans", Some("ship it"), None);
    fx.backend.push_reply(MockReply::Fail("upstream 503".into()));

    let outcome = fx
        .processor(MockFileReader::new(), ProcessorConfig::default())
        .process(&NoteEvent::created(id))
        .await;

    assert_eq!(outcome, EventOutcome::Updated("classification_and_embedding"));
    let note = fx.notes.get(id);
    assert_eq!(note.topic_id, fx.t_default);
    assert!(note
        .ai_summary
        .as_deref()
        .unwrap()
        .starts_with("Error during classification:"));
}

#[tokio::test]
async fn test_embedding_failure_still_persists_classification() {
    let mut fx = Fixture::new();
    fx.backend = MockInferenceBackend::new().with_embed_failure();
    let id = fx.note(NoteType::Text, "Grocery list", Some("buy milk eggs bread"), None);
    fx.reply(fx.t_shopping, "A short shopping list.", None);

    let outcome = fx
        .processor(MockFileReader::new(), ProcessorConfig::default())
        .process(&NoteEvent::created(id))
        .await;

    assert_eq!(outcome, EventOutcome::Updated("classification"));
    assert_eq!(fx.notes.get(id).topic_id, fx.t_shopping);
    assert!(fx.notes.embedding(id).is_none());
}

#[tokio::test]
async fn test_missing_note_and_no_topics_are_skipped() {
    let fx = Fixture::new();
    let processor = fx.processor(MockFileReader::new(), ProcessorConfig::default());

    let outcome = processor.process(&NoteEvent::created(Uuid::new_v4())).await;
    assert!(matches!(outcome, EventOutcome::Skipped(_)));

    let orphan = Note {
        owner_id: Uuid::new_v4(),
        ..fx.notes.get(fx.note(NoteType::Text, "Lonely", Some("x"), None))
    };
    let orphan_id = orphan.id;
    fx.notes.insert(orphan);
    let outcome = processor.process(&NoteEvent::created(orphan_id)).await;
    assert!(matches!(outcome, EventOutcome::Skipped(_)));

    assert!(fx.notes.writes().is_empty());
    assert_eq!(fx.backend.chat_call_count(), 0);
}

#[tokio::test]
async fn test_reprocessing_created_event_is_safe() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Text, "Grocery list", Some("buy milk eggs bread"), None);
    fx.reply(fx.t_shopping, "A short shopping list.", None);
    fx.reply(fx.t_shopping, "Groceries to buy.", None);
    let processor = fx.processor(MockFileReader::new(), ProcessorConfig::default());

    processor.process(&NoteEvent::created(id)).await;
    processor.process(&NoteEvent::created(id)).await;

    let note = fx.notes.get(id);
    assert_eq!(note.topic_id, fx.t_shopping);
    assert_eq!(note.ai_summary.as_deref(), Some("Groceries to buy."));
    assert_eq!(note.content.as_deref(), Some("buy milk eggs bread"));
    assert_eq!(fx.notes.writes().len(), 2);
}

// =============================================================================
// NOTE CONTENT UPDATED
// =============================================================================

#[tokio::test]
async fn test_content_update_rewrites_embedding_only() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Text, "Grocery list", Some("buy milk eggs bread"), None);
    let before = fx.notes.get(id);

    let outcome = fx
        .processor(MockFileReader::new(), ProcessorConfig::default())
        .process(&NoteEvent::content_updated(id, "buy milk and coffee"))
        .await;

    assert_eq!(outcome, EventOutcome::Updated("embedding"));
    assert_eq!(fx.notes.writes(), vec![(id, "embedding")]);
    assert_eq!(fx.notes.get(id), before);
    assert!(fx.notes.embedding(id).is_some());
    assert_eq!(fx.backend.chat_call_count(), 0);
    assert_eq!(fx.backend.get_calls()[0].input, "buy milk and coffee");
}

#[tokio::test]
async fn test_content_update_with_resummarize() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Text, "Grocery list", Some("buy milk eggs bread"), None);
    fx.reply(fx.t_default, "Milk and coffee.", None);

    let outcome = fx
        .processor(MockFileReader::new(), resummarize())
        .process(&NoteEvent::content_updated(id, "buy milk and coffee"))
        .await;

    assert_eq!(outcome, EventOutcome::Updated("embedding_and_summary"));
    let note = fx.notes.get(id);
    assert_eq!(note.ai_summary.as_deref(), Some("Milk and coffee."));
    // Topic is never re-selected on edit.
    assert_eq!(note.topic_id, fx.t_default);
    assert!(fx.backend.chat_calls()[0].input.contains("buy milk and coffee"));
}

#[tokio::test]
async fn test_resummarize_model_failure_keeps_previous_summary() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Text, "Grocery list", Some("buy milk eggs bread"), None);
    fx.notes.notes.lock().unwrap().get_mut(&id).unwrap().ai_summary =
        Some("A short shopping list.".to_string());
    fx.backend
        .push_reply(MockReply::Fail("upstream 503".to_string()));

    let outcome = fx
        .processor(MockFileReader::new(), resummarize())
        .process(&NoteEvent::content_updated(id, "buy coffee"))
        .await;

    assert_eq!(outcome, EventOutcome::Updated("embedding"));
    assert_eq!(fx.notes.writes(), vec![(id, "embedding")]);
    let note = fx.notes.get(id);
    assert_eq!(note.ai_summary.as_deref(), Some("A short shopping list."));
    assert!(fx.notes.embedding(id).is_some());
}

#[tokio::test]
async fn test_resummarize_with_failing_classifier_still_embeds() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Text, "Grocery list", Some("buy milk"), None);

    let outcome = fx
        .processor_with(Arc::new(FailingClassifier), resummarize())
        .process(&NoteEvent::content_updated(id, "buy coffee"))
        .await;

    assert_eq!(outcome, EventOutcome::Updated("embedding"));
    assert!(fx.notes.get(id).ai_summary.is_none());
}

#[tokio::test]
async fn test_resummarize_skips_file_notes() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Image, "Chart", Some("a chart"), Some("u1/abc.png"));

    let outcome = fx
        .processor(MockFileReader::new(), resummarize())
        .process(&NoteEvent::content_updated(id, "a different chart"))
        .await;

    assert_eq!(outcome, EventOutcome::Updated("embedding"));
    assert_eq!(fx.backend.chat_call_count(), 0);
}

#[tokio::test]
async fn test_blank_content_update_is_skipped() {
    let fx = Fixture::new();
    let id = fx.note(NoteType::Text, "Grocery list", Some("buy milk"), None);

    let outcome = fx
        .processor(MockFileReader::new(), ProcessorConfig::default())
        .process(&NoteEvent::content_updated(id, "   "))
        .await;

    assert!(matches!(outcome, EventOutcome::Skipped(_)));
    assert_eq!(fx.backend.embed_call_count(), 0);
    assert!(fx.notes.writes().is_empty());
}

#[tokio::test]
async fn test_content_update_embedding_failure_writes_nothing() {
    let mut fx = Fixture::new();
    fx.backend = MockInferenceBackend::new().with_embed_failure();
    let id = fx.note(NoteType::Text, "Grocery list", Some("buy milk"), None);

    let outcome = fx
        .processor(MockFileReader::new(), resummarize())
        .process(&NoteEvent::content_updated(id, "buy coffee"))
        .await;

    assert!(matches!(outcome, EventOutcome::Skipped(_)));
    assert!(fx.notes.writes().is_empty());
    assert_eq!(fx.backend.chat_call_count(), 0);
}

#[tokio::test]
async fn test_content_update_for_missing_note_is_skipped() {
    let fx = Fixture::new();

    let outcome = fx
        .processor(MockFileReader::new(), ProcessorConfig::default())
        .process(&NoteEvent::content_updated(Uuid::new_v4(), "buy coffee"))
        .await;

    assert!(matches!(outcome, EventOutcome::Skipped(_)));
    assert_eq!(fx.backend.embed_call_count(), 0);
}
