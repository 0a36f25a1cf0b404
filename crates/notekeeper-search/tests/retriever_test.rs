//! Retrieval scenarios against an in-memory vector index and the mock model
//! backend.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use notekeeper_core::{
    CoreConfig, Error, Note, NoteType, Result, SimilarNote, Vector, VectorIndex,
};
use notekeeper_inference::mock::{MockFileReader, MockInferenceBackend, MockReply};
use notekeeper_inference::prompts::ANSWER_SYSTEM_PROMPT;
use notekeeper_inference::{Classifier, Embedder};
use notekeeper_search::{
    Retriever, RetrieverConfig, ANSWER_ERROR_MESSAGE, NO_RESULTS_MESSAGE, QUERY_FAILED_MESSAGE,
};

/// Index with a fixed distance per note, filtered the way the SQL query is.
#[derive(Default)]
struct FixedDistanceIndex {
    rows: Vec<SimilarNote>,
    searches: Mutex<Vec<(i64, f64)>>,
}

#[async_trait]
impl VectorIndex for FixedDistanceIndex {
    async fn upsert_embedding(&self, _note_id: Uuid, _embedding: &Vector) -> Result<()> {
        Ok(())
    }

    async fn find_similar_notes(
        &self,
        owner_id: Uuid,
        topic_id: Option<Uuid>,
        _query: &Vector,
        k: i64,
        max_distance: f64,
    ) -> Result<Vec<SimilarNote>> {
        self.searches.lock().unwrap().push((k, max_distance));
        let mut hits: Vec<SimilarNote> = self
            .rows
            .iter()
            .filter(|r| r.note.owner_id == owner_id)
            .filter(|r| topic_id.map_or(true, |t| r.note.topic_id == t))
            .filter(|r| r.distance <= max_distance)
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.note.id.cmp(&b.note.id))
        });
        hits.truncate(k as usize);
        Ok(hits)
    }
}

struct Fixture {
    user: Uuid,
    topic: Uuid,
    backend: MockInferenceBackend,
}

impl Fixture {
    fn new() -> Self {
        Self {
            user: Uuid::new_v4(),
            topic: Uuid::new_v4(),
            backend: MockInferenceBackend::new(),
        }
    }

    fn row(&self, title: &str, distance: f64) -> SimilarNote {
        SimilarNote {
            note: Note {
                id: Uuid::new_v4(),
                owner_id: self.user,
                topic_id: self.topic,
                title: title.to_string(),
                description: None,
                ai_summary: Some(format!("Summary of {}.", title)),
                note_type: NoteType::Text,
                content: Some(format!("Content of {}.", title)),
                file_url: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            topic_name: Some("Work".to_string()),
            owner_display_name: Some("Ada".to_string()),
            distance,
        }
    }

    fn retriever(&self, index: Arc<FixedDistanceIndex>) -> Retriever {
        let classifier = Classifier::new(
            Arc::new(self.backend.clone()),
            Arc::new(MockFileReader::new()),
            CoreConfig::default().classifier,
        );
        Retriever::new(
            index,
            Arc::new(Embedder::new(Arc::new(self.backend.clone()))),
            Arc::new(classifier),
            RetrieverConfig::default(),
        )
    }
}

#[tokio::test]
async fn test_no_hits_returns_fixed_message() {
    let fx = Fixture::new();
    let index = Arc::new(FixedDistanceIndex {
        rows: vec![fx.row("a", 0.9), fx.row("b", 0.95), fx.row("c", 1.2)],
        ..Default::default()
    });

    let response = fx
        .retriever(index)
        .retrieve("quantum computing", None, fx.user)
        .await
        .unwrap();

    assert_eq!(response.answer, NO_RESULTS_MESSAGE);
    assert!(response.relevant_notes.is_empty());
    assert_eq!(response.notes_found, 0);
    assert_eq!(fx.backend.chat_call_count(), 0);
}

#[tokio::test]
async fn test_hits_within_threshold_feed_synthesis_in_order() {
    let fx = Fixture::new();
    let rows = vec![
        fx.row("d01", 0.1),
        fx.row("d02", 0.2),
        fx.row("d05", 0.5),
        fx.row("d07", 0.7),
        fx.row("d055", 0.55),
    ];
    let index = Arc::new(FixedDistanceIndex {
        rows,
        ..Default::default()
    });
    fx.backend
        .push_reply(MockReply::Text("Note 1 and Note 2 cover this.".into()));

    let response = fx
        .retriever(index.clone())
        .retrieve("what is on my plate?", None, fx.user)
        .await
        .unwrap();

    let titles: Vec<&str> = response
        .relevant_notes
        .iter()
        .map(|n| n.title.as_str())
        .collect();
    assert_eq!(titles, vec!["d01", "d02", "d05", "d055"]);
    assert_eq!(response.notes_found, 4);
    assert_eq!(response.answer, "Note 1 and Note 2 cover this.");
    assert_eq!(index.searches.lock().unwrap().as_slice(), &[(5, 0.6)]);

    let chat = fx.backend.chat_calls();
    assert_eq!(chat.len(), 1);
    assert_eq!(chat[0].system, ANSWER_SYSTEM_PROMPT);
    assert_eq!(chat[0].temperature, Some(0.3));
    assert_eq!(chat[0].max_tokens, Some(500));
    assert!(chat[0].input.contains("User Question: what is on my plate?"));
    assert!(chat[0].input.contains("Note 4:\nTitle: d055\nTopic: Work\n"));
    assert!(!chat[0].input.contains("d07"));

    let first = &response.relevant_notes[0];
    assert_eq!(first.content.as_deref(), Some("Content of d01."));
    assert_eq!(first.owner_display_name.as_deref(), Some("Ada"));
    assert!(first.file_url.is_none());
}

#[tokio::test]
async fn test_topic_filter_and_owner_scope() {
    let fx = Fixture::new();
    let mut other_topic = fx.row("elsewhere", 0.1);
    other_topic.note.topic_id = Uuid::new_v4();
    let mut other_user = fx.row("not mine", 0.05);
    other_user.note.owner_id = Uuid::new_v4();
    let index = Arc::new(FixedDistanceIndex {
        rows: vec![fx.row("mine", 0.3), other_topic, other_user],
        ..Default::default()
    });
    fx.backend.push_reply(MockReply::Text("Answer.".into()));

    let response = fx
        .retriever(index)
        .retrieve("anything", Some(fx.topic), fx.user)
        .await
        .unwrap();

    assert_eq!(response.notes_found, 1);
    assert_eq!(response.relevant_notes[0].title, "mine");
}

#[tokio::test]
async fn test_file_notes_project_public_link() {
    let fx = Fixture::new();
    let mut image = fx.row("Chart", 0.2);
    image.note.note_type = NoteType::Image;
    image.note.file_url = Some("u1/abc.png".into());
    let index = Arc::new(FixedDistanceIndex {
        rows: vec![image],
        ..Default::default()
    });
    fx.backend.push_reply(MockReply::Text("A chart.".into()));

    let response = fx
        .retriever(index)
        .retrieve("sales chart", None, fx.user)
        .await
        .unwrap();

    let note = &response.relevant_notes[0];
    assert!(note.content.is_none());
    assert_eq!(
        note.file_url.as_deref(),
        Some("http://localhost:8080/file/u1/abc.png")
    );
}

#[tokio::test]
async fn test_synthesis_failure_returns_apology_with_notes() {
    let fx = Fixture::new();
    let index = Arc::new(FixedDistanceIndex {
        rows: vec![fx.row("a", 0.1)],
        ..Default::default()
    });
    fx.backend.push_reply(MockReply::Fail("upstream timeout".into()));

    let response = fx
        .retriever(index)
        .retrieve("anything", None, fx.user)
        .await
        .unwrap();

    assert_eq!(response.answer, ANSWER_ERROR_MESSAGE);
    assert_eq!(response.notes_found, 1);
}

#[tokio::test]
async fn test_blank_query_is_client_error() {
    let fx = Fixture::new();
    let err = fx
        .retriever(Arc::new(FixedDistanceIndex::default()))
        .retrieve("   ", None, fx.user)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(err.is_client_error());
    assert_eq!(fx.backend.embed_call_count(), 0);
}

#[tokio::test]
async fn test_query_embedding_failure_is_system_error() {
    let mut fx = Fixture::new();
    fx.backend = MockInferenceBackend::new().with_embed_failure();

    let err = fx
        .retriever(Arc::new(FixedDistanceIndex::default()))
        .retrieve("anything", None, fx.user)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Internal(ref msg) if msg == QUERY_FAILED_MESSAGE));
    assert!(!err.is_client_error());
}
