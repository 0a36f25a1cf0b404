//! Query → embed → vector search → grounded answer.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use notekeeper_core::{
    defaults, CoreConfig, Error, NoteClassifier, NoteSummary, Result, RetrieveResponse,
    TextEmbedder, VectorIndex,
};
use notekeeper_db::{Database, PgVectorIndex};

use crate::context::build_notes_context;

/// Answer returned when the search finds nothing within the threshold.
pub const NO_RESULTS_MESSAGE: &str = "I couldn't find any relevant notes to answer your question. Please try a different query or create more notes on this topic.";

/// Answer returned when synthesis fails after notes were found.
pub const ANSWER_ERROR_MESSAGE: &str =
    "I encountered an error while processing your question. Please try again later.";

/// Error message when the query cannot be embedded.
pub const QUERY_FAILED_MESSAGE: &str = "Failed to process your query. Please try again.";

/// Search parameters for retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieverConfig {
    /// Maximum hits passed to synthesis.
    pub k: i64,
    /// Cosine-distance cutoff, inclusive.
    pub max_distance: f64,
    /// Public base URL for `/file/...` links.
    pub deployment_url: String,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            k: defaults::RETRIEVAL_K,
            max_distance: defaults::RETRIEVAL_MAX_DISTANCE,
            deployment_url: defaults::DEPLOYMENT_URL.to_string(),
        }
    }
}

impl RetrieverConfig {
    pub fn from_core(config: &CoreConfig) -> Self {
        Self {
            k: config.retrieval.k,
            max_distance: config.retrieval.max_distance,
            deployment_url: config.storage.deployment_url.clone(),
        }
    }

    pub fn with_k(mut self, k: i64) -> Self {
        self.k = k.max(1);
        self
    }

    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance.clamp(0.0, 2.0);
        self
    }
}

/// Answers questions from the caller's own notes.
pub struct Retriever {
    vectors: Arc<dyn VectorIndex>,
    embedder: Arc<dyn TextEmbedder>,
    classifier: Arc<dyn NoteClassifier>,
    config: RetrieverConfig,
}

impl Retriever {
    pub fn new(
        vectors: Arc<dyn VectorIndex>,
        embedder: Arc<dyn TextEmbedder>,
        classifier: Arc<dyn NoteClassifier>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            vectors,
            embedder,
            classifier,
            config,
        }
    }

    /// Retriever backed by the pgvector index.
    pub fn from_database(
        db: &Database,
        embedder: Arc<dyn TextEmbedder>,
        classifier: Arc<dyn NoteClassifier>,
        config: RetrieverConfig,
    ) -> Self {
        Self::new(
            Arc::new(PgVectorIndex::new(db.pool().clone())),
            embedder,
            classifier,
            config,
        )
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Answer `query` from the user's notes, optionally within one topic.
    ///
    /// A blank query is an input error. A query that cannot be embedded is a
    /// system error. No hits and synthesis failures are successful responses
    /// with fixed messages.
    #[instrument(skip(self, query), fields(subsystem = "search", component = "retriever", op = "retrieve", user_id = %user_id, topic_id = ?topic_id, query_len = query.len()))]
    pub async fn retrieve(
        &self,
        query: &str,
        topic_id: Option<Uuid>,
        user_id: Uuid,
    ) -> Result<RetrieveResponse> {
        let start = Instant::now();

        if query.trim().is_empty() {
            return Err(Error::InvalidInput("Query must not be empty".into()));
        }

        let Some(query_vec) = self.embedder.embed(Some(query)).await else {
            error!("Query embedding failed");
            return Err(Error::Internal(QUERY_FAILED_MESSAGE.into()));
        };

        let hits = self
            .vectors
            .find_similar_notes(
                user_id,
                topic_id,
                &query_vec,
                self.config.k,
                self.config.max_distance,
            )
            .await?;

        if hits.is_empty() {
            info!(
                result_count = 0,
                duration_ms = start.elapsed().as_millis() as u64,
                "No notes within distance threshold"
            );
            return Ok(RetrieveResponse {
                answer: NO_RESULTS_MESSAGE.to_string(),
                relevant_notes: Vec::new(),
                notes_found: 0,
            });
        }

        let context = build_notes_context(&hits);
        debug!(result_count = hits.len(), context_len = context.len(), "Synthesizing answer");

        let answer = match self.classifier.generate_answer(query, &context).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Answer synthesis failed");
                ANSWER_ERROR_MESSAGE.to_string()
            }
        };

        let relevant_notes: Vec<NoteSummary> = hits
            .iter()
            .map(|hit| NoteSummary::from_similar(hit, &self.config.deployment_url))
            .collect();

        info!(
            result_count = relevant_notes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Retrieval complete"
        );

        Ok(RetrieveResponse {
            notes_found: relevant_notes.len(),
            answer,
            relevant_notes,
        })
    }
}
