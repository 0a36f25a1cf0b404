//! Text embedder with degrade-to-`None` semantics.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use notekeeper_core::{defaults, EmbeddingBackend, TextEmbedder, Vector};

/// Embeds single texts through an [`EmbeddingBackend`].
///
/// Blank input short-circuits without a model call. Every failure (transport,
/// non-2xx, empty result, wrong dimension) is logged and reported as `None`,
/// so callers never fail because embedding did.
pub struct Embedder {
    backend: Arc<dyn EmbeddingBackend>,
    dimension: usize,
}

impl Embedder {
    /// Embedder expecting the fixed column width.
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self::with_dimension(backend, defaults::EMBED_DIMENSION)
    }

    pub fn with_dimension(backend: Arc<dyn EmbeddingBackend>, dimension: usize) -> Self {
        Self { backend, dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl TextEmbedder for Embedder {
    async fn embed(&self, text: Option<&str>) -> Option<Vector> {
        let text = text.filter(|t| !t.trim().is_empty())?;
        let start = Instant::now();

        let vectors = match self.backend.embed_texts(&[text.to_string()]).await {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "embedder",
                    op = "embed",
                    model = self.backend.model_name(),
                    error = %e,
                    "Embedding failed"
                );
                return None;
            }
        };

        let Some(vector) = vectors.into_iter().next() else {
            warn!(
                subsystem = "inference",
                component = "embedder",
                op = "embed",
                model = self.backend.model_name(),
                "Embedding model returned no vectors"
            );
            return None;
        };

        let len = vector.as_slice().len();
        if len != self.dimension {
            warn!(
                subsystem = "inference",
                component = "embedder",
                op = "embed",
                expected = self.dimension,
                actual = len,
                "Embedding has wrong dimension"
            );
            return None;
        }

        debug!(
            subsystem = "inference",
            component = "embedder",
            op = "embed",
            text_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embedded text"
        );
        Some(vector)
    }
}
