//! Runtime configuration for the note-processing and retrieval core.
//!
//! Values come from environment variables (a `.env` file is loaded by the
//! binary through `dotenvy`). Unset or unparseable values fall back to
//! [`crate::defaults`].
//!
//! | Key | Variable | Default |
//! |-----|----------|---------|
//! | `embeddingModel.name` | `EMBEDDING_MODEL` | `text-embedding-3-small` |
//! | `chatModel.name` | `CHAT_MODEL` | `gpt-4o-mini` |
//! | `chatModel.powerfulName` | `CHAT_MODEL_POWERFUL` | `gpt-4o` |
//! | `storage.uploadDir` | `UPLOAD_DIR` | `./uploads` |
//! | `storage.deploymentUrl` | `DEPLOYMENT_URL` | `http://localhost:8080` |
//! | `retrieval.k` | `RETRIEVAL_K` | `5` |
//! | `retrieval.maxDistance` | `RETRIEVAL_MAX_DISTANCE` | `0.6` |
//! | `classifier.maxImageBytes` | `CLASSIFIER_MAX_IMAGE_BYTES` | 5 MiB |
//! | `classifier.maxDocumentBytes` | `CLASSIFIER_MAX_DOCUMENT_BYTES` | 20 MiB |
//! | `processor.resummarizeOnEdit` | `RESUMMARIZE_ON_EDIT` | `false` |

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults;
use crate::{Error, Result};

/// Embedding model selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingModelConfig {
    pub name: String,
}

/// Chat model selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatModelConfig {
    /// Model used for classification and answer synthesis.
    pub name: String,
    /// Higher-capability model, reserved for future use.
    pub powerful_name: String,
}

/// Upload storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory that note `file_url` values resolve against.
    pub upload_dir: PathBuf,
    /// Public base URL used to build `/file/...` links.
    pub deployment_url: String,
}

/// Vector search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub k: i64,
    pub max_distance: f64,
}

/// Per-modality file size caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub max_image_bytes: u64,
    pub max_document_bytes: u64,
}

/// Note processor behavior switches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Regenerate the AI summary when a text note's content is edited.
    pub resummarize_on_edit: bool,
}

/// Complete core configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub embedding_model: EmbeddingModelConfig,
    pub chat_model: ChatModelConfig,
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
    pub classifier: ClassifierConfig,
    pub processor: ProcessorConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            embedding_model: EmbeddingModelConfig {
                name: defaults::EMBED_MODEL.to_string(),
            },
            chat_model: ChatModelConfig {
                name: defaults::CHAT_MODEL.to_string(),
                powerful_name: defaults::CHAT_MODEL_POWERFUL.to_string(),
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from(defaults::UPLOAD_DIR),
                deployment_url: defaults::DEPLOYMENT_URL.to_string(),
            },
            retrieval: RetrievalConfig {
                k: defaults::RETRIEVAL_K,
                max_distance: defaults::RETRIEVAL_MAX_DISTANCE,
            },
            classifier: ClassifierConfig {
                max_image_bytes: defaults::MAX_IMAGE_BYTES,
                max_document_bytes: defaults::MAX_DOCUMENT_BYTES,
            },
            processor: ProcessorConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// `retrieval.k` is clamped to at least 1 and `retrieval.maxDistance`
    /// to the cosine-distance range `[0, 2]`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = Self::default();

        let string = |key: &str, default: String| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        let config = Self {
            embedding_model: EmbeddingModelConfig {
                name: string("EMBEDDING_MODEL", base.embedding_model.name),
            },
            chat_model: ChatModelConfig {
                name: string("CHAT_MODEL", base.chat_model.name),
                powerful_name: string("CHAT_MODEL_POWERFUL", base.chat_model.powerful_name),
            },
            storage: StorageConfig {
                upload_dir: lookup("UPLOAD_DIR")
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or(base.storage.upload_dir),
                deployment_url: string("DEPLOYMENT_URL", base.storage.deployment_url)
                    .trim_end_matches('/')
                    .to_string(),
            },
            retrieval: RetrievalConfig {
                k: parse_or(&lookup, "RETRIEVAL_K", base.retrieval.k).max(1),
                max_distance: parse_or(
                    &lookup,
                    "RETRIEVAL_MAX_DISTANCE",
                    base.retrieval.max_distance,
                )
                .clamp(0.0, 2.0),
            },
            classifier: ClassifierConfig {
                max_image_bytes: parse_or(
                    &lookup,
                    "CLASSIFIER_MAX_IMAGE_BYTES",
                    base.classifier.max_image_bytes,
                ),
                max_document_bytes: parse_or(
                    &lookup,
                    "CLASSIFIER_MAX_DOCUMENT_BYTES",
                    base.classifier.max_document_bytes,
                ),
            },
            processor: ProcessorConfig {
                resummarize_on_edit: lookup("RESUMMARIZE_ON_EDIT")
                    .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
            },
        };

        debug!(
            subsystem = "core",
            component = "config",
            embedding_model = %config.embedding_model.name,
            chat_model = %config.chat_model.name,
            upload_dir = %config.storage.upload_dir.display(),
            retrieval_k = config.retrieval.k,
            retrieval_max_distance = config.retrieval.max_distance,
            "Loaded core configuration"
        );

        config
    }

    /// Reject configurations the core cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.embedding_model.name.is_empty() {
            return Err(Error::Config("embedding model name cannot be empty".into()));
        }
        if self.chat_model.name.is_empty() {
            return Err(Error::Config("chat model name cannot be empty".into()));
        }
        if self.retrieval.k < 1 {
            return Err(Error::Config(format!(
                "retrieval.k must be at least 1, got {}",
                self.retrieval.k
            )));
        }
        if !(0.0..=2.0).contains(&self.retrieval.max_distance) {
            return Err(Error::Config(format!(
                "retrieval.maxDistance must be within [0, 2], got {}",
                self.retrieval.max_distance
            )));
        }
        if self.classifier.max_image_bytes == 0 || self.classifier.max_document_bytes == 0 {
            return Err(Error::Config("classifier size caps must be positive".into()));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
