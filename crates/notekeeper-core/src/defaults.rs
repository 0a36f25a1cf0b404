//! Centralized default constants for notekeeper.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers; runtime overrides go through [`crate::config::CoreConfig`].

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default embedding model name.
pub const EMBED_MODEL: &str = "text-embedding-3-small";

/// Fixed embedding vector dimension. The `note.embedding` column is
/// declared with this width.
pub const EMBED_DIMENSION: usize = 1536;

// =============================================================================
// CHAT MODELS
// =============================================================================

/// Default chat model used for classification and answer synthesis.
pub const CHAT_MODEL: &str = "gpt-4o-mini";

/// Higher-capability chat model. Reserved; nothing in the core calls it.
pub const CHAT_MODEL_POWERFUL: &str = "gpt-4o";

/// Default OpenAI-compatible API base URL.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Sampling temperature for the powerful model client.
pub const POWERFUL_TEMPERATURE: f32 = 1.0;

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Sampling temperature for note classification.
pub const CLASSIFY_TEMPERATURE: f32 = 0.3;

/// Output token ceiling for note classification.
pub const CLASSIFY_MAX_TOKENS: u32 = 2000;

/// Largest image file attached to a classification prompt (5 MiB).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Largest document file attached to a classification prompt (20 MiB).
pub const MAX_DOCUMENT_BYTES: u64 = 20 * 1024 * 1024;

/// MIME type used when a file extension is not recognized.
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Number of nearest notes fed to answer synthesis.
pub const RETRIEVAL_K: i64 = 5;

/// Cosine-distance cutoff for retrieval (similarity >= 0.7 under 1 - d/2).
pub const RETRIEVAL_MAX_DISTANCE: f64 = 0.6;

/// Sampling temperature for answer synthesis.
pub const ANSWER_TEMPERATURE: f32 = 0.3;

/// Output token ceiling for answer synthesis.
pub const ANSWER_MAX_TOKENS: u32 = 500;

// =============================================================================
// STORAGE
// =============================================================================

/// Root directory for uploaded note files.
pub const UPLOAD_DIR: &str = "./uploads";

/// Public base URL used to build file links in retrieval results.
pub const DEPLOYMENT_URL: &str = "http://localhost:8080";

// =============================================================================
// TIMEOUTS
// =============================================================================

/// HTTP timeout for model calls (seconds).
pub const MODEL_TIMEOUT_SECS: u64 = 120;

/// Upper bound on processing one note event end to end (seconds).
pub const JOB_TIMEOUT_SECS: u64 = 300;

/// Threshold above which a model call is logged as slow (milliseconds).
pub const SLOW_CALL_THRESHOLD_MS: u64 = 10_000;

// =============================================================================
// EVENT WORKER
// =============================================================================

/// Number of worker shards processing note events.
pub const JOB_MAX_CONCURRENT: usize = 4;

/// Bounded queue depth per worker shard.
pub const JOB_QUEUE_CAPACITY: usize = 256;

/// Capacity of the worker lifecycle broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;
