//! Structured logging schema and field name constants for notekeeper.
//!
//! All crates use these names for structured `tracing` fields so log
//! aggregation can query the same keys across subsystems. `tracing` macros
//! need literal field names, so these constants document the schema and
//! are used where fields are recorded dynamically.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Event failed, persistence failure, requires operator attention |
//! | WARN  | Recoverable issue, fallback applied (modality, default topic) |
//! | INFO  | Lifecycle events (startup, shutdown), pipeline completions |
//! | DEBUG | Decision points, chosen update pattern, config choices |
//! | TRACE | Per-hit data (search rows, prompt sizes) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "search", "db", "inference", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "classifier", "embedder", "openai", "processor", "worker"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "classify", "embed", "retrieve", "update_all"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Owner (user) UUID scoping the operation.
pub const USER_ID: &str = "user_id";

/// Topic UUID involved in classification or filtering.
pub const TOPIC_ID: &str = "topic_id";

/// Note event kind ("created", "content_updated").
pub const EVENT_KIND: &str = "event_kind";

/// Classifier modality ("text", "image", "document").
pub const MODALITY: &str = "modality";

/// Persistence pattern chosen by the processor.
pub const UPDATE_PATTERN: &str = "update_pattern";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search.
pub const RESULT_COUNT: &str = "result_count";

/// Number of topics offered to the classifier.
pub const TOPIC_COUNT: &str = "topic_count";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Byte size of an attached file.
pub const FILE_SIZE: &str = "file_size";

// ─── Model fields ──────────────────────────────────────────────────────────

/// Model identifier used for the call.
pub const MODEL: &str = "model";

/// Whether the call exceeded the slow threshold.
pub const SLOW: &str = "slow";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Whether the operation succeeded.
pub const SUCCESS: &str = "success";

/// Error message on failure.
pub const ERROR_MSG: &str = "error";
