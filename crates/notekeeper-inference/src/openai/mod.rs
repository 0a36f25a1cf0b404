//! OpenAI-compatible inference backend.
//!
//! Works with any endpoint that speaks the OpenAI `/embeddings` and
//! `/chat/completions` protocol. Chat requests may carry one inline
//! attachment: images are sent as `image_url` data URLs, PDFs as `file`
//! parts.
//!
//! # Example
//!
//! ```rust,no_run
//! use notekeeper_core::{ChatBackend, ChatRequest, CoreConfig};
//! use notekeeper_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let core = CoreConfig::from_env();
//!     let backend = OpenAIBackend::new(OpenAIConfig::from_env(&core)).unwrap();
//!     let reply = backend
//!         .chat(&ChatRequest::new("Be brief.", "Hello"))
//!         .await
//!         .unwrap();
//!     println!("{reply}");
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::{to_core_error, CallKind, OpenAIErrorCode};
pub use types::*;
