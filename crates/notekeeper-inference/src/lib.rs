//! # notekeeper-inference
//!
//! Model-facing half of the note pipeline.
//!
//! This crate provides:
//! - An OpenAI-compatible backend for embeddings and (multimodal) chat
//! - [`Embedder`]: single-text embedding that degrades to `None`
//! - [`Classifier`]: topic selection, summary and content extraction with
//!   file-to-text fallback, plus answer synthesis for retrieval
//! - Prompt templates and strict-but-forgiving JSON output parsing
//! - [`FsFileReader`]: upload-root-confined file access
//!
//! # Feature Flags
//!
//! - `mock`: expose [`mock`] backends to other crates' tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notekeeper_core::{CoreConfig, TextEmbedder};
//! use notekeeper_inference::{Embedder, OpenAIBackend, OpenAIConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let core = CoreConfig::from_env();
//!     let backend = Arc::new(OpenAIBackend::new(OpenAIConfig::from_env(&core)).unwrap());
//!     let embedder = Embedder::new(backend);
//!     let vector = embedder.embed(Some("buy milk eggs bread")).await;
//!     println!("embedded: {}", vector.is_some());
//! }
//! ```

pub mod classifier;
pub mod embedder;
pub mod media;
pub mod openai;
pub mod parse;
pub mod prompts;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use classifier::Classifier;
pub use embedder::Embedder;
pub use media::{mime_for_path, FsFileReader};
pub use openai::{OpenAIBackend, OpenAIConfig};
