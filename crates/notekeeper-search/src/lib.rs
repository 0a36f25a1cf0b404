//! # notekeeper-search
//!
//! Retrieval-augmented answers over a user's notes.
//!
//! This crate provides:
//! - [`Retriever`]: embed the query, run the cosine-distance search, and
//!   synthesize a grounded answer from the hits
//! - Context block formatting for the answer-synthesis prompt
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use notekeeper_search::{Retriever, RetrieverConfig};
//!
//! let retriever = Retriever::from_database(
//!     &db,
//!     embedder,
//!     classifier,
//!     RetrieverConfig::from_core(&config),
//! );
//! let response = retriever.retrieve("what did I buy?", None, user_id).await?;
//! println!("{} ({} notes)", response.answer, response.notes_found);
//! ```

pub mod context;
pub mod retriever;

// Re-export core types
pub use notekeeper_core::*;

pub use context::build_notes_context;
pub use retriever::{Retriever, RetrieverConfig, ANSWER_ERROR_MESSAGE, NO_RESULTS_MESSAGE, QUERY_FAILED_MESSAGE};
