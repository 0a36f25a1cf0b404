//! # notekeeper-db
//!
//! PostgreSQL database layer for notekeeper.
//!
//! This crate provides:
//! - Connection pool management
//! - Note and topic repositories
//! - Targeted multi-column note updates
//! - Owner-scoped vector search with pgvector
//!
//! ## Example
//!
//! ```rust,ignore
//! use notekeeper_db::{Database, NoteRepository, PoolConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect_with_config(
//!         "postgres://localhost/notekeeper",
//!         PoolConfig::from_env(),
//!     )
//!     .await?;
//!     let note = db.notes.find_note_by_id(note_id).await?;
//!     Ok(())
//! }
//! ```

pub mod notes;
pub mod pool;
pub mod topics;
pub mod vector_index;

// Test fixtures for integration tests
pub mod test_fixtures;

// Re-export core types
pub use notekeeper_core::*;

pub use notes::{NewNote, PgNoteRepository};
pub use pool::{create_pool, log_pool_metrics, PoolConfig, PoolSnapshot};
pub use topics::PgTopicRepository;
pub use vector_index::{check_dimension, PgVectorIndex};

use sqlx::{Pool, Postgres};

/// Database handle bundling the pool and all repositories.
pub struct Database {
    pool: Pool<Postgres>,
    pub notes: PgNoteRepository,
    pub topics: PgTopicRepository,
    pub vectors: PgVectorIndex,
}

impl Database {
    /// Create a new Database instance from an existing pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            topics: PgTopicRepository::new(pool.clone()),
            vectors: PgVectorIndex::new(pool.clone()),
            pool,
        }
    }

    /// Connect with the given pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
