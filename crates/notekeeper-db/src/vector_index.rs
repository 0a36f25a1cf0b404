//! pgvector-backed nearest-neighbour search over note embeddings.
//!
//! Uses the cosine-distance operator `<=>`, which returns a value in
//! `[0, 2]` where 0 means identical direction.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use notekeeper_core::defaults::EMBED_DIMENSION;
use notekeeper_core::{Error, Result, SimilarNote, Vector, VectorIndex};

use crate::notes::{note_from_row, NOTE_COLUMNS};

/// Reject vectors that do not match the `vector(1536)` column.
pub fn check_dimension(embedding: &Vector) -> Result<()> {
    let len = embedding.as_slice().len();
    if len != EMBED_DIMENSION {
        return Err(Error::InvalidInput(format!(
            "embedding must have {} dimensions, got {}",
            EMBED_DIMENSION, len
        )));
    }
    Ok(())
}

/// Owner-scoped search. `$2` is a nullable topic filter, `$4` the distance
/// cutoff. Ties on distance are broken by note id so results are stable.
const SIMILAR_NOTES_SQL: &str = "\
    SELECT {cols}, t.name AS topic_name, u.display_name AS owner_display_name, \
           (n.embedding <=> $3) AS distance \
    FROM note n \
    LEFT JOIN topic t ON t.id = n.topic_id \
    LEFT JOIN app_user u ON u.id = n.owner_id \
    WHERE n.owner_id = $1 \
      AND ($2::uuid IS NULL OR n.topic_id = $2) \
      AND n.embedding IS NOT NULL \
      AND (n.embedding <=> $3) <= $4 \
    ORDER BY distance ASC, n.id ASC \
    LIMIT $5";

/// PostgreSQL implementation of [`VectorIndex`].
pub struct PgVectorIndex {
    pool: Pool<Postgres>,
}

impl PgVectorIndex {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn upsert_embedding(&self, note_id: Uuid, embedding: &Vector) -> Result<()> {
        check_dimension(embedding)?;
        let result = sqlx::query("UPDATE note SET embedding = $2 WHERE id = $1")
            .bind(note_id)
            .bind(embedding)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(note_id));
        }
        Ok(())
    }

    #[instrument(
        skip(self, query),
        fields(subsystem = "db", component = "vector_index", op = "find_similar_notes")
    )]
    async fn find_similar_notes(
        &self,
        owner_id: Uuid,
        topic_id: Option<Uuid>,
        query: &Vector,
        k: i64,
        max_distance: f64,
    ) -> Result<Vec<SimilarNote>> {
        check_dimension(query)?;
        if k <= 0 {
            return Ok(Vec::new());
        }

        let sql = SIMILAR_NOTES_SQL.replace("{cols}", NOTE_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .bind(topic_id)
            .bind(query)
            .bind(max_distance)
            .bind(k)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let hit = SimilarNote {
                note: note_from_row(row)?,
                topic_name: row.get("topic_name"),
                owner_display_name: row.get("owner_display_name"),
                distance: row.get("distance"),
            };
            trace!(note_id = %hit.note.id, distance = hit.distance, "Similar note");
            hits.push(hit);
        }

        debug!(result_count = hits.len(), k, max_distance, "Vector search complete");
        Ok(hits)
    }
}
