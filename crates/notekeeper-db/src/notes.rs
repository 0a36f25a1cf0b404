//! Note repository implementation.
//!
//! Reads go through a projection that never selects the embedding column.
//! Every write is a targeted `UPDATE` that sets only the columns it knows;
//! classification writes additionally require the topic to belong to the
//! note's owner.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use notekeeper_core::{Error, Note, NoteRepository, NoteType, Result, Vector};

use crate::vector_index::check_dimension;

/// Columns of the note projection, without `embedding`.
pub(crate) const NOTE_COLUMNS: &str = "n.id, n.owner_id, n.topic_id, n.title, n.description, \
     n.ai_summary, n.type, n.content, n.file_url, n.created_at, n.updated_at";

/// Guard appended to classification writes.
const TOPIC_OWNED_BY_NOTE_OWNER: &str =
    "EXISTS (SELECT 1 FROM topic t WHERE t.id = $2 AND t.owner_id = note.owner_id)";

/// Fields for inserting a note row.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner_id: Uuid,
    pub topic_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub note_type: NoteType,
    pub content: Option<String>,
    pub file_url: Option<String>,
}

/// Map a projection row to a [`Note`].
pub(crate) fn note_from_row(row: &PgRow) -> Result<Note> {
    let type_str: String = row.get("type");
    let note_type = type_str.parse::<NoteType>().map_err(Error::Internal)?;

    Ok(Note {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        topic_id: row.get("topic_id"),
        title: row.get("title"),
        description: row.get("description"),
        ai_summary: row.get("ai_summary"),
        note_type,
        content: row.get("content"),
        file_url: row.get("file_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a note row. Used by upload paths and test fixtures; callers
    /// publish `NoteCreated` after the surrounding transaction commits.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note: NewNote,
    ) -> Result<Uuid> {
        if note.title.chars().count() > 150 {
            return Err(Error::InvalidInput(
                "note title must be at most 150 characters".into(),
            ));
        }
        match note.note_type {
            NoteType::Text if note.content.as_deref().map_or(true, |c| c.trim().is_empty()) => {
                return Err(Error::InvalidInput("text notes require content".into()));
            }
            NoteType::Image | NoteType::Document if note.file_url.is_none() => {
                return Err(Error::InvalidInput(format!(
                    "{} notes require a file_url",
                    note.note_type
                )));
            }
            _ => {}
        }

        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO note (id, owner_id, topic_id, title, description, type, content, file_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(note.owner_id)
        .bind(note.topic_id)
        .bind(&note.title)
        .bind(&note.description)
        .bind(note.note_type.as_str())
        .bind(&note.content)
        .bind(&note.file_url)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    pub async fn insert(&self, note: NewNote) -> Result<Uuid> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let id = self.insert_tx(&mut tx, note).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(id)
    }

    pub async fn find_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Note>> {
        let query = format!("SELECT {} FROM note n WHERE n.id = $1", NOTE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(note_from_row).transpose()
    }

    /// Whether the note currently has an embedding.
    pub async fn has_embedding(&self, id: Uuid) -> Result<bool> {
        let has: Option<bool> =
            sqlx::query_scalar("SELECT embedding IS NOT NULL FROM note WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;
        has.ok_or(Error::NoteNotFound(id))
    }

    pub async fn update_classification_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
    ) -> Result<()> {
        let query = format!(
            "UPDATE note SET topic_id = $2, ai_summary = $3 WHERE id = $1 AND {}",
            TOPIC_OWNED_BY_NOTE_OWNER
        );
        let result = sqlx::query(&query)
            .bind(note_id)
            .bind(topic_id)
            .bind(ai_summary)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        expect_one_row(result.rows_affected(), note_id, Some(topic_id))
    }

    pub async fn update_classification_with_content_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        content: &str,
    ) -> Result<()> {
        let query = format!(
            "UPDATE note SET topic_id = $2, ai_summary = $3, content = $4 WHERE id = $1 AND {}",
            TOPIC_OWNED_BY_NOTE_OWNER
        );
        let result = sqlx::query(&query)
            .bind(note_id)
            .bind(topic_id)
            .bind(ai_summary)
            .bind(content)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        expect_one_row(result.rows_affected(), note_id, Some(topic_id))
    }

    pub async fn update_classification_and_embedding_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        embedding: &Vector,
    ) -> Result<()> {
        check_dimension(embedding)?;
        let query = format!(
            "UPDATE note SET topic_id = $2, ai_summary = $3, embedding = $4 WHERE id = $1 AND {}",
            TOPIC_OWNED_BY_NOTE_OWNER
        );
        let result = sqlx::query(&query)
            .bind(note_id)
            .bind(topic_id)
            .bind(ai_summary)
            .bind(embedding)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        expect_one_row(result.rows_affected(), note_id, Some(topic_id))
    }

    pub async fn update_all_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        content: &str,
        embedding: &Vector,
    ) -> Result<()> {
        check_dimension(embedding)?;
        let query = format!(
            "UPDATE note SET topic_id = $2, ai_summary = $3, content = $4, embedding = $5 \
             WHERE id = $1 AND {}",
            TOPIC_OWNED_BY_NOTE_OWNER
        );
        let result = sqlx::query(&query)
            .bind(note_id)
            .bind(topic_id)
            .bind(ai_summary)
            .bind(content)
            .bind(embedding)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        expect_one_row(result.rows_affected(), note_id, Some(topic_id))
    }

    pub async fn update_embedding_and_summary_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        embedding: &Vector,
        ai_summary: &str,
    ) -> Result<()> {
        check_dimension(embedding)?;
        let result = sqlx::query("UPDATE note SET embedding = $2, ai_summary = $3 WHERE id = $1")
            .bind(note_id)
            .bind(embedding)
            .bind(ai_summary)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        expect_one_row(result.rows_affected(), note_id, None)
    }

    pub async fn update_embedding_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        embedding: &Vector,
    ) -> Result<()> {
        check_dimension(embedding)?;
        let result = sqlx::query("UPDATE note SET embedding = $2 WHERE id = $1")
            .bind(note_id)
            .bind(embedding)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        expect_one_row(result.rows_affected(), note_id, None)
    }
}

fn expect_one_row(rows_affected: u64, note_id: Uuid, topic_id: Option<Uuid>) -> Result<()> {
    if rows_affected == 1 {
        debug!(subsystem = "db", component = "notes", %note_id, "Note updated");
        return Ok(());
    }
    match topic_id {
        Some(topic_id) => Err(Error::NotFound(format!(
            "note {} with topic {} owned by the same user",
            note_id, topic_id
        ))),
        None => Err(Error::NoteNotFound(note_id)),
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn find_note_by_id(&self, id: Uuid) -> Result<Option<Note>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.find_by_id_tx(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(result)
    }

    async fn update_classification(
        &self,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.update_classification_tx(&mut tx, note_id, topic_id, ai_summary)
            .await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn update_classification_with_content(
        &self,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        content: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.update_classification_with_content_tx(&mut tx, note_id, topic_id, ai_summary, content)
            .await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn update_classification_and_embedding(
        &self,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        embedding: &Vector,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.update_classification_and_embedding_tx(
            &mut tx, note_id, topic_id, ai_summary, embedding,
        )
        .await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn update_all(
        &self,
        note_id: Uuid,
        topic_id: Uuid,
        ai_summary: &str,
        content: &str,
        embedding: &Vector,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.update_all_tx(&mut tx, note_id, topic_id, ai_summary, content, embedding)
            .await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn update_embedding_and_summary(
        &self,
        note_id: Uuid,
        embedding: &Vector,
        ai_summary: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.update_embedding_and_summary_tx(&mut tx, note_id, embedding, ai_summary)
            .await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn update_embedding(&self, note_id: Uuid, embedding: &Vector) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.update_embedding_tx(&mut tx, note_id, embedding).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_excludes_embedding() {
        assert!(!NOTE_COLUMNS.contains("embedding"));
        for col in ["id", "owner_id", "topic_id", "type", "file_url", "updated_at"] {
            assert!(NOTE_COLUMNS.contains(col), "missing column {}", col);
        }
    }

    #[test]
    fn test_expect_one_row() {
        let id = Uuid::new_v4();
        assert!(expect_one_row(1, id, None).is_ok());
        assert!(matches!(
            expect_one_row(0, id, None),
            Err(Error::NoteNotFound(n)) if n == id
        ));
        assert!(matches!(
            expect_one_row(0, id, Some(Uuid::new_v4())),
            Err(Error::NotFound(_))
        ));
    }
}
