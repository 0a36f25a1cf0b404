//! Topic repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use notekeeper_core::{Error, Result, Topic, TopicRepository};

/// PostgreSQL implementation of TopicRepository.
pub struct PgTopicRepository {
    pool: Pool<Postgres>,
}

impl PgTopicRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a topic. Topic CRUD lives outside this service; this exists
    /// for seeding and tests.
    pub async fn insert(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
        is_default: bool,
    ) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO topic (id, owner_id, name, description, is_default) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .bind(is_default)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }
}

#[async_trait]
impl TopicRepository for PgTopicRepository {
    async fn find_topics_by_owner(&self, owner_id: Uuid) -> Result<Vec<Topic>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, name, description, ai_summary, is_default \
             FROM topic WHERE owner_id = $1 \
             ORDER BY is_default DESC, created_at ASC, id ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| Topic {
                id: row.get("id"),
                owner_id: row.get("owner_id"),
                name: row.get("name"),
                description: row.get("description"),
                ai_summary: row.get("ai_summary"),
                is_default: row.get("is_default"),
            })
            .collect())
    }
}
