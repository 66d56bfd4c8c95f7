use async_trait::async_trait;
use uuid::Uuid;

use crate::chirps::repo_types::Chirp;
use crate::db::{PgStore, RepoError};

#[async_trait]
pub trait ChirpRepo: Send + Sync {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp, RepoError>;
    /// Oldest first, optionally restricted to one author.
    async fn list_chirps(&self, author_id: Option<Uuid>) -> Result<Vec<Chirp>, RepoError>;
    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, RepoError>;
    async fn delete_chirp(&self, id: Uuid) -> Result<bool, RepoError>;
}

#[async_trait]
impl ChirpRepo for PgStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp, RepoError> {
        let chirp = sqlx::query_as::<_, Chirp>(
            r#"
            INSERT INTO chirps (body, user_id)
            VALUES ($1, $2)
            RETURNING id, created_at, updated_at, body, user_id
            "#,
        )
        .bind(body)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(chirp)
    }

    async fn list_chirps(&self, author_id: Option<Uuid>) -> Result<Vec<Chirp>, RepoError> {
        let rows = sqlx::query_as::<_, Chirp>(
            r#"
            SELECT id, created_at, updated_at, body, user_id
              FROM chirps
             WHERE $1::uuid IS NULL OR user_id = $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, RepoError> {
        let chirp = sqlx::query_as::<_, Chirp>(
            "SELECT id, created_at, updated_at, body, user_id FROM chirps WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(chirp)
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM chirps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
