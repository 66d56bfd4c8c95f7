use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{PgStore, RepoError};
use crate::users::repo_types::User;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, RepoError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    /// Replace email and password hash; `None` when the user does not exist.
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, RepoError>;
    /// Set the privileged-tier flag; `false` when the user does not exist.
    async fn upgrade_to_red(&self, id: Uuid) -> Result<bool, RepoError>;
    /// Remove every user. Chirps and refresh tokens go with them.
    async fn delete_all_users(&self) -> Result<u64, RepoError>;
}

const USER_COLUMNS: &str = "id, created_at, updated_at, email, hashed_password, is_chirpy_red";

#[async_trait]
impl UserRepo for PgStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, hashed_password)
            VALUES ($1, $2)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET email = $2, hashed_password = $3, updated_at = NOW()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(email)
        .bind(hashed_password)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn upgrade_to_red(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query(
            "UPDATE users SET is_chirpy_red = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete_all_users(&self) -> Result<u64, RepoError> {
        let res = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(res.rows_affected())
    }
}
