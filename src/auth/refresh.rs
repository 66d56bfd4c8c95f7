use std::sync::Arc;

use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{PgStore, RepoError};

/// 256 bits of entropy.
const REFRESH_TOKEN_BYTES: usize = 32;

/// Persisted refresh-token row. `revoked_at` is set once and never cleared.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub revoked_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait RefreshTokenRepo: Send + Sync {
    /// Must fail with `RepoError::Duplicate` if the token already exists.
    async fn insert_refresh_token(&self, record: &RefreshToken) -> Result<(), RepoError>;
    async fn lookup_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, RepoError>;
    /// Sets `revoked_at` unless already set. `false` when the token is unknown.
    async fn mark_refresh_token_revoked(
        &self,
        token: &str,
        at: OffsetDateTime,
    ) -> Result<bool, RepoError>;
}

#[async_trait]
impl RefreshTokenRepo for PgStore {
    async fn insert_refresh_token(&self, record: &RefreshToken) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&record.token)
        .bind(record.user_id)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.expires_at)
        .bind(record.revoked_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn lookup_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, RepoError> {
        let row = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
              FROM refresh_tokens
             WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_refresh_token_revoked(
        &self,
        token: &str,
        at: OffsetDateTime,
    ) -> Result<bool, RepoError> {
        let res = sqlx::query(
            r#"
            UPDATE refresh_tokens
               SET revoked_at = COALESCE(revoked_at, $2),
                   updated_at = $2
             WHERE token = $1
            "#,
        )
        .bind(token)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}

#[derive(Debug, Error)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token expiry is out of range")]
    ExpiryOutOfRange,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// What a lookup tells the caller. Both flags are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTokenStatus {
    pub user_id: Uuid,
    pub revoked: bool,
    pub expired: bool,
}

pub fn generate_refresh_token() -> String {
    let mut buf = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

#[derive(Clone)]
pub struct RefreshTokenStore {
    repo: Arc<dyn RefreshTokenRepo>,
    ttl: Duration,
}

impl RefreshTokenStore {
    pub fn new(repo: Arc<dyn RefreshTokenRepo>, ttl: Duration) -> Self {
        Self { repo, ttl }
    }

    pub async fn issue(&self, user_id: Uuid) -> Result<String, RefreshTokenError> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now
            .checked_add(self.ttl)
            .ok_or(RefreshTokenError::ExpiryOutOfRange)?;
        let record = RefreshToken {
            token: generate_refresh_token(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        };
        self.repo.insert_refresh_token(&record).await?;
        debug!(user_id = %user_id, expires_at = %record.expires_at, "refresh token issued");
        Ok(record.token)
    }

    pub async fn resolve(&self, token: &str) -> Result<RefreshTokenStatus, RefreshTokenError> {
        let record = self
            .repo
            .lookup_refresh_token(token)
            .await?
            .ok_or(RefreshTokenError::NotFound)?;
        Ok(RefreshTokenStatus {
            user_id: record.user_id,
            revoked: record.revoked_at.is_some(),
            expired: OffsetDateTime::now_utc() > record.expires_at,
        })
    }

    pub async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        let found = self
            .repo
            .mark_refresh_token_revoked(token, OffsetDateTime::now_utc())
            .await?;
        if !found {
            return Err(RefreshTokenError::NotFound);
        }
        info!("refresh token revoked");
        Ok(())
    }
}
