//! In-memory implementation of every repository trait, used by tests.
//! One mutex guards all tables, so a committed write is seen by every later read.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::refresh::{RefreshToken, RefreshTokenRepo};
use crate::chirps::{repo::ChirpRepo, repo_types::Chirp};
use crate::db::RepoError;
use crate::users::{repo::UserRepo, repo_types::User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    chirps: Vec<Chirp>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, RepoError> {
        self.with(|t| {
            if t.users.values().any(|u| u.email == email) {
                return Err(RepoError::Duplicate);
            }
            let now = OffsetDateTime::now_utc();
            let user = User {
                id: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
                is_chirpy_red: false,
            };
            t.users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self.with(|t| t.users.values().find(|u| u.email == email).cloned()))
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.with(|t| t.users.get(&id).cloned()))
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, RepoError> {
        self.with(|t| {
            if t.users.values().any(|u| u.email == email && u.id != id) {
                return Err(RepoError::Duplicate);
            }
            Ok(t.users.get_mut(&id).map(|user| {
                user.email = email.to_string();
                user.hashed_password = hashed_password.to_string();
                user.updated_at = OffsetDateTime::now_utc();
                user.clone()
            }))
        })
    }

    async fn upgrade_to_red(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.with(|t| match t.users.get_mut(&id) {
            Some(user) => {
                user.is_chirpy_red = true;
                user.updated_at = OffsetDateTime::now_utc();
                true
            }
            None => false,
        }))
    }

    async fn delete_all_users(&self) -> Result<u64, RepoError> {
        Ok(self.with(|t| {
            let n = t.users.len() as u64;
            t.users.clear();
            t.chirps.clear();
            t.refresh_tokens.clear();
            n
        }))
    }
}

#[async_trait]
impl ChirpRepo for MemoryStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp, RepoError> {
        Ok(self.with(|t| {
            let now = OffsetDateTime::now_utc();
            let chirp = Chirp {
                id: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
                body: body.to_string(),
                user_id,
            };
            t.chirps.push(chirp.clone());
            chirp
        }))
    }

    async fn list_chirps(&self, author_id: Option<Uuid>) -> Result<Vec<Chirp>, RepoError> {
        Ok(self.with(|t| {
            t.chirps
                .iter()
                .filter(|c| author_id.map_or(true, |a| c.user_id == a))
                .cloned()
                .collect()
        }))
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, RepoError> {
        Ok(self.with(|t| t.chirps.iter().find(|c| c.id == id).cloned()))
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.with(|t| {
            let before = t.chirps.len();
            t.chirps.retain(|c| c.id != id);
            t.chirps.len() != before
        }))
    }
}

#[async_trait]
impl RefreshTokenRepo for MemoryStore {
    async fn insert_refresh_token(&self, record: &RefreshToken) -> Result<(), RepoError> {
        self.with(|t| {
            if t.refresh_tokens.contains_key(&record.token) {
                return Err(RepoError::Duplicate);
            }
            t.refresh_tokens.insert(record.token.clone(), record.clone());
            Ok(())
        })
    }

    async fn lookup_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, RepoError> {
        Ok(self.with(|t| t.refresh_tokens.get(token).cloned()))
    }

    async fn mark_refresh_token_revoked(
        &self,
        token: &str,
        at: OffsetDateTime,
    ) -> Result<bool, RepoError> {
        Ok(self.with(|t| match t.refresh_tokens.get_mut(token) {
            Some(record) => {
                record.revoked_at.get_or_insert(at);
                record.updated_at = at;
                true
            }
            None => false,
        }))
    }
}
