use std::sync::Arc;

use thiserror::Error;
use time::Duration;
use tracing::{info, instrument, warn};

use super::{
    jwt::{AccessTokenCodec, MAX_ACCESS_TTL},
    password::PasswordHasher,
    refresh::{RefreshTokenError, RefreshTokenStore},
};
use crate::users::{repo::UserRepo, repo_types::User};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unknown refresh token")]
    UnknownToken,
    #[error("refresh token revoked")]
    Revoked,
    #[error("refresh token expired")]
    Expired,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RefreshTokenError> for AuthError {
    fn from(e: RefreshTokenError) -> Self {
        match e {
            RefreshTokenError::NotFound => AuthError::UnknownToken,
            RefreshTokenError::ExpiryOutOfRange => AuthError::Internal(e.into()),
            RefreshTokenError::Repo(e) => AuthError::Internal(e.into()),
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Login, refresh and revoke on top of the hasher, codec and refresh store.
pub struct SessionAuthority {
    users: Arc<dyn UserRepo>,
    hasher: PasswordHasher,
    codec: AccessTokenCodec,
    refresh: RefreshTokenStore,
    // verified against when the email is unknown, so both failures cost the same
    dummy_hash: String,
}

impl SessionAuthority {
    pub fn new(
        users: Arc<dyn UserRepo>,
        hasher: PasswordHasher,
        codec: AccessTokenCodec,
        refresh: RefreshTokenStore,
    ) -> anyhow::Result<Self> {
        let dummy_hash = hasher.hash("chirpy-dummy-password")?;
        Ok(Self {
            users,
            hasher,
            codec,
            refresh,
            dummy_hash,
        })
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        lifetime: Option<Duration>,
    ) -> Result<LoginSession, AuthError> {
        let user = self
            .users
            .get_user_by_email(email)
            .await
            .map_err(anyhow::Error::from)?;

        let Some(user) = user else {
            let _ = self.hasher.verify(&self.dummy_hash, password);
            warn!("login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(&user.hashed_password, password)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .codec
            .issue(user.id, lifetime.unwrap_or(MAX_ACCESS_TTL))?;
        let refresh_token = self.refresh.issue(user.id).await?;

        info!(user_id = %user.id, "user logged in");
        Ok(LoginSession {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchanges a live refresh token for a new one-hour access token. The
    /// refresh token itself is neither rotated nor extended.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let status = match self.refresh.resolve(refresh_token).await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "refresh rejected");
                return Err(e.into());
            }
        };

        if status.revoked {
            warn!(user_id = %status.user_id, "refresh with revoked token");
            return Err(AuthError::Revoked);
        }
        if status.expired {
            warn!(user_id = %status.user_id, "refresh with expired token");
            return Err(AuthError::Expired);
        }

        let token = self.codec.issue(status.user_id, MAX_ACCESS_TTL)?;
        info!(user_id = %status.user_id, "access token refreshed");
        Ok(token)
    }

    /// Unknown tokens are logged and otherwise treated as success.
    #[instrument(skip_all)]
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        match self.refresh.revoke(refresh_token).await {
            Ok(()) => Ok(()),
            Err(RefreshTokenError::NotFound) => {
                warn!("revoke of unknown refresh token");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
