use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{credentials::bearer_token, jwt::AccessTokenCodec};
use crate::error::ApiError;

/// Identity proven by a valid access token in `Authorization: Bearer`.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AccessTokenCodec: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).map_err(|e| {
            warn!(error = %e, "access token not presented");
            ApiError::from(e)
        })?;

        let codec = AccessTokenCodec::from_ref(state);
        let user_id = codec.validate(&token).map_err(|e| {
            warn!(error = %e, "access token rejected");
            ApiError::from(e)
        })?;

        Ok(AuthUser(user_id))
    }
}
