use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};

use crate::{
    auth::{credentials::service_key, extractors::AuthUser, PublicUser},
    db::RepoError,
    error::ApiError,
    state::AppState,
    users::dto::{CredentialsRequest, PolkaWebhook},
};

const UPGRADE_EVENT: &str = "user.upgraded";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(create_user).put(update_user))
        .route("/api/polka/webhooks", post(polka_webhook))
        .route("/api/me", get(get_me))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Normalizes the email and rejects blank or invalid input.
fn validate(payload: &CredentialsRequest) -> Result<String, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::BadRequest("invalid email".into()));
    }
    if payload.password.trim().is_empty() {
        warn!("blank password");
        return Err(ApiError::BadRequest("password must not be empty".into()));
    }
    Ok(email)
}

fn conflict_on_duplicate(e: RepoError) -> ApiError {
    match e {
        RepoError::Duplicate => ApiError::Conflict("email already registered"),
        other => other.into(),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let email = validate(&payload)?;
    let hash = state.auth.hasher().hash(&payload.password)?;

    let user = state
        .users
        .create_user(&email, &hash)
        .await
        .map_err(conflict_on_duplicate)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let email = validate(&payload)?;
    let hash = state.auth.hasher().hash(&payload.password)?;

    // A valid token for a user that has since been deleted.
    let user = state
        .users
        .update_credentials(user_id, &email, &hash)
        .await
        .map_err(conflict_on_duplicate)?
        .ok_or_else(ApiError::unauthorized)?;

    info!(user_id = %user.id, "user credentials updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.users.get_user_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token for unknown user");
        ApiError::unauthorized()
    })?;
    Ok(Json(user.into()))
}

fn keys_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// The body is only decoded once the service key has been accepted.
#[instrument(skip(state, headers, payload))]
pub async fn polka_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PolkaWebhook>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let key = service_key(&headers).map_err(|e| {
        warn!(error = %e, "webhook without service key");
        ApiError::from(e)
    })?;
    if !keys_match(&key, &state.config.polka_key) {
        warn!("webhook with wrong service key");
        return Err(ApiError::unauthorized());
    }

    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if payload.event != UPGRADE_EVENT {
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = payload.data.user_id;
    if !state.users.upgrade_to_red(user_id).await? {
        return Err(ApiError::NotFound("user not found"));
    }

    info!(user_id = %user_id, "user upgraded");
    Ok(StatusCode::NO_CONTENT)
}
