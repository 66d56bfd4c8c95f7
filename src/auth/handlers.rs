use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use time::Duration;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        credentials::bearer_token,
        dto::{LoginRequest, LoginResponse, RefreshResponse},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/refresh", post(refresh))
        .route("/api/revoke", post(revoke))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    let lifetime = payload.expires_in_seconds.map(Duration::seconds);

    let session = state.auth.login(&email, &payload.password, lifetime).await?;

    Ok(Json(LoginResponse {
        user: session.user.into(),
        token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, ApiError> {
    let refresh_token = bearer_token(&headers).map_err(|e| {
        warn!(error = %e, "refresh without bearer token");
        ApiError::from(e)
    })?;
    let token = state.auth.refresh(&refresh_token).await?;
    Ok(Json(RefreshResponse { token }))
}

#[instrument(skip_all)]
pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let refresh_token = bearer_token(&headers).map_err(|e| {
        warn!(error = %e, "revoke without bearer token");
        ApiError::from(e)
    })?;
    state.auth.revoke(&refresh_token).await?;
    info!("revoke acknowledged");
    Ok(StatusCode::NO_CONTENT)
}
