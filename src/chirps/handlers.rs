use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{extractors::AuthUser, gate::can_mutate},
    chirps::{
        dto::{ChirpResponse, CreateChirpRequest, ListChirpsQuery},
        filter::{clean_words, is_too_long},
    },
    error::ApiError,
    state::AppState,
};

pub fn chirp_routes() -> Router<AppState> {
    Router::new()
        .route("/api/chirps", get(list_chirps).post(create_chirp))
        .route("/api/chirps/:chirp_id", get(get_chirp).delete(delete_chirp))
}

#[instrument(skip(state, payload))]
pub async fn create_chirp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateChirpRequest>,
) -> Result<(StatusCode, Json<ChirpResponse>), ApiError> {
    if is_too_long(&payload.body) {
        return Err(ApiError::BadRequest("Chirp is too long".into()));
    }

    let chirp = state
        .chirps
        .create_chirp(user_id, &clean_words(&payload.body))
        .await?;

    info!(chirp_id = %chirp.id, user_id = %user_id, "chirp created");
    Ok((StatusCode::CREATED, Json(chirp.into())))
}

#[instrument(skip(state))]
pub async fn list_chirps(
    State(state): State<AppState>,
    Query(q): Query<ListChirpsQuery>,
) -> Result<Json<Vec<ChirpResponse>>, ApiError> {
    let chirps = state.chirps.list_chirps(q.author_id).await?;
    Ok(Json(chirps.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<Uuid>,
) -> Result<Json<ChirpResponse>, ApiError> {
    let chirp = state
        .chirps
        .get_chirp(chirp_id)
        .await?
        .ok_or(ApiError::NotFound("chirp not found"))?;
    Ok(Json(chirp.into()))
}

#[instrument(skip(state))]
pub async fn delete_chirp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(chirp_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let chirp = state
        .chirps
        .get_chirp(chirp_id)
        .await?
        .ok_or(ApiError::NotFound("chirp not found"))?;

    if !can_mutate(user_id, chirp.user_id).is_allowed() {
        warn!(%user_id, owner = %chirp.user_id, %chirp_id, "delete denied");
        return Err(ApiError::Forbidden);
    }

    state.chirps.delete_chirp(chirp_id).await?;
    info!(%user_id, %chirp_id, "chirp deleted");
    Ok(StatusCode::NO_CONTENT)
}
