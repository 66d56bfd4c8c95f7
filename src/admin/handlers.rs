use std::sync::atomic::Ordering;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Html, Response},
    routing::{get, post},
    Router,
};
use tracing::{info, instrument, warn};

use crate::{error::ApiError, state::AppState};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/healthz", get(healthz))
        .route("/admin/metrics", get(metrics))
        .route("/admin/reset", post(reset))
}

pub async fn healthz() -> &'static str {
    "OK"
}

/// Counts every request that reaches the static file server.
pub async fn count_hits(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.hits.fetch_add(1, Ordering::Relaxed);
    next.run(req).await
}

#[instrument(skip(state))]
pub async fn metrics(State(state): State<AppState>) -> Html<String> {
    let hits = state.hits.load(Ordering::Relaxed);
    Html(format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {hits} times!</p>
  </body>
</html>"#
    ))
}

/// Development-only: wipes users (with their chirps and refresh tokens) and the hit counter.
#[instrument(skip(state))]
pub async fn reset(State(state): State<AppState>) -> Result<String, ApiError> {
    if !state.config.is_dev() {
        warn!(platform = %state.config.platform, "reset refused outside dev");
        return Err(ApiError::Forbidden);
    }

    let deleted = state.users.delete_all_users().await?;
    let before = state.hits.swap(0, Ordering::Relaxed);
    info!(deleted, hits = before, "state reset");
    Ok(format!("Hits (before reset): {before}\nHits (after reset): 0"))
}
