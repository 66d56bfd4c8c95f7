use std::{net::SocketAddr, time::Duration};

use axum::{
    http::{Request, Response},
    middleware, Router,
};
use tracing::Span;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;
use crate::{admin, auth, chirps, users};

pub fn build_app(state: AppState) -> Router {
    let files = Router::new()
        .nest_service("/app", ServeDir::new(&state.config.filepath_root))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin::handlers::count_hits,
        ));

    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(chirps::router())
        .merge(admin::router())
        .merge(files)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    // Path only; query strings can carry ids.
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        path = req.uri().path(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|res: &Response<_>, latency: Duration, span: &Span| {
                    let status = res.status().as_u16();
                    span.record("status", status);
                    span.record("latency_ms", latency.as_millis() as u64);
                    match status {
                        500.. => tracing::error!("request failed"),
                        400..=499 => tracing::debug!("request rejected"),
                        _ => tracing::debug!("request served"),
                    }
                }),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
