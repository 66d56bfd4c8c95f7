use std::sync::Arc;

mod admin;
mod app;
mod auth;
mod chirps;
mod config;
mod db;
mod error;
#[cfg(test)]
mod memory;
mod state;
mod users;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config::AppConfig, db::PgStore, state::AppState};

const DEFAULT_LOG_FILTER: &str = "chirpy=debug,axum=info,tower_http=info";

/// `RUST_LOG` picks the filter; `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::from_env()?;
    let store = PgStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let (host, port) = (config.host.clone(), config.port);
    tracing::info!(platform = %config.platform, "starting chirpy");
    let state = AppState::from_store(config, Arc::new(store))?;

    app::serve(app::build_app(state), &host, port).await
}
