//! Flix API Server
//!
//! REST API server for the flix movie catalog.

use anyhow::Context;
use flix_api::{create_router, state::AppState};
use flix_core::config::{AppConfig, LoggingConfig};
use flix_core::store::sample_catalog;
use flix_core::{MemoryStore, PgStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(&config.logging);

    if config.auth.uses_dev_secret() {
        tracing::warn!("JWT_SECRET is not set; using the development signing secret");
    }

    let state = match config.database.url.clone() {
        Some(url) => {
            let store = Arc::new(
                PgStore::connect(&url, config.database.pool_size)
                    .await
                    .context("failed to connect to PostgreSQL")?,
            );
            tracing::info!(pool_size = config.database.pool_size, "using PostgreSQL store");
            AppState::new(config, store.clone(), store)
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory store with sample catalog");
            AppState::in_memory(config, MemoryStore::with_movies(sample_catalog()))
        }
    };

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Flix API Server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// `FLIX_CONFIG` names a TOML file; the environment overrides it
fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::var("FLIX_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "flix_api={level},flix_core={level},tower_http={level},audit=info",
            level = logging.level
        )
        .into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
