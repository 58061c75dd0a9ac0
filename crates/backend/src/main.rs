mod routes;
mod seed;
mod storage;

use std::path::PathBuf;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
struct Config {
    db_path: PathBuf,
    port: String,
    seed_file: Option<PathBuf>,
}

impl Config {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Config {
            db_path: PathBuf::from(
                lookup("DB_PATH").unwrap_or_else(|| "data/reports.redb".to_string()),
            ),
            port: lookup("PORT").unwrap_or_else(|| "3000".to_string()),
            seed_file: lookup("SEED_FILE").map(PathBuf::from),
        }
    }
}

/// Build the full application router.
fn build_app(storage: routes::AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(routes::router(storage))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let storage = storage::Storage::open(&config.db_path)?;

    if let Some(seed_file) = &config.seed_file {
        match seed::load(seed_file) {
            Ok(seeds) => {
                seed::apply_if_empty(&storage, seeds)?;
            }
            Err(e) => tracing::warn!(error = %e, "Seed file not loaded"),
        }
    }

    let app = build_app(storage);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, db = %config.db_path.display(), "Report API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
