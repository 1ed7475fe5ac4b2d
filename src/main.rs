//! Career Signal Engine — Binary Entrypoint
//! Boots the Axum HTTP server, wiring collaborators, shared state, and
//! middleware.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use career_signal_engine::api::{self, AppState};
use career_signal_engine::config::EngineConfig;
use career_signal_engine::genai::{GenAiClient, MetadataCredentialSource, TokenCache, VertexProvider};
use career_signal_engine::metrics::Metrics;
use career_signal_engine::warehouse::HttpWarehouse;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - ENGINE_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("ENGINE_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("career_signal_engine=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    // Config file wins; env-only deployments fall back to from_env().
    let cfg = EngineConfig::load_from_file("config/engine.json")
        .or_else(|_| EngineConfig::from_env())
        .expect("Failed to load engine config");

    let warehouse = Arc::new(
        HttpWarehouse::new(&cfg.warehouse_url, &cfg.warehouse_token)
            .expect("Failed to build warehouse client"),
    );

    let credentials = Arc::new(
        MetadataCredentialSource::new(None).expect("Failed to build credential source"),
    );
    let provider = Arc::new(
        VertexProvider::new(&cfg.project, &cfg.location).expect("Failed to build model provider"),
    );
    let genai = Arc::new(GenAiClient::new(
        provider,
        TokenCache::new(credentials),
        cfg.preferred_model.clone(),
    ));

    let metrics = Metrics::init();

    let state = AppState { warehouse, genai };
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
