//! Referral API binary
//!
//! Wires tracing, configuration, and the store backend, then serves.
//! The REST row store is used when `REFERRAL_STORE_URL` is set; the
//! in-memory store otherwise (local development).

use std::sync::Arc;

use referral_api::{run_server, ApiConfig, AppState};
use referral_engine::{EngineConfig, MemorySessionStore};
use referral_store::{RestConfig, RestRowStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_config = ApiConfig::from_env();
    let engine_config = EngineConfig::from_env();

    let state = match RestConfig::from_env() {
        Some(rest_config) => {
            info!(base_url = %rest_config.base_url, "using REST row store");
            let store = Arc::new(RestRowStore::new(rest_config));
            AppState::build(
                api_config,
                engine_config,
                store.clone(),
                store.clone(),
                store.clone(),
                store,
                Arc::new(MemorySessionStore::new()),
            )
        }
        None => {
            info!("REFERRAL_STORE_URL unset, using in-memory store");
            AppState::with_memory_store(api_config, engine_config)
        }
    };

    run_server(state).await
}
