mod config;
mod errors;
mod interview;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::store::SessionStore;
use crate::llm_client::GeminiConnector;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview Coach API v{}", env!("CARGO_PKG_VERSION"));

    let connector = GeminiConnector::new(
        &config.gemini_base_url,
        &config.gemini_model,
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    info!("LLM connector initialized (model: {})", connector.model());

    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY not set; every session must supply its own key");
    }

    let sessions = SessionStore::new();
    let idle_ttl = Duration::from_secs(config.session_idle_ttl_secs);
    let sweep_every = idle_ttl.clamp(Duration::from_secs(1), Duration::from_secs(60));
    sessions.spawn_idle_sweeper(idle_ttl, sweep_every);
    info!("Idle sessions expire after {}s", config.session_idle_ttl_secs);

    let state = AppState {
        sessions,
        connector: Arc::new(connector),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
