mod allocation;
mod commentary;
mod config;
mod errors;
mod interpretation;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Incentive API v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config.clone())?;
    if state.llm.is_configured() {
        info!("LLM client initialized (model: {})", state.llm.model());
    } else {
        info!("No LLM_API_KEY set; using rule-based interpretation and canned commentary");
    }
    info!(
        "Allocation seeded: {} brands, Non-CV allow-list {:?}",
        state.allocation.snapshot().await.brands.len(),
        config.non_cv_brands
    );

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the dashboard host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
