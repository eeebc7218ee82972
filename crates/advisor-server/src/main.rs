//! stock-advisor HTTP Server
//!
//! Axum-based REST API for per-user risk profiles, direction predictions,
//! price history, labeled news and free-text sentiment.

mod config;
mod error;
mod handlers;
mod routes;
mod state;
mod users;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    tracing::info!("Market data source: {:?}", config.market_source);
    tracing::info!("Classifier artifact: {}", config.advisor.model_path.display());

    let state = AppState::from_config(&config)?;

    // Verify Ollama connection
    if let Some(ollama) = &state.ollama {
        if ollama.health_check().await {
            tracing::info!("✓ Connected to Ollama (model {})", ollama.model());
        } else {
            tracing::warn!("⚠ Ollama not available - news sentiment will be neutral");
            tracing::warn!("  Make sure Ollama is running: ollama serve");
        }
    }

    if !config.advisor.model_path.exists() {
        tracing::warn!("⚠ Classifier artifact not found - predictions will return 503");
    }

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 stock-advisor server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                              - Health check");
    tracing::info!("  GET  /api/stock/risk/{{ticker}}             - Risk profile");
    tracing::info!("  GET  /api/stock/recommendation/{{ticker}}   - Risk-tier stance");
    tracing::info!("  GET  /api/stock/predict/{{ticker}}          - Direction prediction");
    tracing::info!("  GET  /api/stock/history/{{ticker}}          - Price history");
    tracing::info!("  GET  /api/stock/news/{{ticker}}             - Labeled news");
    tracing::info!("  GET  /api/sentiment/analyze?text=         - Text sentiment");
    tracing::info!("  POST /api/users                           - Register user");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
