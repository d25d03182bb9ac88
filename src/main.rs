mod config;
mod error;
mod handlers;
mod models;
mod services;
#[cfg(feature = "web-server")]
mod server;

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;

use config::Config;
use handlers::FoodAnalyzer;
use services::GeminiService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables first so RUST_LOG from .env applies
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("🚀 Starting Food Lens...");

    let config = Config::from_env().context("Refusing to start")?;

    let gemini = Arc::new(GeminiService::new(config.gemini.clone())?);
    log::info!("✅ Gemini service initialized with model: {}", config.gemini.model);

    let analyzer = Arc::new(FoodAnalyzer::new(gemini, config.max_dimension));
    log::info!("✅ Food analyzer ready (max image dimension: {}px)", config.max_dimension);

    serve(analyzer, &config).await
}

#[cfg(feature = "web-server")]
async fn serve(analyzer: Arc<FoodAnalyzer>, config: &Config) -> Result<()> {
    let app = server::create_router(analyzer, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    log::info!("🌐 Server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("Server error")?;

    log::info!("🛑 Shutting down...");
    Ok(())
}

#[cfg(not(feature = "web-server"))]
async fn serve(_analyzer: Arc<FoodAnalyzer>, _config: &Config) -> Result<()> {
    anyhow::bail!("built without the `web-server` feature; nothing to serve")
}
