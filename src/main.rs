#![deny(unused)]
//! IntentLens - intent-driven media understanding
//!
//! Accepts one image or audio upload plus an intent, reduces the media to
//! text with Gemini, and runs a two-stage reasoning chain over it.

use std::sync::Arc;

use intentlens_core::config::AppConfig;
use intentlens_gateway::{GatewayConfig, GatewayServer, LruResponseCache, MediaPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {}", e);
        }
    }

    let config = AppConfig::load()?;

    // Initialize tracing
    intentlens_governance::configure_tracing(&config.governance)?;

    tracing::info!("Starting IntentLens v{}", env!("CARGO_PKG_VERSION"));

    if !config.has_api_key() {
        tracing::error!("GEMINI_API_KEY is not set; refusing to start");
        anyhow::bail!("GEMINI_API_KEY is required");
    }

    // =========================================================================
    // Inference client
    // =========================================================================
    let client = Arc::new(intentlens_model_gateway::create_default_client(&config)?);

    // =========================================================================
    // Pipeline
    // =========================================================================
    let cache = Arc::new(LruResponseCache::new(config.cache.capacity));
    tracing::info!(capacity = config.cache.capacity, "Response cache initialized");

    let pipeline = Arc::new(MediaPipeline::new(client, cache));

    // =========================================================================
    // Observability & Gateway
    // =========================================================================
    let metrics_handle = intentlens_governance::setup_metrics_recorder()?;

    let gateway_config = GatewayConfig::from(&config.server);
    tracing::info!(
        host = %gateway_config.host,
        port = gateway_config.port,
        max_upload_bytes = gateway_config.max_upload_bytes,
        "Gateway initialized"
    );

    GatewayServer::new(gateway_config, pipeline)
        .with_metrics(metrics_handle)
        .run()
        .await?;

    Ok(())
}
