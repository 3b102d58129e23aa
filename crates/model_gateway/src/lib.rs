#![deny(unused)]
//! Model gateway for IntentLens.
//!
//! This crate provides the client for the external multimodal
//! inference service (Gemini `generateContent`).

pub mod config;
pub mod gemini_client;
pub mod gemini_types;

pub use config::GeminiConfig;
pub use gemini_client::GeminiClient;

use intentlens_core::config::AppConfig;

/// Create the inference client from application configuration.
///
/// Fails when no API key is configured.
pub fn create_default_client(config: &AppConfig) -> intentlens_core::Result<GeminiClient> {
    let gemini = GeminiConfig::from_app_config(&config.model_gateway)?;
    tracing::info!(
        model = %gemini.model,
        api_base = %gemini.api_base,
        "Gemini client configured"
    );
    GeminiClient::new(gemini)
}
