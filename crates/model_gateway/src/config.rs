use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

use intentlens_core::{config::ModelGatewayConfig, Error, Result};

/// Connection settings for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API root, without trailing slash.
    pub api_base: String,
    /// Model id, with or without the `models/` prefix.
    pub model: String,
    /// API key sent as `x-goog-api-key`.
    pub api_key: Secret<String>,
    /// Transport timeout for one call.
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-flash-latest".to_string(),
            api_key: Secret::new(api_key.into()),
            timeout: None,
        }
    }

    /// Build from the application's model gateway section.
    ///
    /// Fails when no key is configured.
    pub fn from_app_config(config: &ModelGatewayConfig) -> Result<Self> {
        let key = config
            .gemini_api_key
            .as_ref()
            .map(|k| k.expose_secret().trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is not set".to_string()))?;

        Ok(Self {
            api_base: config.api_base.trim().trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: Secret::new(key),
            timeout: config.request_timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Full `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intentlens_core::config::AppConfig;

    #[test]
    fn test_endpoint_adds_models_prefix() {
        let cfg = GeminiConfig::new("k").with_api_base("http://localhost:9000/v1beta/");
        assert_eq!(
            cfg.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-flash-latest:generateContent"
        );

        let cfg = cfg.with_model("models/gemini-2.0-flash");
        assert_eq!(
            cfg.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_from_app_config_requires_key() {
        let mut app = AppConfig::default();
        assert!(matches!(
            GeminiConfig::from_app_config(&app.model_gateway),
            Err(Error::Config(_))
        ));

        app.model_gateway.gemini_api_key = Some(Secret::new("abc".to_string()));
        app.model_gateway.request_timeout_secs = Some(30);
        let cfg = GeminiConfig::from_app_config(&app.model_gateway).unwrap();
        assert_eq!(cfg.api_key.expose_secret(), "abc");
        assert_eq!(cfg.timeout, Some(Duration::from_secs(30)));
    }
}
