//! Gemini inference client.
//!
//! Implements [`InferenceClient`] over the `generateContent` REST endpoint.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde_json::Value;

use intentlens_core::{
    traits::{Generation, InferenceClient},
    types::UploadedMedia,
    Error, Result,
};

use crate::config::GeminiConfig;
use crate::gemini_types::{
    ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, InlineData, Part,
};

/// HTTP client for one Gemini model.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Create a client. Fails only if the TLS backend cannot be initialized.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn send(&self, body: &GenerateContentRequest) -> Result<Generation> {
        let response = self
            .http
            .post(self.config.endpoint())
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::model_provider(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::model_provider(format!("Failed to read Gemini response: {}", e)))?;

        if !status.is_success() {
            return Err(error_from_body(status, &bytes));
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes)
            .map_err(|e| Error::model_provider(format!("Invalid Gemini response: {}", e)))?;

        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(Error::model_provider(parsed.empty_reason()));
        }

        Ok(Generation {
            text,
            usage: parsed.usage_metadata.map(Into::into),
        })
    }
}

/// Turn a non-2xx reply into a provider error, keeping the body as details.
fn error_from_body(status: StatusCode, body: &[u8]) -> Error {
    let details = serde_json::from_slice::<Value>(body).ok();
    let message = serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| {
            let status_name = env.error.status.unwrap_or_default();
            env.error.message.map(|m| {
                if status_name.is_empty() {
                    m
                } else {
                    format!("[{} {}] {}", status.as_u16(), status_name, m)
                }
            })
        })
        .unwrap_or_else(|| format!("Gemini returned HTTP {}", status));

    Error::ModelProvider { message, details }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn generate_with_media(&self, prompt: &str, media: &UploadedMedia) -> Result<Generation> {
        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            mime_type = %media.mime_type,
            size = media.size(),
            "Calling Gemini with inline media"
        );

        let body = GenerateContentRequest::user(vec![
            Part::Text {
                text: prompt.to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: media.mime_type.clone(),
                    data: BASE64.encode(&media.data),
                },
            },
        ]);
        self.send(&body).await
    }

    async fn generate(&self, prompt: &str) -> Result<Generation> {
        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Calling Gemini"
        );

        let body = GenerateContentRequest::user(vec![Part::Text {
            text: prompt.to_string(),
        }]);
        self.send(&body).await
    }
}
