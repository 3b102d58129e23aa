//! External inference service traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::types::UploadedMedia;

/// Client for the external multimodal inference service.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Generate text from a prompt plus one inline binary attachment.
    async fn generate_with_media(&self, prompt: &str, media: &UploadedMedia) -> Result<Generation>;

    /// Generate text from a prompt alone.
    async fn generate(&self, prompt: &str) -> Result<Generation>;
}

/// Text produced by one inference call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    /// Generated text.
    pub text: String,
    /// Token usage, when the service reports it.
    pub usage: Option<UsageMetadata>,
}

impl Generation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    pub fn with_total_tokens(mut self, total: u64) -> Self {
        self.usage = Some(UsageMetadata {
            total_token_count: Some(total),
            ..Default::default()
        });
        self
    }

    /// Total processed-token count, if reported.
    pub fn total_tokens(&self) -> Option<u64> {
        self.usage.as_ref().and_then(|u| u.total_token_count)
    }
}

/// Token usage reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u64>,
    pub candidates_token_count: Option<u64>,
    pub total_token_count: Option<u64>,
}
