//! Error types for IntentLens.

use serde_json::Value;
use thiserror::Error;

use crate::types::{Modality, ReasoningStage};

/// Result type alias using IntentLens's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for IntentLens.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Validation Errors (Ingress)
    // =========================================================================
    #[error("No file uploaded.")]
    MissingFile,

    #[error("Intent is required.")]
    MissingIntent,

    #[error("Unsupported file type '{0}'. Please upload Image or Audio.")]
    UnsupportedModality(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("File too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    // =========================================================================
    // Pipeline Errors
    // =========================================================================
    #[error("{}: {cause}", reduction_label(.modality))]
    ReductionFailed {
        modality: Modality,
        cause: String,
        details: Option<Value>,
    },

    #[error("Reasoning failed: {cause}")]
    ReasoningFailed {
        stage: ReasoningStage,
        cause: String,
        details: Option<Value>,
    },

    #[error("Response cache error: {0}")]
    Cache(String),

    // =========================================================================
    // Model Gateway Errors
    // =========================================================================
    #[error("{message}")]
    ModelProvider {
        message: String,
        details: Option<Value>,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn reduction_label(modality: &Modality) -> &'static str {
    match modality {
        Modality::Image => "Failed to caption image",
        Modality::Audio => "Failed to transcribe audio",
    }
}

impl Error {
    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a model provider error without a service body.
    pub fn model_provider(msg: impl Into<String>) -> Self {
        Self::ModelProvider {
            message: msg.into(),
            details: None,
        }
    }

    /// Create a gateway error.
    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::Gateway(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Wrap a downstream failure as a reduction failure for `modality`.
    ///
    /// The cause text is kept verbatim and service details are carried over.
    pub fn reduction(modality: Modality, source: Error) -> Self {
        let details = source.details().cloned();
        Self::ReductionFailed {
            modality,
            cause: source.to_string(),
            details,
        }
    }

    /// Wrap a downstream failure as a reasoning failure at `stage`.
    pub fn reasoning(stage: ReasoningStage, source: Error) -> Self {
        let details = source.details().cloned();
        Self::ReasoningFailed {
            stage,
            cause: source.to_string(),
            details,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MissingFile
            | Error::MissingIntent
            | Error::UnsupportedModality(_)
            | Error::InvalidRequest(_) => 400,
            Error::PayloadTooLarge { .. } => 413,
            _ => 500,
        }
    }

    /// Whether the request was rejected before any external call.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Service-provided error body, if any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Error::ReductionFailed { details, .. }
            | Error::ReasoningFailed { details, .. }
            | Error::ModelProvider { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    /// Short machine-readable code, used as a metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingFile => "missing_file",
            Error::MissingIntent => "missing_intent",
            Error::UnsupportedModality(_) => "unsupported_modality",
            Error::InvalidRequest(_) => "invalid_request",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::ReductionFailed { .. } => "reduction_failed",
            Error::ReasoningFailed { .. } => "reasoning_failed",
            Error::Cache(_) => "cache",
            Error::ModelProvider { .. } => "model_provider",
            Error::Gateway(_) => "gateway",
            Error::Config(_) => "config",
            Error::Serialization(_) | Error::Internal(_) | Error::Other(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::MissingFile.status_code(), 400);
        assert_eq!(Error::MissingIntent.status_code(), 400);
        assert_eq!(Error::UnsupportedModality("application/pdf".into()).status_code(), 400);
        assert_eq!(Error::PayloadTooLarge { limit: 10 }.status_code(), 413);
        assert_eq!(Error::internal("boom").status_code(), 500);
        assert!(Error::MissingFile.is_client_error());
        assert!(!Error::model_provider("x").is_client_error());
    }

    #[test]
    fn test_reduction_wraps_cause_verbatim() {
        let source = Error::ModelProvider {
            message: "API key not valid".into(),
            details: Some(json!({"error": {"code": 400}})),
        };
        let err = Error::reduction(Modality::Image, source);
        assert_eq!(err.to_string(), "Failed to caption image: API key not valid");
        assert_eq!(err.details().unwrap()["error"]["code"], 400);
        assert_eq!(err.status_code(), 500);

        let err = Error::reduction(Modality::Audio, Error::model_provider("quota"));
        assert_eq!(err.to_string(), "Failed to transcribe audio: quota");
        assert!(err.details().is_none());
    }

    #[test]
    fn test_reasoning_keeps_stage() {
        let err = Error::reasoning(ReasoningStage::Synthesis, Error::model_provider("overloaded"));
        assert_eq!(err.to_string(), "Reasoning failed: overloaded");
        assert!(matches!(
            err,
            Error::ReasoningFailed { stage: ReasoningStage::Synthesis, .. }
        ));
        assert_eq!(err.code(), "reasoning_failed");
    }
}
