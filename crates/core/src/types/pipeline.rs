use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::{intent::Intent, media::Modality};

// =============================================================================
// Pipeline Types
// =============================================================================

/// Deterministic cache key for a (modality, intent, intermediate text) triple.
///
/// Each component is length-prefixed before hashing, so no choice of
/// embedded delimiter can make two different triples collide on input.
/// No case or whitespace normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(modality: Modality, intent: &Intent, intermediate_text: &str) -> Self {
        let mut hasher = Sha256::new();
        for part in [modality.as_str(), intent.as_str(), intermediate_text] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored result of one full reasoning run. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub result: String,
    pub token_estimate: u64,
    pub intermediate_text: String,
}

/// Response payload for one processed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub result: String,
    pub token_estimate: u64,
    pub latency_ms: u64,
    pub intermediate_text: String,
    pub cached: bool,
}

/// Stage of the two-step reasoning chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningStage {
    Analysis,
    Synthesis,
}

impl ReasoningStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningStage::Analysis => "analysis",
            ReasoningStage::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for ReasoningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
