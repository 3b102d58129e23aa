//! Response composition and token accounting.

use std::time::Duration;

use intentlens_core::{
    traits::Generation,
    types::{CacheEntry, PipelineResult},
};

/// Rough token count for `text`: one token per four bytes, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64).div_ceil(4)
}

/// Token estimate for a synthesis answer.
///
/// Uses the service's reported total when present, otherwise estimates
/// from the answer text.
pub fn token_estimate(answer: &Generation) -> u64 {
    answer
        .total_tokens()
        .unwrap_or_else(|| estimate_tokens(&answer.text))
}

/// Build the response payload from a cache entry.
pub fn compose(entry: CacheEntry, elapsed: Duration, cached: bool) -> PipelineResult {
    PipelineResult {
        result: entry.result,
        token_estimate: entry.token_estimate,
        latency_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        intermediate_text: entry.intermediate_text,
        cached,
    }
}
