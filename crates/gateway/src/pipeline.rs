//! Ingress pipeline.
//!
//! Validates one upload and intent, reduces the media to text, resolves the
//! fingerprint through the response cache (coalescing concurrent identical
//! requests), and composes the response payload.

use std::sync::Arc;
use tokio::time::Instant;

use intentlens_core::{
    traits::{InferenceClient, ResponseCache},
    types::{CacheEntry, Fingerprint, Intent, PipelineResult, UploadedMedia},
    Error, Result,
};
use intentlens_governance::{track_cache, track_tokens, CacheOutcome};

use crate::composer::{compose, token_estimate};
use crate::reasoning::{ReasoningChain, ReasoningInput, StageFailure};
use crate::reduction::ReducerSet;
use crate::single_flight::{Flight, InFlightRegistry};

/// One inbound request as parsed by the transport.
#[derive(Debug, Clone, Default)]
pub struct ProcessRequest {
    pub file: Option<UploadedMedia>,
    pub intent: Option<String>,
}

impl ProcessRequest {
    pub fn new(file: UploadedMedia, intent: impl Into<String>) -> Self {
        Self {
            file: Some(file),
            intent: Some(intent.into()),
        }
    }
}

/// The request pipeline shared by all handlers.
pub struct MediaPipeline {
    reducers: ReducerSet,
    chain: ReasoningChain,
    cache: Arc<dyn ResponseCache>,
    flights: InFlightRegistry,
}

impl MediaPipeline {
    /// Pipeline with the default reducers over `client`.
    pub fn new(client: Arc<dyn InferenceClient>, cache: Arc<dyn ResponseCache>) -> Self {
        Self {
            reducers: ReducerSet::new(client.clone()),
            chain: ReasoningChain::new(client),
            cache,
            flights: InFlightRegistry::new(),
        }
    }

    /// Replace the reducer set.
    pub fn with_reducers(mut self, reducers: ReducerSet) -> Self {
        self.reducers = reducers;
        self
    }

    /// Number of fingerprints currently being computed.
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }

    /// Process one request end to end.
    ///
    /// Validation failures return before any inference call. Reduction
    /// always runs, since the fingerprint covers the reduced text.
    pub async fn process(&self, request: ProcessRequest) -> Result<PipelineResult> {
        let started = Instant::now();

        let media = request.file.ok_or(Error::MissingFile)?;
        let intent = match request.intent {
            Some(raw) if !raw.is_empty() => Intent::new(raw),
            _ => return Err(Error::MissingIntent),
        };
        let modality = media.modality()?;

        tracing::info!(
            modality = %modality,
            intent = %intent,
            size = media.size(),
            "Processing upload"
        );

        let intermediate_text = self.reducers.for_modality(modality).reduce(&media).await?;
        let fingerprint = Fingerprint::compute(modality, &intent, &intermediate_text);

        let input = ReasoningInput {
            modality,
            intermediate_text: &intermediate_text,
            intent: &intent,
        };
        let (entry, outcome) = self.resolve(&fingerprint, input).await?;
        track_cache(outcome);

        let result = compose(entry, started.elapsed(), outcome != CacheOutcome::Miss);
        tracing::info!(
            fingerprint = %fingerprint.short(),
            cached = result.cached,
            latency_ms = result.latency_ms,
            token_estimate = result.token_estimate,
            "Request completed"
        );
        Ok(result)
    }

    /// Find or compute the entry for `fingerprint`.
    async fn resolve(
        &self,
        fingerprint: &Fingerprint,
        input: ReasoningInput<'_>,
    ) -> Result<(CacheEntry, CacheOutcome)> {
        loop {
            if let Some(entry) = self.lookup(fingerprint).await {
                return Ok((entry, CacheOutcome::Hit));
            }

            match self.flights.join(fingerprint) {
                Flight::Follower(follower) => {
                    tracing::debug!(fingerprint = %fingerprint.short(), "Waiting on in-flight computation");
                    match follower.wait().await {
                        Some(Ok(entry)) => return Ok((entry, CacheOutcome::Coalesced)),
                        Some(Err(failure)) => return Err(failure.into()),
                        // Leader was cancelled before publishing.
                        None => continue,
                    }
                }
                Flight::Leader(leader) => {
                    // A previous leader may have stored the entry between
                    // our lookup and claiming the fingerprint.
                    if let Some(entry) = self.lookup(fingerprint).await {
                        leader.complete(Ok(entry.clone()));
                        return Ok((entry, CacheOutcome::Hit));
                    }

                    let outcome = self.compute(fingerprint, input).await;
                    leader.complete(outcome.clone());
                    return outcome
                        .map(|entry| (entry, CacheOutcome::Miss))
                        .map_err(Error::from);
                }
            }
        }
    }

    async fn lookup(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        match self.cache.get(fingerprint).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(fingerprint = %fingerprint.short(), error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Run the reasoning chain and store the result.
    async fn compute(
        &self,
        fingerprint: &Fingerprint,
        input: ReasoningInput<'_>,
    ) -> std::result::Result<CacheEntry, StageFailure> {
        let output = self.chain.run(input).await?;

        let entry = CacheEntry {
            token_estimate: token_estimate(&output.answer),
            result: output.answer.text,
            intermediate_text: input.intermediate_text.to_string(),
        };
        track_tokens(entry.token_estimate);

        if let Err(e) = self.cache.set(fingerprint, entry.clone()).await {
            tracing::warn!(fingerprint = %fingerprint.short(), error = %e, "Failed to store cache entry");
        }
        Ok(entry)
    }
}
