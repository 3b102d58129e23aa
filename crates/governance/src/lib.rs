#![deny(unused)]
//! Governance for IntentLens.
//!
//! This crate provides:
//! - Tracing subscriber setup (text or JSON logs)
//! - Prometheus metrics recorder and helpers

pub mod metrics;
pub mod tracing_layer;

pub use metrics::{
    setup_metrics_recorder, track_cache, track_inference, track_request, track_tokens, CacheOutcome,
};
pub use tracing_layer::configure_tracing;
