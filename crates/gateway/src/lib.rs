#![deny(unused)]
//! HTTP gateway and request pipeline for IntentLens.
//!
//! This crate turns one uploaded image or audio file plus an intent into
//! an intent-conditioned answer: modality reduction, the two-stage
//! reasoning chain, the fingerprint cache, and the axum entry point.

pub mod audio;
pub mod composer;
pub mod pipeline;
pub mod reasoning;
pub mod reduction;
pub mod response_cache;
pub mod server;
pub mod single_flight;
pub mod vision;

pub use audio::{AudioFormat, AudioReducer};
pub use pipeline::{MediaPipeline, ProcessRequest};
pub use reasoning::{ChainOutput, ReasoningChain, StageFailure};
pub use reduction::{ModalityReducer, ReducerSet};
pub use response_cache::{CacheStats, LruResponseCache};
pub use server::{GatewayConfig, GatewayServer};
pub use single_flight::InFlightRegistry;
pub use vision::{ImageInfo, ImageReducer};
