//! Core traits for IntentLens.
//!
//! Traits are organized by the seam they sit on:
//! - `gateway`: response caching used by the ingress pipeline
//! - `llm`: the external inference service

pub mod gateway;
pub mod llm;

pub use gateway::*;
pub use llm::*;
