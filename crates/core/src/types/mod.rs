//! Core type definitions for IntentLens.
//!
//! Broken down into submodules by pipeline stage.

pub mod intent;
pub mod media;
pub mod pipeline;

pub use intent::*;
pub use media::*;
pub use pipeline::*;
