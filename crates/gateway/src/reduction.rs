//! Modality reduction: media bytes in, text out.

use async_trait::async_trait;
use std::sync::Arc;

use intentlens_core::{
    traits::InferenceClient,
    types::{Modality, UploadedMedia},
    Error, Result,
};
use intentlens_governance::track_inference;

use crate::{audio::AudioReducer, vision::ImageReducer};

/// Converts one upload into intermediate text.
#[async_trait]
pub trait ModalityReducer: Send + Sync {
    /// Modality this reducer handles.
    fn modality(&self) -> Modality;

    /// Reduce the media to text. Failures are [`Error::ReductionFailed`].
    async fn reduce(&self, media: &UploadedMedia) -> Result<String>;
}

/// Send `media` with a fixed instruction and return the produced text.
///
/// One attempt only. The service error text becomes the failure cause.
pub(crate) async fn reduce_with_instruction(
    client: &dyn InferenceClient,
    modality: Modality,
    instruction: &str,
    media: &UploadedMedia,
) -> Result<String> {
    let outcome = client.generate_with_media(instruction, media).await;
    track_inference("reduction", outcome.is_ok());

    match outcome {
        Ok(generation) if !generation.text.trim().is_empty() => Ok(generation.text),
        Ok(_) => Err(Error::reduction(
            modality,
            Error::model_provider("service returned no text"),
        )),
        Err(e) => {
            tracing::warn!(modality = %modality, error = %e, "Reduction call failed");
            Err(Error::reduction(modality, e))
        }
    }
}

/// One reducer per modality.
#[derive(Clone)]
pub struct ReducerSet {
    image: Arc<dyn ModalityReducer>,
    audio: Arc<dyn ModalityReducer>,
}

impl ReducerSet {
    /// Default image and audio reducers over one client.
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            image: Arc::new(ImageReducer::new(client.clone())),
            audio: Arc::new(AudioReducer::new(client)),
        }
    }

    /// Replace the reducer for `reducer.modality()`.
    pub fn with_reducer(mut self, reducer: Arc<dyn ModalityReducer>) -> Self {
        match reducer.modality() {
            Modality::Image => self.image = reducer,
            Modality::Audio => self.audio = reducer,
        }
        self
    }

    pub fn for_modality(&self, modality: Modality) -> &Arc<dyn ModalityReducer> {
        match modality {
            Modality::Image => &self.image,
            Modality::Audio => &self.audio,
        }
    }
}
