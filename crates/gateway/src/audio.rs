//! Audio reduction.
//!
//! Transcribes an uploaded recording with the inference service.

use async_trait::async_trait;
use std::sync::Arc;

use intentlens_core::{
    traits::InferenceClient,
    types::{Modality, UploadedMedia},
    Result,
};

use crate::reduction::{reduce_with_instruction, ModalityReducer};

/// Fixed transcription instruction.
pub const AUDIO_INSTRUCTION: &str = "Transcribe this audio file exactly as spoken.";

/// Audio containers recognizable from their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Ogg,
    Mp3,
    Flac,
    Webm,
    Mp4,
}

impl AudioFormat {
    /// Canonical MIME type for this container.
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Webm => "audio/webm",
            AudioFormat::Mp4 => "audio/mp4",
        }
    }

    /// Detect the container from magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WAVE" {
            return Some(AudioFormat::Wav);
        }
        if data.starts_with(b"OggS") {
            return Some(AudioFormat::Ogg);
        }
        if data.starts_with(b"fLaC") {
            return Some(AudioFormat::Flac);
        }
        // ID3v2 tag or a bare MPEG frame sync.
        if data.starts_with(b"ID3") || (data[0] == 0xFF && data[1] & 0xE0 == 0xE0) {
            return Some(AudioFormat::Mp3);
        }
        if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            return Some(AudioFormat::Webm);
        }
        if data.len() >= 8 && &data[4..8] == b"ftyp" {
            return Some(AudioFormat::Mp4);
        }

        None
    }
}

/// Reducer for `audio/*` uploads.
pub struct AudioReducer {
    llm: Arc<dyn InferenceClient>,
}

impl AudioReducer {
    pub fn new(llm: Arc<dyn InferenceClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ModalityReducer for AudioReducer {
    fn modality(&self) -> Modality {
        Modality::Audio
    }

    async fn reduce(&self, media: &UploadedMedia) -> Result<String> {
        let detected = AudioFormat::detect(&media.data);
        if let Some(format) = detected {
            if format.mime_type() != media.mime_type {
                tracing::debug!(
                    declared = %media.mime_type,
                    detected = format.mime_type(),
                    "Declared audio type differs from container"
                );
            }
        }

        tracing::info!(
            format = ?detected,
            size = media.size(),
            "Transcribing audio"
        );

        reduce_with_instruction(self.llm.as_ref(), Modality::Audio, AUDIO_INSTRUCTION, media).await
    }
}
