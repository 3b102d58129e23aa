//! Image reduction.
//!
//! Captions an uploaded image with the vision-capable inference service.

use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Arc;

use intentlens_core::{
    traits::InferenceClient,
    types::{Modality, UploadedMedia},
    Result,
};

use crate::reduction::{reduce_with_instruction, ModalityReducer};

/// Fixed captioning instruction.
pub const IMAGE_INSTRUCTION: &str = "Describe this image in detail.";

/// Reducer for `image/*` uploads.
pub struct ImageReducer {
    /// Inference client (must accept inline media).
    llm: Arc<dyn InferenceClient>,
}

impl ImageReducer {
    pub fn new(llm: Arc<dyn InferenceClient>) -> Self {
        Self { llm }
    }

    /// Read format and dimensions from the image header.
    ///
    /// Only the header is decoded. Returns `None` when the bytes are not
    /// a format the `image` crate recognizes.
    pub fn inspect(image_data: &[u8]) -> Option<ImageInfo> {
        let reader = image::ImageReader::new(Cursor::new(image_data))
            .with_guessed_format()
            .ok()?;
        let format = reader.format().map(|f| format!("{:?}", f))?;
        let (width, height) = reader.into_dimensions().ok()?;

        Some(ImageInfo {
            width,
            height,
            format,
            size_bytes: image_data.len(),
        })
    }
}

#[async_trait]
impl ModalityReducer for ImageReducer {
    fn modality(&self) -> Modality {
        Modality::Image
    }

    async fn reduce(&self, media: &UploadedMedia) -> Result<String> {
        match Self::inspect(&media.data) {
            Some(info) => tracing::info!(
                width = info.width,
                height = info.height,
                format = %info.format,
                size = info.size_bytes,
                "Captioning image"
            ),
            // Not fatal: the payload is still sent as declared.
            None => tracing::info!(
                mime_type = %media.mime_type,
                size = media.size(),
                "Captioning image with unrecognized header"
            ),
        }

        reduce_with_instruction(self.llm.as_ref(), Modality::Image, IMAGE_INSTRUCTION, media).await
    }
}

/// Information about an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Detected image format (Png, Jpeg, etc.).
    pub format: String,
    /// Size in bytes.
    pub size_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use intentlens_core::mocks::{CallKind, Reply, ScriptedInference};
    use intentlens_core::Error;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::new(3, 2);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_inspect_reads_header() {
        let info = ImageReducer::inspect(&tiny_png()).unwrap();
        assert_eq!((info.width, info.height), (3, 2));
        assert_eq!(info.format, "Png");
    }

    #[test]
    fn test_inspect_unknown_bytes() {
        assert!(ImageReducer::inspect(b"definitely not an image").is_none());
    }

    #[tokio::test]
    async fn test_reduce_sends_caption_instruction() {
        let client = Arc::new(ScriptedInference::new().with_media_reply(Reply::text("A small black square.")));
        let reducer = ImageReducer::new(client.clone());

        let media = UploadedMedia::new("image/png", tiny_png());
        let text = reducer.reduce(&media).await.unwrap();
        assert_eq!(text, "A small black square.");

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::Media);
        assert_eq!(calls[0].prompt, IMAGE_INSTRUCTION);
        assert_eq!(calls[0].mime_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_reduce_failure_keeps_cause() {
        let client = Arc::new(ScriptedInference::new().with_media_reply(Reply::fail("quota exceeded")));
        let reducer = ImageReducer::new(client.clone());

        let err = reducer
            .reduce(&UploadedMedia::new("image/jpeg", vec![0u8; 16]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReductionFailed { .. }));
        assert_eq!(err.to_string(), "Failed to caption image: quota exceeded");
        // No retry.
        assert_eq!(client.call_count(), 1);
    }
}
