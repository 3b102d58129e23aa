use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

// =============================================================================
// Media Types (Ingress)
// =============================================================================

/// A single uploaded file, held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    /// Original file name, if the client sent one.
    pub file_name: Option<String>,
    /// Declared MIME type of the payload.
    pub mime_type: String,
    /// Raw payload bytes.
    pub data: Bytes,
}

impl UploadedMedia {
    /// Create a new upload from a MIME type and payload.
    pub fn new(mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: None,
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Attach the client-supplied file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Classify this upload's modality from its declared MIME type.
    pub fn modality(&self) -> Result<Modality> {
        Modality::from_mime(&self.mime_type)
    }
}

/// Media category of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Image,
    Audio,
}

impl Modality {
    /// Derive the modality from a MIME type prefix.
    ///
    /// Only `image/` and `audio/` are accepted; anything else is
    /// [`Error::UnsupportedModality`].
    pub fn from_mime(mime_type: &str) -> Result<Self> {
        if mime_type.starts_with("image/") {
            Ok(Modality::Image)
        } else if mime_type.starts_with("audio/") {
            Ok(Modality::Audio)
        } else {
            Err(Error::UnsupportedModality(mime_type.to_string()))
        }
    }

    /// Tag used in prompts and fingerprints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Image => "image",
            Modality::Audio => "audio",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_from_mime_prefix() {
        assert_eq!(Modality::from_mime("image/jpeg").unwrap(), Modality::Image);
        assert_eq!(Modality::from_mime("image/png").unwrap(), Modality::Image);
        assert_eq!(Modality::from_mime("audio/wav").unwrap(), Modality::Audio);
        assert_eq!(Modality::from_mime("audio/mpeg").unwrap(), Modality::Audio);
    }

    #[test]
    fn test_unsupported_modality() {
        let err = Modality::from_mime("application/pdf").unwrap_err();
        assert!(matches!(err, Error::UnsupportedModality(ref m) if m == "application/pdf"));

        // Prefix match is exact; no case folding.
        assert!(Modality::from_mime("IMAGE/PNG").is_err());
        assert!(Modality::from_mime("video/mp4").is_err());
        assert!(Modality::from_mime("").is_err());
    }

    #[test]
    fn test_upload_modality() {
        let media = UploadedMedia::new("audio/ogg", vec![1u8, 2, 3]).with_file_name("clip.ogg");
        assert_eq!(media.size(), 3);
        assert_eq!(media.file_name.as_deref(), Some("clip.ogg"));
        assert_eq!(media.modality().unwrap(), Modality::Audio);
    }
}
