//! Audio input handling for Fortell.
//!
//! An [`AudioAsset`] is the in-memory form of one uploaded recording. It is
//! owned exclusively by the request that created it and never outlives it.

mod staging;

pub use staging::{AudioStaging, StagedAudio};

use crate::cost::estimate_duration_minutes;
use crate::error::{FortellError, Result};

/// One uploaded audio recording, ephemeral and request-scoped.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    /// Raw audio bytes as received.
    pub bytes: Vec<u8>,
    /// Content-type hint from the caller (e.g. "audio/webm").
    pub content_type: String,
    /// Byte length of the recording.
    pub byte_len: usize,
    /// Duration estimate in minutes, derived from byte size.
    pub estimated_minutes: f64,
}

impl AudioAsset {
    /// Create an asset from raw bytes, deriving size and duration estimate.
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        let byte_len = bytes.len();
        Self {
            bytes,
            content_type: content_type.into(),
            byte_len,
            estimated_minutes: estimate_duration_minutes(byte_len),
        }
    }

    /// Validate the asset against size limits before any expensive work.
    pub fn validate(&self, max_bytes: usize) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(FortellError::Validation("audio payload is empty".into()));
        }
        if self.byte_len > max_bytes {
            return Err(FortellError::Validation(format!(
                "audio payload of {} bytes exceeds maximum of {} bytes",
                self.byte_len, max_bytes
            )));
        }
        Ok(())
    }

    /// File extension matching the content-type hint, for staged filenames.
    pub fn file_extension(&self) -> &'static str {
        extension_for(&self.content_type)
    }

    /// A filename to present to transcription providers.
    pub fn provider_filename(&self) -> String {
        format!("audio.{}", self.file_extension())
    }
}

/// Guess a MIME content type from a file path's extension, for CLI inputs.
pub fn guess_content_type(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "audio/webm",
    }
}

/// Map a MIME content type to a filename extension. Unknown types fall back
/// to webm, the format browsers record in.
fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    match essence {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        "audio/ogg" | "application/ogg" => "ogg",
        "audio/flac" | "audio/x-flac" => "flac",
        _ => "webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_derives_estimates() {
        let asset = AudioAsset::new(vec![0u8; 512 * 1024], "audio/webm");
        assert_eq!(asset.byte_len, 512 * 1024);
        assert!((asset.estimated_minutes - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_empty_audio_rejected() {
        let asset = AudioAsset::new(Vec::new(), "audio/webm");
        assert!(matches!(
            asset.validate(1024),
            Err(FortellError::Validation(_))
        ));
    }

    #[test]
    fn test_oversized_audio_rejected() {
        let asset = AudioAsset::new(vec![0u8; 2048], "audio/webm");
        assert!(matches!(
            asset.validate(1024),
            Err(FortellError::Validation(_))
        ));
        assert!(asset.validate(4096).is_ok());
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for("audio/mpeg"), "mp3");
        assert_eq!(extension_for("audio/wav"), "wav");
        assert_eq!(extension_for("audio/webm;codecs=opus"), "webm");
        assert_eq!(extension_for("application/octet-stream"), "webm");
    }
}
