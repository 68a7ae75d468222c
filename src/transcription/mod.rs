//! Transcription module for Fortell.
//!
//! Converts staged audio into transcript text through one of two providers
//! sharing a single contract. The primary provider reports a confidence
//! score; the secondary does not, so confidence is optional in the result.
//! Transcription has no fallback: a failure here is fatal to the enclosing
//! request.

mod speech;
mod whisper;

pub use speech::SpeechTranscriber;
pub use whisper::{is_api_key_configured, WhisperTranscriber};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Stable identifier used in telemetry and cost estimates.
    fn provider_id(&self) -> &'static str;

    /// Transcribe a staged audio file into text.
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionResult>;
}

/// Result of one transcription call. Produced once, immutable.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    /// Transcript text exactly as the provider returned it.
    pub raw_text: String,
    /// Provider confidence in [0, 1], when the provider reports one.
    pub confidence: Option<f32>,
    /// Which provider produced this result.
    pub provider_id: &'static str,
    /// Wall-clock latency of the provider call in milliseconds.
    pub latency_ms: u64,
}

impl TranscriptionResult {
    /// Number of whitespace-separated words in the transcript.
    pub fn word_count(&self) -> usize {
        self.raw_text.split_whitespace().count()
    }
}
