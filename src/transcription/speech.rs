//! Secondary transcription adapter backed by gpt-4o-transcribe.
//!
//! Plain-text transcription without a confidence score. Shares the
//! [`Transcriber`] contract with the Whisper adapter.

use super::{Transcriber, TranscriptionResult};
use crate::error::{FortellError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Speech-model transcriber for high-accuracy text (no confidence).
pub struct SpeechTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl SpeechTranscriber {
    /// Create a new speech-model transcriber.
    pub fn new(model: &str, timeout_secs: u64) -> Self {
        Self {
            client: create_client_with_timeout(Duration::from_secs(timeout_secs)),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for SpeechTranscriber {
    fn provider_id(&self) -> &'static str {
        "speech"
    }

    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionResult> {
        debug!("Transcribing audio with {}", self.model);

        let file_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.webm")
            .to_string();

        let request = CreateTranscriptionRequestArgs::default()
            .file(async_openai::types::AudioInput::from_vec_u8(
                file_name, file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json)
            .build()
            .map_err(|e| {
                FortellError::provider(self.model.clone(), format!("Failed to build request: {e}"))
            })?;

        let started = Instant::now();
        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| {
                FortellError::provider(self.model.clone(), format!("{} API error: {e}", self.model))
            })?;
        let latency_ms = started.elapsed().as_millis() as u64;

        debug!(
            "Speech transcription complete in {}ms ({} chars)",
            latency_ms,
            response.text.len()
        );

        Ok(TranscriptionResult {
            raw_text: response.text.trim().to_string(),
            confidence: None,
            provider_id: self.provider_id(),
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_confidence_in_contract() {
        let transcriber = SpeechTranscriber::new("gpt-4o-transcribe", 120);
        assert_eq!(transcriber.provider_id(), "speech");
    }
}
