//! Primary transcription adapter backed by OpenAI Whisper.

use super::{Transcriber, TranscriptionResult};
use crate::error::{FortellError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// OpenAI Whisper-based transcriber. Returns a confidence score derived
/// from segment log-probabilities.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    language: Option<String>,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber.
    pub fn new(model: &str, language: Option<&str>, timeout_secs: u64) -> Self {
        Self {
            client: create_client_with_timeout(Duration::from_secs(timeout_secs)),
            model: model.to_string(),
            language: language.map(|s| s.to_string()),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    fn provider_id(&self) -> &'static str {
        "whisper"
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

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(async_openai::types::AudioInput::from_vec_u8(
                file_name, file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| FortellError::provider("whisper", format!("Failed to build request: {e}")))?;

        let started = Instant::now();
        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| FortellError::provider("whisper", format!("Whisper API error: {e}")))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        // Confidence: mean segment avg_logprob mapped back to a probability.
        let confidence = response.segments.as_ref().and_then(|segments| {
            if segments.is_empty() {
                return None;
            }
            let mean: f32 = segments.iter().map(|s| s.avg_logprob).sum::<f32>()
                / segments.len() as f32;
            Some(mean.exp().clamp(0.0, 1.0))
        });

        debug!(
            "Whisper transcription complete in {}ms ({} chars)",
            latency_ms,
            response.text.len()
        );

        Ok(TranscriptionResult {
            raw_text: response.text.trim().to_string(),
            confidence,
            provider_id: self.provider_id(),
            latency_ms,
        })
    }
}

/// Check if the OpenAI API key is configured.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_check() {
        // This just tests that the function works
        let _ = is_api_key_configured();
    }

    #[test]
    fn test_provider_id() {
        let transcriber = WhisperTranscriber::new("whisper-1", Some("en"), 120);
        assert_eq!(transcriber.provider_id(), "whisper");
    }
}
