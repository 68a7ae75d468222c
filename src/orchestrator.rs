//! Pipeline orchestrator for Fortell.
//!
//! Holds the process-wide provider registry, built once at startup and
//! injected into every request pipeline. All three request flows live here:
//! story transcription, audio cleanup, and pipeline comparison.

use crate::audio::{AudioAsset, AudioStaging};
use crate::comparison::{settle_all_with_timeout, ComparisonEntry, PathReport, PipelinePath};
use crate::config::{Prompts, Settings};
use crate::cost::estimate_cost_usd;
use crate::enrichment::{ChatModel, EnrichmentChain, LessonOptions, StorySource};
use crate::error::{FortellError, Result};
use crate::openai::OpenAiChat;
use crate::production::{CleanupOrchestrator, HttpProductionClient, ProductionApi};
use crate::transcription::{SpeechTranscriber, Transcriber, WhisperTranscriber};
use futures::FutureExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// The main orchestrator for the Fortell pipelines.
pub struct Orchestrator {
    settings: Settings,
    staging: AudioStaging,
    primary: Arc<dyn Transcriber>,
    secondary: Arc<dyn Transcriber>,
    enrichment: Arc<EnrichmentChain>,
    cleanup: CleanupOrchestrator,
    production_configured: bool,
}

impl Orchestrator {
    /// Create an orchestrator with production clients from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let chat: Arc<dyn ChatModel> = Arc::new(OpenAiChat::new(Duration::from_secs(
            settings.enrichment.request_timeout_secs,
        )));

        let primary: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::new(
            &settings.transcription.primary_model,
            settings.transcription.language.as_deref(),
            settings.transcription.request_timeout_secs,
        ));
        let secondary: Arc<dyn Transcriber> = Arc::new(SpeechTranscriber::new(
            &settings.transcription.secondary_model,
            settings.transcription.request_timeout_secs,
        ));

        let api_key = settings.production.resolve_api_key();
        let production: Arc<dyn ProductionApi> = Arc::new(HttpProductionClient::new(
            &settings.production.endpoint,
            api_key.as_deref().unwrap_or_default(),
            settings.production.request_timeout_secs,
        )?);
        let production_configured = api_key.is_some();

        Self::with_components(
            settings,
            prompts,
            chat,
            primary,
            secondary,
            production,
            production_configured,
        )
    }

    /// Create an orchestrator with substitute components (used by tests).
    #[allow(clippy::too_many_arguments)]
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        chat: Arc<dyn ChatModel>,
        primary: Arc<dyn Transcriber>,
        secondary: Arc<dyn Transcriber>,
        production: Arc<dyn ProductionApi>,
        production_configured: bool,
    ) -> Result<Self> {
        let staging = AudioStaging::new(settings.temp_dir())?;
        let enrichment = Arc::new(EnrichmentChain::new(chat, &prompts, &settings.enrichment));
        let cleanup = CleanupOrchestrator::new(
            production,
            Duration::from_secs(settings.production.poll_interval_secs),
            settings.production.poll_max_attempts,
        );

        Ok(Self {
            settings,
            staging,
            primary,
            secondary,
            enrichment,
            cleanup,
            production_configured,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Full story pipeline: stage, transcribe, sanitize, enrich.
    ///
    /// Transcription failure is fatal; enrichment failures are absorbed
    /// into fallbacks so the caller always gets a usable transcript. The
    /// staged file is released on every exit path.
    #[instrument(skip_all, fields(bytes = asset.byte_len, content_type = %asset.content_type))]
    pub async fn tell_story(&self, asset: &AudioAsset) -> Result<StoryOutcome> {
        asset.validate(self.settings.transcription.max_audio_bytes)?;
        let total_start = Instant::now();

        let staged = self.staging.stage(asset).await?;
        let transcription = self.primary.transcribe(staged.path()).await?;
        drop(staged);

        info!(
            "Transcribed {} words via {} in {}ms",
            transcription.word_count(),
            transcription.provider_id,
            transcription.latency_ms
        );

        let enrich_start = Instant::now();
        let story = self.enrichment.enrich(&transcription.raw_text).await;
        let enrichment_ms = enrich_start.elapsed().as_millis() as u64;

        Ok(StoryOutcome {
            transcription: story.formatted_text,
            lesson_options: story.lesson_options,
            source: story.source,
            duration_minutes: asset.estimated_minutes,
            provider: transcription.provider_id,
            confidence: transcription.confidence,
            transcription_ms: transcription.latency_ms,
            enrichment_ms,
            total_ms: total_start.elapsed().as_millis() as u64,
        })
    }

    /// Audio cleanup pipeline: stage, then drive the enhancement job state
    /// machine to a terminal state and return the enhanced bytes.
    #[instrument(skip_all, fields(bytes = asset.byte_len))]
    pub async fn clean_audio(&self, asset: &AudioAsset) -> Result<CleanOutcome> {
        asset.validate(self.settings.transcription.max_audio_bytes)?;
        if !self.production_configured {
            return Err(FortellError::Config(
                "production API key not configured (set PRODUCTION_API_KEY or [production] api_key)"
                    .into(),
            ));
        }
        let total_start = Instant::now();

        let staged = self.staging.stage(asset).await?;
        let bytes = tokio::fs::read(staged.path()).await?;
        let title = format!("fortell-{}", chrono::Utc::now().format("%Y%m%dT%H%M%SZ"));
        let cleaned = self
            .cleanup
            .run(&title, &bytes, &asset.content_type)
            .await?;
        drop(staged);

        Ok(CleanOutcome {
            bytes: cleaned.bytes,
            production_id: cleaned.production_id,
            total_ms: total_start.elapsed().as_millis() as u64,
        })
    }

    /// Run every transcription adapter through its own full pipeline and
    /// settle all of them for a side-by-side report.
    #[instrument(skip_all, fields(bytes = asset.byte_len))]
    pub async fn compare(&self, asset: &AudioAsset) -> Result<Vec<PipelinePath>> {
        asset.validate(self.settings.transcription.max_audio_bytes)?;

        let adapters: Vec<Arc<dyn Transcriber>> =
            vec![self.primary.clone(), self.secondary.clone()];

        let entries: Vec<ComparisonEntry<'_>> = adapters
            .into_iter()
            .map(|transcriber| {
                let name = transcriber.provider_id().to_string();
                let estimated_cost_usd = estimate_cost_usd(transcriber.provider_id(), asset.byte_len);
                // Each pipeline stages and owns its own copy of the audio.
                let pipeline = self.run_path(transcriber, asset.clone()).boxed();
                ComparisonEntry {
                    name,
                    estimated_cost_usd,
                    pipeline,
                }
            })
            .collect();

        Ok(settle_all_with_timeout(
            entries,
            Duration::from_secs(self.settings.comparison.pipeline_timeout_secs),
        )
        .await)
    }

    /// One comparison pipeline: stage, transcribe, enrich, measure.
    async fn run_path(
        &self,
        transcriber: Arc<dyn Transcriber>,
        asset: AudioAsset,
    ) -> Result<PathReport> {
        let total_start = Instant::now();

        let staged = self.staging.stage(&asset).await?;
        let transcription = transcriber.transcribe(staged.path()).await?;
        drop(staged);

        let enrich_start = Instant::now();
        let _story = self.enrichment.enrich(&transcription.raw_text).await;
        let enrichment_ms = enrich_start.elapsed().as_millis() as u64;

        Ok(PathReport {
            transcription_ms: transcription.latency_ms,
            enrichment_ms,
            total_ms: total_start.elapsed().as_millis() as u64,
            confidence: transcription.confidence,
            word_count: transcription.word_count(),
        })
    }
}

/// Result of the story pipeline.
#[derive(Debug)]
pub struct StoryOutcome {
    /// Formatted story text (or fallback per the enrichment rules).
    pub transcription: String,
    pub lesson_options: LessonOptions,
    pub source: StorySource,
    /// Duration estimate in minutes, from byte size.
    pub duration_minutes: f64,
    pub provider: &'static str,
    pub confidence: Option<f32>,
    pub transcription_ms: u64,
    pub enrichment_ms: u64,
    pub total_ms: u64,
}

/// Result of the cleanup pipeline.
#[derive(Debug)]
pub struct CleanOutcome {
    pub bytes: Vec<u8>,
    pub production_id: String,
    pub total_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::tests::StubChat;
    use crate::production::{JobStatus, OutputArtifact, ProductionJob};
    use crate::transcription::TranscriptionResult;
    use async_trait::async_trait;
    use std::path::Path;

    struct StubTranscriber {
        id: &'static str,
        text: std::result::Result<String, String>,
    }

    impl StubTranscriber {
        fn ok(text: &str) -> Self {
            Self {
                id: "whisper",
                text: Ok(text.to_string()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                id: "whisper",
                text: Err(message.to_string()),
            }
        }
    }

    #[async_trait]
    impl Transcriber for StubTranscriber {
        fn provider_id(&self) -> &'static str {
            self.id
        }

        async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionResult> {
            // The staged file must exist while the provider reads it.
            let bytes = tokio::fs::read(audio_path).await?;
            assert!(!bytes.is_empty());
            match &self.text {
                Ok(text) => Ok(TranscriptionResult {
                    raw_text: text.clone(),
                    confidence: Some(0.92),
                    provider_id: self.id,
                    latency_ms: 7,
                }),
                Err(msg) => Err(FortellError::provider(self.id, msg.clone())),
            }
        }
    }

    struct StubProduction;

    #[async_trait]
    impl ProductionApi for StubProduction {
        async fn create_job(&self, _title: &str) -> Result<String> {
            Ok("p-1".to_string())
        }
        async fn upload_audio(&self, _j: &str, _b: &[u8], _c: &str) -> Result<()> {
            Ok(())
        }
        async fn start_job(&self, _j: &str) -> Result<()> {
            Ok(())
        }
        async fn job_status(&self, _j: &str) -> Result<ProductionJob> {
            Ok(ProductionJob {
                id: "p-1".to_string(),
                status: JobStatus::Done,
                status_label: "Done".to_string(),
                outputs: vec![OutputArtifact {
                    url: "https://cdn.example.com/p-1.mp3".to_string(),
                    format: Some("mp3".to_string()),
                }],
                error_message: None,
            })
        }
        async fn download(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(vec![7, 7, 7])
        }
    }

    fn orchestrator(
        temp_dir: &Path,
        transcriber: StubTranscriber,
        chat: Arc<StubChat>,
    ) -> Orchestrator {
        let mut settings = Settings::default();
        settings.general.temp_dir = temp_dir.to_string_lossy().to_string();

        Orchestrator::with_components(
            settings,
            Prompts::default(),
            chat,
            Arc::new(transcriber),
            Arc::new(StubTranscriber {
                id: "speech",
                text: Ok("secondary transcript text".to_string()),
            }),
            Arc::new(StubProduction),
            true,
        )
        .unwrap()
    }

    fn staged_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_tell_story_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            dir.path(),
            StubTranscriber::ok("we drove all night to the coast"),
            Arc::new(StubChat::ok("We drove all night to the coast.")),
        );

        let asset = AudioAsset::new(vec![1u8; 1024], "audio/webm");
        let outcome = orch.tell_story(&asset).await.unwrap();

        assert_eq!(outcome.transcription, "We drove all night to the coast.");
        assert_eq!(outcome.provider, "whisper");
        assert_eq!(outcome.confidence, Some(0.92));
        assert_eq!(outcome.transcription_ms, 7);
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_transcription_failure_fatal_and_file_released() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            dir.path(),
            StubTranscriber::failing("service unavailable"),
            Arc::new(StubChat::ok("unused")),
        );

        let asset = AudioAsset::new(vec![1u8; 1024], "audio/webm");
        let err = orch.tell_story(&asset).await.unwrap_err();

        assert!(matches!(err, FortellError::Provider { .. }));
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_enrichment_failure_still_returns_story() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            dir.path(),
            StubTranscriber::ok("um, the the garden was full of tomatoes"),
            Arc::new(StubChat::failing("model down")),
        );

        let asset = AudioAsset::new(vec![1u8; 1024], "audio/webm");
        let outcome = orch.tell_story(&asset).await.unwrap();

        assert_eq!(outcome.source, StorySource::PrePass);
        assert_eq!(outcome.transcription, "the garden was full of tomatoes");
        assert!(!outcome.lesson_options.practical.is_empty());
    }

    #[tokio::test]
    async fn test_clean_audio_returns_enhanced_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            dir.path(),
            StubTranscriber::ok("unused"),
            Arc::new(StubChat::ok("unused")),
        );

        let asset = AudioAsset::new(vec![1u8; 64], "audio/webm");
        let outcome = orch.clean_audio(&asset).await.unwrap();

        assert_eq!(outcome.bytes, vec![7, 7, 7]);
        assert_eq!(outcome.production_id, "p-1");
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_compare_reports_both_paths() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            dir.path(),
            StubTranscriber::ok("we drove all night"),
            Arc::new(StubChat::ok("We drove all night.")),
        );

        let asset = AudioAsset::new(vec![1u8; 512 * 1024], "audio/webm");
        let paths = orch.compare(&asset).await.unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].name, "whisper");
        assert_eq!(paths[1].name, "speech");
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_oversized_audio_rejected_before_staging() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.temp_dir = dir.path().to_string_lossy().to_string();
        settings.transcription.max_audio_bytes = 10;

        let orch = Orchestrator::with_components(
            settings,
            Prompts::default(),
            Arc::new(StubChat::ok("unused")),
            Arc::new(StubTranscriber::ok("unused")),
            Arc::new(StubTranscriber {
                id: "speech",
                text: Ok("unused".to_string()),
            }),
            Arc::new(StubProduction),
            true,
        )
        .unwrap();

        let asset = AudioAsset::new(vec![1u8; 100], "audio/webm");
        let err = orch.tell_story(&asset).await.unwrap_err();
        assert!(matches!(err, FortellError::Validation(_)));
        assert_eq!(staged_files(dir.path()), 0);
    }
}
