//! Audio enhancement through an external asynchronous production API.
//!
//! The provider exposes a job lifecycle: create a production, upload audio,
//! start processing, poll status, download the result. There is no webhook
//! channel, so [`CleanupOrchestrator`] drives the whole state machine with a
//! bounded fixed-interval poll loop.
//!
//! Status reports carry both a numeric code and a human-readable label. The
//! provider documents the numeric code as unreliable, so terminal-success
//! detection keys on the label alone; an explicit error message wins over
//! both. Exhausting the poll budget is a [`FortellError::Timeout`], never a
//! provider error.

mod client;

pub use client::HttpProductionClient;

use crate::error::{FortellError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Status label the provider reports when a job has finished successfully.
pub const DONE_LABEL: &str = "Done";

/// Advisory job state derived from the provider's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Waiting,
    Processing,
    Done,
    Error,
}

impl JobStatus {
    /// Map the provider's numeric code. Advisory only; terminal detection
    /// uses the status label and error field instead.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => JobStatus::Waiting,
            Some(3) => JobStatus::Done,
            Some(2) => JobStatus::Error,
            Some(_) => JobStatus::Processing,
            None => JobStatus::Waiting,
        }
    }
}

/// One result artifact attached to a finished job.
#[derive(Debug, Clone, Serialize)]
pub struct OutputArtifact {
    pub url: String,
    pub format: Option<String>,
}

/// Snapshot of one production job as reported by the provider.
#[derive(Debug, Clone)]
pub struct ProductionJob {
    pub id: String,
    pub status: JobStatus,
    pub status_label: String,
    pub outputs: Vec<OutputArtifact>,
    pub error_message: Option<String>,
}

/// Tagged interpretation of a status report, applying the documented
/// precedence rule in one place instead of field-sniffing at call sites.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Status label matched the done sentinel and no error was reported.
    Done,
    /// The provider reported an explicit error message.
    Failed(String),
    /// Neither terminal signal present; keep polling.
    Pending,
}

impl ProductionJob {
    /// Interpret this report. An explicit error message wins over any
    /// status label; the label wins over the numeric code in both
    /// directions.
    pub fn outcome(&self) -> PollOutcome {
        if let Some(message) = &self.error_message {
            if !message.trim().is_empty() {
                return PollOutcome::Failed(message.clone());
            }
        }
        if self.status_label == DONE_LABEL {
            return PollOutcome::Done;
        }
        PollOutcome::Pending
    }
}

/// Seam for the enhancement provider, so the state machine can run against
/// substitute clients in tests.
#[async_trait]
pub trait ProductionApi: Send + Sync {
    /// Register a new job. Returns the provider's job id.
    async fn create_job(&self, title: &str) -> Result<String>;

    /// Attach audio bytes to a created job.
    async fn upload_audio(&self, job_id: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Begin processing an uploaded job.
    async fn start_job(&self, job_id: &str) -> Result<()>;

    /// Fetch the current status report for a job.
    async fn job_status(&self, job_id: &str) -> Result<ProductionJob>;

    /// Authenticated fetch of a result artifact.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Enhanced audio returned by a completed cleanup run.
#[derive(Debug)]
pub struct CleanedAudio {
    pub bytes: Vec<u8>,
    pub production_id: String,
}

/// Drives the create → upload → start → poll → download state machine.
pub struct CleanupOrchestrator {
    api: Arc<dyn ProductionApi>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl CleanupOrchestrator {
    pub fn new(api: Arc<dyn ProductionApi>, poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            api,
            poll_interval,
            max_attempts,
        }
    }

    /// Run the full lifecycle for one recording. Non-success in any of the
    /// create/upload/start/download steps is immediately fatal; only the
    /// poll loop tolerates lack of progress, up to its attempt budget.
    #[instrument(skip_all, fields(title = %title, bytes = bytes.len()))]
    pub async fn run(&self, title: &str, bytes: &[u8], content_type: &str) -> Result<CleanedAudio> {
        let job_id = self.api.create_job(title).await?;
        debug!("Created production job {job_id}");

        self.api.upload_audio(&job_id, bytes, content_type).await?;
        debug!("Uploaded {} bytes to job {job_id}", bytes.len());

        self.api.start_job(&job_id).await?;
        info!("Started production job {job_id}");

        let job = self.poll(&job_id).await?;

        // A job is never treated as done without a matching artifact.
        let output = job.outputs.first().ok_or_else(|| {
            FortellError::provider(
                "production",
                format!("job {job_id} reported done without an output artifact"),
            )
        })?;

        let cleaned = self.api.download(&output.url).await?;
        info!(
            "Downloaded {} enhanced bytes for job {job_id}",
            cleaned.len()
        );

        Ok(CleanedAudio {
            bytes: cleaned,
            production_id: job_id,
        })
    }

    /// Fixed-interval poll bounded by the attempt budget. Lack of progress
    /// is not failure; only an explicit error report is.
    async fn poll(&self, job_id: &str) -> Result<ProductionJob> {
        for attempt in 1..=self.max_attempts {
            let job = self.api.job_status(job_id).await?;

            match job.outcome() {
                PollOutcome::Done => {
                    debug!("Job {job_id} done after {attempt} polls");
                    return Ok(job);
                }
                PollOutcome::Failed(message) => {
                    return Err(FortellError::provider(
                        "production",
                        format!("job {job_id} failed: {message}"),
                    ));
                }
                PollOutcome::Pending => {
                    debug!(
                        "Job {job_id} still {} (poll {attempt}/{})",
                        job.status_label, self.max_attempts
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        Err(FortellError::Timeout(format!(
            "enhancement job {job_id} not finished after {} polls",
            self.max_attempts
        )))
    }
}
