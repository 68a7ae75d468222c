//! HTTP client for the audio enhancement provider.

use super::{JobStatus, OutputArtifact, ProductionApi, ProductionJob};
use crate::error::{FortellError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const PROVIDER: &str = "production";

/// Provider client over the job HTTP API, bearer-authenticated, with a
/// per-call timeout and one transport-level retry.
pub struct HttpProductionClient {
    client: reqwest::Client,
    base: Url,
    api_key: String,
}

impl HttpProductionClient {
    pub fn new(endpoint: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        // A trailing slash keeps Url::join from replacing the last path
        // segment of the configured endpoint.
        let endpoint = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let base = Url::parse(&endpoint)
            .map_err(|e| FortellError::Config(format!("invalid production endpoint: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base,
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| FortellError::Config(format!("invalid production path {path}: {e}")))
    }

    /// Send a request, retrying once on a transport-level failure, and
    /// map non-success statuses to provider errors.
    async fn send(&self, builder: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let retry = builder.try_clone();

        let response = match builder.send().await {
            Ok(r) => r,
            Err(first) => match retry {
                Some(again) => {
                    warn!("{what} transport failure ({first}), retrying once");
                    again
                        .send()
                        .await
                        .map_err(|e| FortellError::provider(PROVIDER, format!("{what}: {e}")))?
                }
                None => {
                    return Err(FortellError::provider(PROVIDER, format!("{what}: {first}")))
                }
            },
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(200).collect();
            return Err(FortellError::provider_status(
                PROVIDER,
                status.as_u16(),
                format!("{what}: {detail}"),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl ProductionApi for HttpProductionClient {
    async fn create_job(&self, title: &str) -> Result<String> {
        let url = self.url("productions")?;
        let body = serde_json::json!({ "title": title });

        let response = self
            .send(
                self.client.post(url).bearer_auth(&self.api_key).json(&body),
                "create job",
            )
            .await?;

        let created: CreateJobResponse = response.json().await?;
        debug!("Provider created job {}", created.id);
        Ok(created.id)
    }

    async fn upload_audio(&self, job_id: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let url = self.url(&format!("productions/{job_id}/upload"))?;

        self.send(
            self.client
                .post(url)
                .bearer_auth(&self.api_key)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes.to_vec()),
            "upload audio",
        )
        .await?;

        Ok(())
    }

    async fn start_job(&self, job_id: &str) -> Result<()> {
        let url = self.url(&format!("productions/{job_id}/start"))?;

        self.send(
            self.client.post(url).bearer_auth(&self.api_key),
            "start job",
        )
        .await?;

        Ok(())
    }

    async fn job_status(&self, job_id: &str) -> Result<ProductionJob> {
        let url = self.url(&format!("productions/{job_id}"))?;

        let response = self
            .send(self.client.get(url).bearer_auth(&self.api_key), "job status")
            .await?;

        let status: StatusResponse = response.json().await?;
        Ok(status.into_job())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = Url::parse(url)
            .map_err(|e| FortellError::provider(PROVIDER, format!("bad artifact url: {e}")))?;

        let response = self
            .send(
                self.client.get(parsed).bearer_auth(&self.api_key),
                "download artifact",
            )
            .await?;

        Ok(response.bytes().await?.to_vec())
    }
}

// === Wire types ===

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    id: String,
}

/// Status report as the provider sends it: numeric code and label are both
/// populated inconsistently, so both are kept and interpreted centrally by
/// [`ProductionJob::outcome`].
#[derive(Debug, Deserialize)]
struct StatusResponse {
    id: String,
    status: Option<i64>,
    status_string: Option<String>,
    error_message: Option<String>,
    #[serde(default)]
    output_files: Vec<OutputFile>,
}

#[derive(Debug, Deserialize)]
struct OutputFile {
    download_url: String,
    format: Option<String>,
}

impl StatusResponse {
    fn into_job(self) -> ProductionJob {
        ProductionJob {
            id: self.id,
            status: JobStatus::from_code(self.status),
            status_label: self.status_string.unwrap_or_default(),
            outputs: self
                .output_files
                .into_iter()
                .map(|f| OutputArtifact {
                    url: f.download_url,
                    format: f.format,
                })
                .collect(),
            error_message: self.error_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_mapping() {
        let json = r#"{
            "id": "p-42",
            "status": 3,
            "status_string": "Done",
            "output_files": [{"download_url": "https://cdn.example.com/p-42.mp3", "format": "mp3"}]
        }"#;
        let parsed: StatusResponse = serde_json::from_str(json).unwrap();
        let job = parsed.into_job();
        assert_eq!(job.id, "p-42");
        assert_eq!(job.status_label, "Done");
        assert_eq!(job.outputs.len(), 1);
        assert!(job.error_message.is_none());
    }

    #[test]
    fn test_status_response_tolerates_missing_fields() {
        let json = r#"{"id": "p-42"}"#;
        let parsed: StatusResponse = serde_json::from_str(json).unwrap();
        let job = parsed.into_job();
        assert_eq!(job.status, JobStatus::Waiting);
        assert_eq!(job.status_label, "");
        assert!(job.outputs.is_empty());
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = HttpProductionClient::new("not a url", "key", 30);
        assert!(matches!(result, Err(FortellError::Config(_))));
    }
}
