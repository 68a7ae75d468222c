//! Side-by-side pipeline comparison.
//!
//! Runs several full transcription + enrichment pipelines concurrently and
//! normalizes every outcome into a [`PipelinePath`] record. Each pipeline
//! carries its own outer timeout, independent of the client-level timeouts
//! inside it, so a technically-alive-but-slow provider is still bounded.
//! One pipeline's outcome never blocks or fails another's. Purely
//! diagnostic; results are never persisted.

use crate::error::Result;
use futures::future::{join_all, BoxFuture};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Terminal state of one pipeline under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStatus {
    Success,
    Error,
    Timeout,
}

/// Latency breakdown for a successful pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathTiming {
    pub transcription_ms: u64,
    pub enrichment_ms: u64,
    pub total_ms: u64,
}

/// Rough quality signals for a successful pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathQuality {
    /// Provider confidence, when the provider reports one.
    pub confidence: Option<f32>,
    pub word_count: usize,
}

/// Normalized report for one pipeline, whatever its outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelinePath {
    pub name: String,
    pub status: PathStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<PathTiming>,
    /// Heuristic estimate from byte size, not a billed amount.
    pub estimated_cost_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<PathQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Measurements a pipeline produces when it completes.
#[derive(Debug, Clone)]
pub struct PathReport {
    pub transcription_ms: u64,
    pub enrichment_ms: u64,
    pub total_ms: u64,
    pub confidence: Option<f32>,
    pub word_count: usize,
}

/// One pipeline entered into a comparison run.
pub struct ComparisonEntry<'a> {
    pub name: String,
    pub estimated_cost_usd: f64,
    pub pipeline: BoxFuture<'a, Result<PathReport>>,
}

/// Settle-all-with-timeout: wait for every pipeline to reach success,
/// error, or timeout. No member's outcome affects another's.
pub async fn settle_all_with_timeout(
    entries: Vec<ComparisonEntry<'_>>,
    per_path_timeout: Duration,
) -> Vec<PipelinePath> {
    let tasks = entries.into_iter().map(|entry| async move {
        let ComparisonEntry {
            name,
            estimated_cost_usd,
            pipeline,
        } = entry;

        match tokio::time::timeout(per_path_timeout, pipeline).await {
            Ok(Ok(report)) => PipelinePath {
                name,
                status: PathStatus::Success,
                timing: Some(PathTiming {
                    transcription_ms: report.transcription_ms,
                    enrichment_ms: report.enrichment_ms,
                    total_ms: report.total_ms,
                }),
                estimated_cost_usd,
                quality: Some(PathQuality {
                    confidence: report.confidence,
                    word_count: report.word_count,
                }),
                error: None,
            },
            Ok(Err(e)) => PipelinePath {
                name,
                status: PathStatus::Error,
                timing: None,
                estimated_cost_usd,
                quality: None,
                error: Some(e.to_string()),
            },
            Err(_) => PipelinePath {
                name,
                status: PathStatus::Timeout,
                timing: None,
                estimated_cost_usd,
                quality: None,
                error: Some(format!(
                    "pipeline did not settle within {}s",
                    per_path_timeout.as_secs()
                )),
            },
        }
    });

    let results = join_all(tasks).await;
    info!(
        "Comparison settled: {}",
        results
            .iter()
            .map(|p| format!("{}={:?}", p.name, p.status))
            .collect::<Vec<_>>()
            .join(", ")
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FortellError;
    use futures::FutureExt;
    use std::time::Instant;

    fn report(ms: u64) -> PathReport {
        PathReport {
            transcription_ms: ms,
            enrichment_ms: 0,
            total_ms: ms,
            confidence: Some(0.9),
            word_count: 12,
        }
    }

    #[tokio::test]
    async fn test_fast_path_not_delayed_by_hung_path() {
        let entries = vec![
            ComparisonEntry {
                name: "fast".to_string(),
                estimated_cost_usd: 0.003,
                pipeline: async { Ok(report(5)) }.boxed(),
            },
            ComparisonEntry {
                name: "hung".to_string(),
                estimated_cost_usd: 0.003,
                pipeline: futures::future::pending().boxed(),
            },
        ];

        let started = Instant::now();
        let results = settle_all_with_timeout(entries, Duration::from_millis(100)).await;
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "fast");
        assert_eq!(results[0].status, PathStatus::Success);
        assert_eq!(results[1].name, "hung");
        assert_eq!(results[1].status, PathStatus::Timeout);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_fail_others() {
        let entries = vec![
            ComparisonEntry {
                name: "ok".to_string(),
                estimated_cost_usd: 0.0,
                pipeline: async { Ok(report(3)) }.boxed(),
            },
            ComparisonEntry {
                name: "broken".to_string(),
                estimated_cost_usd: 0.0,
                pipeline: async { Err(FortellError::provider("stub", "boom")) }.boxed(),
            },
        ];

        let results = settle_all_with_timeout(entries, Duration::from_secs(1)).await;
        assert_eq!(results[0].status, PathStatus::Success);
        assert_eq!(results[1].status, PathStatus::Error);
        assert!(results[1].error.as_deref().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_success_record_carries_timing_and_quality() {
        let entries = vec![ComparisonEntry {
            name: "only".to_string(),
            estimated_cost_usd: 0.006,
            pipeline: async { Ok(report(42)) }.boxed(),
        }];

        let results = settle_all_with_timeout(entries, Duration::from_secs(1)).await;
        let path = &results[0];
        assert_eq!(path.timing.as_ref().unwrap().transcription_ms, 42);
        assert_eq!(path.quality.as_ref().unwrap().word_count, 12);
        assert!((path.estimated_cost_usd - 0.006).abs() < 1e-12);
        assert!(path.error.is_none());
    }

    #[tokio::test]
    async fn test_timeout_status_distinct_from_error() {
        let entries = vec![ComparisonEntry {
            name: "hung".to_string(),
            estimated_cost_usd: 0.0,
            pipeline: futures::future::pending().boxed(),
        }];

        let results = settle_all_with_timeout(entries, Duration::from_millis(10)).await;
        assert_eq!(results[0].status, PathStatus::Timeout);
        assert_ne!(results[0].status, PathStatus::Error);
    }
}
