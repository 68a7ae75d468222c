//! Compare command - race the transcription pipelines on one recording.

use super::load_asset;
use crate::cli::Output;
use crate::comparison::PathStatus;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use console::style;

pub async fn run_compare(file: &str, settings: Settings) -> anyhow::Result<()> {
    let asset = load_asset(file).await?;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Comparing pipelines...");
    let paths = orchestrator.compare(&asset).await;
    spinner.finish_and_clear();

    let paths = paths?;

    Output::header("Pipeline Comparison");
    println!();

    for path in &paths {
        let status = match path.status {
            PathStatus::Success => style("success").green(),
            PathStatus::Error => style("error").red(),
            PathStatus::Timeout => style("timeout").yellow(),
        };
        println!("{} {} [{}]", style(">>").cyan().bold(), style(&path.name).bold(), status);

        Output::kv("Est. cost", &format!("${:.4}", path.estimated_cost_usd));
        if let Some(timing) = &path.timing {
            Output::kv(
                "Latency",
                &format!(
                    "{}ms transcription, {}ms enrichment, {}ms total",
                    timing.transcription_ms, timing.enrichment_ms, timing.total_ms
                ),
            );
        }
        if let Some(quality) = &path.quality {
            let confidence = quality
                .confidence
                .map(|c| format!("{c:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            Output::kv(
                "Quality",
                &format!("{} words, confidence {confidence}", quality.word_count),
            );
        }
        if let Some(error) = &path.error {
            Output::kv("Error", error);
        }
        println!();
    }

    Ok(())
}
