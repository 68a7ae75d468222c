//! Clean command - enhance a recording through the production provider.

use super::load_asset;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

pub async fn run_clean(file: &str, output: &str, settings: Settings) -> anyhow::Result<()> {
    let asset = load_asset(file).await?;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Running audio enhancement (this can take a few minutes)...");
    let outcome = orchestrator.clean_audio(&asset).await;
    spinner.finish_and_clear();

    let outcome = outcome?;

    tokio::fs::write(output, &outcome.bytes).await?;

    Output::success(&format!(
        "Wrote {} enhanced bytes to {output}",
        outcome.bytes.len()
    ));
    Output::kv("Production", &outcome.production_id);
    Output::kv("Took", &format!("{}ms", outcome.total_ms));

    Ok(())
}
