//! Transcribe command - run the full story pipeline on a local recording.

use super::load_asset;
use crate::cli::{format_minutes, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

pub async fn run_transcribe(file: &str, json: bool, settings: Settings) -> anyhow::Result<()> {
    let asset = load_asset(file).await?;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Transcribing and enriching...");
    let outcome = orchestrator.tell_story(&asset).await;
    spinner.finish_and_clear();

    let outcome = outcome?;

    if json {
        let value = serde_json::json!({
            "transcription": outcome.transcription,
            "duration": outcome.duration_minutes,
            "lessonOptions": outcome.lesson_options,
            "_meta": {
                "provider": outcome.provider,
                "source": outcome.source,
                "confidence": outcome.confidence,
                "latencies": {
                    "transcriptionMs": outcome.transcription_ms,
                    "enrichmentMs": outcome.enrichment_ms,
                    "totalMs": outcome.total_ms,
                },
            },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    Output::header("Story");
    println!();
    println!("{}", outcome.transcription);

    Output::header("Lesson Suggestions");
    println!();
    Output::lesson("practical", &outcome.lesson_options.practical);
    Output::lesson("emotional", &outcome.lesson_options.emotional);
    Output::lesson("character", &outcome.lesson_options.character);

    println!();
    Output::success(&format!(
        "Transcribed ~{} of audio via {} in {}ms (enrichment {}ms)",
        format_minutes(outcome.duration_minutes),
        outcome.provider,
        outcome.transcription_ms,
        outcome.enrichment_ms
    ));

    Ok(())
}
