//! CLI command implementations.

mod clean;
mod compare;
mod config;
mod doctor;
mod serve;
mod transcribe;

pub use clean::run_clean;
pub use compare::run_compare;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::run_serve;
pub use transcribe::run_transcribe;

use crate::audio::{guess_content_type, AudioAsset};
use anyhow::Context;
use std::path::Path;

/// Read a local audio file into an asset for the CLI commands.
pub(crate) async fn load_asset(file: &str) -> anyhow::Result<AudioAsset> {
    let path = Path::new(file);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read audio file {file}"))?;
    Ok(AudioAsset::new(bytes, guess_content_type(path)))
}
