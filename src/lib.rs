//! Fortell - Story Transcription and Enrichment
//!
//! A service core that turns raw recorded speech into a usable story by
//! coordinating speech-to-text providers, a language-model enrichment chain,
//! and an asynchronous audio-enhancement job API.
//!
//! The name "Fortell" comes from the Norwegian word for "tell."
//!
//! # Overview
//!
//! Fortell allows you to:
//! - Transcribe a recording and enrich it into formatted prose
//! - Extract three "lesson learned" seed sentences from a story
//! - Clean up recordings through an external enhancement job API
//! - Race transcription pipelines for quality/cost/latency comparison
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `audio` - Audio assets and scoped on-disk staging
//! - `sanitize` - Transcript sanitization and prompt-injection defense
//! - `cost` - Byte-size duration and cost heuristics
//! - `transcription` - Speech-to-text provider adapters
//! - `enrichment` - Concurrent formatter + lesson extraction
//! - `production` - Audio enhancement job state machine
//! - `comparison` - Settle-all pipeline comparison harness
//! - `access` - Consent gate and rate limiting
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use fortell::audio::AudioAsset;
//! use fortell::config::Settings;
//! use fortell::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let bytes = tokio::fs::read("recording.webm").await?;
//!     let asset = AudioAsset::new(bytes, "audio/webm");
//!     let outcome = orchestrator.tell_story(&asset).await?;
//!     println!("{}", outcome.transcription);
//!
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod audio;
pub mod cli;
pub mod comparison;
pub mod config;
pub mod cost;
pub mod enrichment;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod production;
pub mod sanitize;
pub mod transcription;

pub use error::{FortellError, Result};
