//! CLI module for Fortell.

pub mod commands;
mod output;

pub use output::{format_minutes, Output};

use clap::{Parser, Subcommand};

/// Fortell - Story Transcription and Enrichment
///
/// Turn raw recorded speech into a usable story: a cleaned transcript,
/// formatted prose, and lesson suggestions, with optional audio enhancement.
/// The name "Fortell" comes from the Norwegian word for "tell."
#[derive(Parser, Debug)]
#[command(name = "fortell")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe a recording and enrich it into a story
    Transcribe {
        /// Local audio file path
        file: String,

        /// Print the full result as JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Clean up a recording through the audio enhancement provider
    Clean {
        /// Local audio file path
        file: String,

        /// Where to write the enhanced audio
        #[arg(short, long)]
        output: String,
    },

    /// Run every transcription pipeline on a recording and compare them
    Compare {
        /// Local audio file path
        file: String,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Check API keys, directories, and provider configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
