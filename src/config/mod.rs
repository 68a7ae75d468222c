//! Configuration module for Fortell.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{FormatterPrompts, LessonPrompts, Prompts};
pub use settings::{
    AccessSettings, ComparisonSettings, EnrichmentSettings, GeneralSettings, ProductionSettings,
    PromptSettings, ServerSettings, Settings, TranscriptionSettings,
};
