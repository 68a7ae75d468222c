//! Prompt templates for Fortell.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub formatter: FormatterPrompts,
    pub lessons: LessonPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for the story formatting rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterPrompts {
    pub system: String,
    pub user: String,
}

impl Default for FormatterPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an editor preparing a spoken family story for reading.

Rewrite the transcript below into clean, paragraphed prose.

Rules:
- Preserve the speaker's meaning, voice, and first-person perspective
- Remove remaining filler words, false starts, and repeated phrases
- Break the text into short paragraphs at natural topic shifts
- Fix punctuation and capitalization
- Never add events, names, or details that are not in the transcript
- Never summarize; keep the full content"#
                .to_string(),

            user: r#"Transcript:
{{transcript}}

Return only the rewritten story text, no preamble."#
                .to_string(),
        }
    }
}

/// Prompts for lesson extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonPrompts {
    pub system: String,
    pub user: String,
}

impl Default for LessonPrompts {
    fn default() -> Self {
        Self {
            system: r#"You distill short "lesson learned" seed sentences from personal stories.

From the story you are given, produce exactly three lessons, one per line:
- practical: a concrete, actionable takeaway
- emotional: what the experience felt like and why that matters
- character: what the story reveals about the person telling it

Each lesson must be a single sentence of 15 to 20 words.
Output exactly three lines, each starting with its label and a colon:

practical: ...
emotional: ...
character: ...

No other text."#
                .to_string(),

            user: r#"Story:
{{transcript}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let formatter_path = custom_path.join("formatter.toml");
            if formatter_path.exists() {
                let content = std::fs::read_to_string(&formatter_path)?;
                prompts.formatter = toml::from_str(&content)?;
            }

            let lessons_path = custom_path.join("lessons.toml");
            if lessons_path.exists() {
                let content = std::fs::read_to_string(&lessons_path)?;
                prompts.lessons = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
