//! Lesson extraction: three labeled maxims distilled from a story.

use super::{ChatModel, ChatRequest};
use crate::config::{EnrichmentSettings, Prompts};
use std::collections::HashMap;
use std::sync::Arc;
use serde::Serialize;
use tracing::{debug, warn};

/// Fixed fallback sentences, used whenever the model output is missing or
/// malformed. The caller always receives all three keys.
const DEFAULT_PRACTICAL: &str =
    "Hold on to the small practical details of a memory; they make the story worth retelling.";
const DEFAULT_EMOTIONAL: &str =
    "The feelings inside a remembered moment matter as much as the facts that surround it.";
const DEFAULT_CHARACTER: &str =
    "The way someone tells their story says as much about them as the story itself.";

/// Three short seed sentences offered for a "lesson learned" field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonOptions {
    pub practical: String,
    pub emotional: String,
    pub character: String,
}

impl LessonOptions {
    /// The fixed default sentences.
    pub fn defaults() -> Self {
        Self {
            practical: DEFAULT_PRACTICAL.to_string(),
            emotional: DEFAULT_EMOTIONAL.to_string(),
            character: DEFAULT_CHARACTER.to_string(),
        }
    }
}

/// Extracts practical / emotional / character lessons from a story.
pub struct LessonExtractor {
    chat: Arc<dyn ChatModel>,
    system_prompt: String,
    user_template: String,
    prompts: Prompts,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl LessonExtractor {
    pub fn new(chat: Arc<dyn ChatModel>, prompts: &Prompts, settings: &EnrichmentSettings) -> Self {
        Self {
            chat,
            system_prompt: prompts.lessons.system.clone(),
            user_template: prompts.lessons.user.clone(),
            prompts: prompts.clone(),
            model: settings.lessons_model.clone(),
            temperature: settings.lessons_temperature,
            max_tokens: settings.max_tokens,
        }
    }

    /// Extract lessons from a sanitized transcript. Never fails; a model
    /// failure yields the three default sentences.
    pub async fn extract(&self, sanitized: &str) -> LessonOptions {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), sanitized.to_string());
        let user_prompt = self.prompts.render_with_custom(&self.user_template, &vars);

        let request = ChatRequest {
            model: self.model.clone(),
            system_prompt: self.system_prompt.clone(),
            user_prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.chat.complete(request).await {
            Ok(response) => {
                let lessons = parse_lessons(&response);
                debug!("Lesson extraction complete");
                lessons
            }
            Err(e) => {
                warn!("Lesson extraction failed: {e}, using defaults");
                LessonOptions::defaults()
            }
        }
    }
}

/// Parse model output into the three labeled lessons.
///
/// Lines are scanned for case-insensitive `label:` prefixes. Labels the
/// model omitted are backfilled from the remaining unlabeled lines in
/// encounter order; anything still missing gets its default sentence.
fn parse_lessons(response: &str) -> LessonOptions {
    let mut practical: Option<String> = None;
    let mut emotional: Option<String> = None;
    let mut character: Option<String> = None;
    let mut unlabeled: Vec<String> = Vec::new();

    for line in response.lines() {
        let line = line.trim().trim_start_matches(['-', '*', '•']).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = strip_label(line, "practical") {
            if practical.is_none() && !rest.is_empty() {
                practical = Some(rest);
            }
            continue;
        }
        if let Some(rest) = strip_label(line, "emotional") {
            if emotional.is_none() && !rest.is_empty() {
                emotional = Some(rest);
            }
            continue;
        }
        if let Some(rest) = strip_label(line, "character") {
            if character.is_none() && !rest.is_empty() {
                character = Some(rest);
            }
            continue;
        }

        unlabeled.push(line.to_string());
    }

    // Backfill missing labels from unlabeled lines in encounter order.
    let mut leftovers = unlabeled.into_iter();
    for slot in [&mut practical, &mut emotional, &mut character] {
        if slot.is_none() {
            *slot = leftovers.next();
        }
    }

    LessonOptions {
        practical: practical.unwrap_or_else(|| DEFAULT_PRACTICAL.to_string()),
        emotional: emotional.unwrap_or_else(|| DEFAULT_EMOTIONAL.to_string()),
        character: character.unwrap_or_else(|| DEFAULT_CHARACTER.to_string()),
    }
}

/// If the line starts with `label:` (case-insensitive), return the rest.
fn strip_label(line: &str, label: &str) -> Option<String> {
    let lower = line.to_lowercase();
    let prefix = format!("{label}:");
    if lower.starts_with(&prefix) {
        Some(line[prefix.len()..].trim().to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fully_labeled() {
        let lessons = parse_lessons(
            "practical: Check the oil.\nemotional: It felt like freedom.\ncharacter: He never gave up.",
        );
        assert_eq!(lessons.practical, "Check the oil.");
        assert_eq!(lessons.emotional, "It felt like freedom.");
        assert_eq!(lessons.character, "He never gave up.");
    }

    #[test]
    fn test_parse_case_insensitive_labels() {
        let lessons = parse_lessons(
            "PRACTICAL: Check the oil.\nEmotional: It felt like freedom.\nCHARACTER: He never gave up.",
        );
        assert_eq!(lessons.practical, "Check the oil.");
        assert_eq!(lessons.character, "He never gave up.");
    }

    #[test]
    fn test_parse_backfills_from_unlabeled_in_order() {
        let lessons = parse_lessons(
            "practical: Check the oil.\nAlways trust the weather less than the map.\nKindness shows in small gestures.",
        );
        assert_eq!(lessons.practical, "Check the oil.");
        assert_eq!(lessons.emotional, "Always trust the weather less than the map.");
        assert_eq!(lessons.character, "Kindness shows in small gestures.");
    }

    #[test]
    fn test_parse_fills_defaults_when_exhausted() {
        let lessons = parse_lessons("emotional: It felt like freedom.");
        assert_eq!(lessons.emotional, "It felt like freedom.");
        assert_eq!(lessons.practical, DEFAULT_PRACTICAL);
        assert_eq!(lessons.character, DEFAULT_CHARACTER);
    }

    #[test]
    fn test_parse_empty_response_all_defaults() {
        assert_eq!(parse_lessons(""), LessonOptions::defaults());
        assert_eq!(parse_lessons("\n\n  \n"), LessonOptions::defaults());
    }

    #[test]
    fn test_parse_bulleted_labels() {
        let lessons = parse_lessons(
            "- practical: Check the oil.\n* emotional: It felt like freedom.\n- character: He never gave up.",
        );
        assert_eq!(lessons.practical, "Check the oil.");
        assert_eq!(lessons.emotional, "It felt like freedom.");
    }

    #[test]
    fn test_empty_label_value_treated_as_missing() {
        let lessons = parse_lessons("practical:\nemotional: It felt real.");
        // "practical:" with no text falls through to backfill/defaults
        assert_eq!(lessons.practical, DEFAULT_PRACTICAL);
        assert_eq!(lessons.emotional, "It felt real.");
    }
}
