//! Story formatting: pre-pass cleanup plus a low-temperature model rewrite.

use super::{ChatModel, ChatRequest, StorySource};
use crate::config::{EnrichmentSettings, Prompts};
use crate::sanitize::PromptGuard;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Output of the formatter: the text plus where it came from.
#[derive(Debug, Clone)]
pub struct FormattedText {
    pub text: String,
    pub source: StorySource,
}

/// Rewrites a sanitized transcript into paragraphed prose.
///
/// A cheap regex pre-pass removes filler words and duplicate tokens before
/// the model call, which cuts token cost and stabilizes the rewrite. The
/// pre-pass output is also the fallback when the model call fails.
pub struct Formatter {
    chat: Arc<dyn ChatModel>,
    guard: Arc<PromptGuard>,
    system_prompt: String,
    user_template: String,
    prompts: Prompts,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Formatter {
    pub fn new(
        chat: Arc<dyn ChatModel>,
        guard: Arc<PromptGuard>,
        prompts: &Prompts,
        settings: &EnrichmentSettings,
    ) -> Self {
        Self {
            chat,
            guard,
            system_prompt: prompts.formatter.system.clone(),
            user_template: prompts.formatter.user.clone(),
            prompts: prompts.clone(),
            model: settings.formatter_model.clone(),
            temperature: settings.formatter_temperature,
            max_tokens: settings.max_tokens,
        }
    }

    /// Format a sanitized transcript. Never fails; a model failure falls
    /// back to the pre-pass-cleaned text.
    pub async fn format(&self, sanitized: &str) -> FormattedText {
        let pre_pass = self.guard.collapse_disfluencies(sanitized);

        if pre_pass.is_empty() {
            return FormattedText {
                text: pre_pass,
                source: StorySource::PrePass,
            };
        }

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), pre_pass.clone());
        let user_prompt = self.prompts.render_with_custom(&self.user_template, &vars);

        let request = ChatRequest {
            model: self.model.clone(),
            system_prompt: self.system_prompt.clone(),
            user_prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.chat.complete(request).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!("Formatter rewrite complete ({} chars)", text.len());
                FormattedText {
                    text: text.trim().to_string(),
                    source: StorySource::Model,
                }
            }
            Ok(_) => {
                warn!("Formatter returned empty text, using pre-pass output");
                FormattedText {
                    text: pre_pass,
                    source: StorySource::PrePass,
                }
            }
            Err(e) => {
                warn!("Formatter call failed: {e}, using pre-pass output");
                FormattedText {
                    text: pre_pass,
                    source: StorySource::PrePass,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::tests::StubChat;

    fn formatter(chat: Arc<dyn ChatModel>) -> Formatter {
        Formatter::new(
            chat,
            Arc::new(PromptGuard::new()),
            &Prompts::default(),
            &EnrichmentSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_model_rewrite_used_when_available() {
        let chat = Arc::new(StubChat::ok("We built a treehouse that summer.\n\nIt took weeks."));
        let out = formatter(chat).format("we built a treehouse that summer").await;
        assert_eq!(out.source, StorySource::Model);
        assert!(out.text.contains("treehouse"));
    }

    #[tokio::test]
    async fn test_empty_model_output_falls_back() {
        let chat = Arc::new(StubChat::ok("   "));
        let out = formatter(chat).format("we built a treehouse").await;
        assert_eq!(out.source, StorySource::PrePass);
        assert_eq!(out.text, "we built a treehouse");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_pre_pass() {
        let chat = Arc::new(StubChat::failing("timeout"));
        let out = formatter(chat).format("the the lake was was cold").await;
        assert_eq!(out.source, StorySource::PrePass);
        assert_eq!(out.text, "the lake was cold");
    }

    #[tokio::test]
    async fn test_empty_input_never_calls_model() {
        let chat = Arc::new(StubChat::ok("anything"));
        let out = formatter(chat.clone()).format("").await;
        assert_eq!(out.source, StorySource::PrePass);
        assert_eq!(chat.call_count(), 0);
    }
}
