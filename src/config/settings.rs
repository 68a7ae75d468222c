//! Configuration settings for Fortell.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub enrichment: EnrichmentSettings,
    pub production: ProductionSettings,
    pub comparison: ComparisonSettings,
    pub server: ServerSettings,
    pub access: AccessSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for staged audio files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/fortell".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Primary transcription model (returns a confidence score).
    pub primary_model: String,
    /// Secondary transcription model (text only, no confidence).
    pub secondary_model: String,
    /// Locale hint passed to the primary provider (e.g. "en").
    pub language: Option<String>,
    /// Maximum accepted audio upload size in bytes.
    pub max_audio_bytes: usize,
    /// Per-call client timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            primary_model: "whisper-1".to_string(),
            secondary_model: "gpt-4o-transcribe".to_string(),
            language: Some("en".to_string()),
            max_audio_bytes: 25 * 1024 * 1024,
            request_timeout_secs: 120,
        }
    }
}

/// Enrichment (formatter + lesson extraction) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    /// Model for the formatting rewrite.
    pub formatter_model: String,
    /// Sampling temperature for the formatter (low keeps it literal).
    pub formatter_temperature: f32,
    /// Model for lesson extraction.
    pub lessons_model: String,
    /// Sampling temperature for lesson extraction.
    pub lessons_temperature: f32,
    /// Token cap per enrichment call.
    pub max_tokens: u32,
    /// Per-call client timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            formatter_model: "gpt-4o-mini".to_string(),
            formatter_temperature: 0.2,
            lessons_model: "gpt-4o-mini".to_string(),
            lessons_temperature: 0.8,
            max_tokens: 1024,
            request_timeout_secs: 60,
        }
    }
}

/// Audio enhancement (production) provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionSettings {
    /// Base URL of the enhancement job API.
    pub endpoint: String,
    /// API token; falls back to the PRODUCTION_API_KEY environment variable.
    pub api_key: Option<String>,
    /// Seconds between status polls.
    pub poll_interval_secs: u64,
    /// Maximum number of status polls before giving up.
    pub poll_max_attempts: u32,
    /// Per-call client timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProductionSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.enhance.example.com/v1".to_string(),
            api_key: None,
            poll_interval_secs: 5,
            poll_max_attempts: 36,
            request_timeout_secs: 30,
        }
    }
}

impl ProductionSettings {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("PRODUCTION_API_KEY").ok())
    }
}

/// Pipeline comparison settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonSettings {
    /// Outer timeout applied independently to each pipeline under comparison.
    pub pipeline_timeout_secs: u64,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            pipeline_timeout_secs: 60,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Caller access control settings (rate limiting + AI consent).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessSettings {
    /// Requests allowed per caller within the window.
    pub rate_limit_requests: u32,
    /// Sliding window length in seconds.
    pub rate_limit_window_secs: u64,
    /// Caller identities with AI processing explicitly denied.
    pub consent_denied: Vec<String>,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            rate_limit_requests: 10,
            rate_limit_window_secs: 60,
            consent_denied: Vec::new(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::FortellError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fortell")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.production.poll_interval_secs, 5);
        assert_eq!(settings.production.poll_max_attempts, 36);
        assert_eq!(settings.comparison.pipeline_timeout_secs, 60);
        assert_eq!(settings.transcription.primary_model, "whisper-1");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
[production]
poll_interval_secs = 2
"#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.production.poll_interval_secs, 2);
        assert_eq!(settings.production.poll_max_attempts, 36);
        assert_eq!(settings.server.port, 3000);
    }
}
