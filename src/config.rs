use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{CharlaError, Result};
use crate::language::LanguageTag;

fn default_auto_translate() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:3000".to_string()
}

fn default_translate_path() -> String {
    "/api/tools/translate".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_reply_delay_ms() -> u64 {
    800
}

fn default_seed_history() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Language the viewer reads in; derived from the locale when unset
    pub viewer_language: Option<LanguageTag>,
    /// Translate foreign messages without waiting for the viewer to ask
    #[serde(default = "default_auto_translate")]
    pub auto_translate: bool,
    /// Which messages auto-translate applies to
    #[serde(default)]
    pub auto_translate_scope: AutoTranslateScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AutoTranslateScope {
    /// Every message, whoever wrote it
    #[default]
    All,
    /// Only messages from the counterpart
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Translation backend implementation
    #[serde(default)]
    pub backend: BackendKind,
    /// Base URL of the translation service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request path appended to the endpoint
    #[serde(default = "default_translate_path")]
    pub path: String,
    /// Upper bound for a single remote translation, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// POST `{ text, target }` to a translation service
    #[default]
    Http,
    /// Local identity transform, no network
    Passthrough,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Delay before the simulated counterpart answers
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
    /// Load a short canned history when a chat starts
    #[serde(default = "default_seed_history")]
    pub seed_history: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewer_language: None,
            auto_translate: default_auto_translate(),
            auto_translate_scope: AutoTranslateScope::default(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            endpoint: default_endpoint(),
            path: default_translate_path(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: default_reply_delay_ms(),
            seed_history: default_seed_history(),
        }
    }
}

impl SessionConfig {
    /// Configured viewer language, falling back to the process locale
    pub fn resolve_viewer_language(&self) -> LanguageTag {
        self.viewer_language
            .unwrap_or_else(LanguageTag::from_environment)
    }
}

impl TranslateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

impl DemoConfig {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CharlaError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CharlaError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| CharlaError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.viewer_language == Some(LanguageTag::Other) {
            return Err(CharlaError::Config(
                "viewer_language must be a concrete language (es or en)".to_string(),
            ));
        }

        if self.translate.timeout_ms == 0 {
            return Err(CharlaError::Config(
                "translate.timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.translate.backend == BackendKind::Http && self.translate.endpoint.trim().is_empty() {
            return Err(CharlaError::Config(
                "translate.endpoint is required for the Http backend".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.session.auto_translate);
        assert_eq!(config.session.auto_translate_scope, AutoTranslateScope::All);
        assert_eq!(config.translate.url(), "http://localhost:3000/api/tools/translate");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("charla.toml");
        file.write_str(
            r#"
[session]
viewer_language = "es"
auto_translate = false

[translate]
endpoint = "http://10.0.2.2:3000/"
"#,
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.session.viewer_language, Some(LanguageTag::Es));
        assert!(!config.session.auto_translate);
        assert_eq!(config.translate.backend, BackendKind::Http);
        assert_eq!(config.translate.timeout_ms, 5_000);
        assert_eq!(config.translate.url(), "http://10.0.2.2:3000/api/tools/translate");
        assert_eq!(config.demo.reply_delay_ms, 800);
    }

    #[test]
    fn test_save_and_reload() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("saved.toml");

        let mut config = Config::default();
        config.session.viewer_language = Some(LanguageTag::En);
        config.session.auto_translate_scope = AutoTranslateScope::Remote;
        config.translate.backend = BackendKind::Passthrough;
        config.save_to_file(file.path()).unwrap();

        let saved = std::fs::read_to_string(file.path()).unwrap();
        assert!(saved.contains("backend = \"Passthrough\""));

        let reloaded = Config::from_file(file.path()).unwrap();
        assert_eq!(reloaded.session.viewer_language, Some(LanguageTag::En));
        assert_eq!(reloaded.session.auto_translate_scope, AutoTranslateScope::Remote);
        assert_eq!(reloaded.translate.backend, BackendKind::Passthrough);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("bad.toml");
        file.write_str("[session]\nviewer_language = \"other\"\n").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(CharlaError::Config(_))
        ));

        let mut config = Config::default();
        config.translate.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file_reports_toml_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("broken.toml");
        file.write_str("[session
auto_translate = yes
").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CharlaError::Toml(_)));
        assert!(err.to_string().starts_with("TOML parsing error"));
    }

    #[test]
    fn test_explicit_viewer_language_wins() {
        let session = SessionConfig {
            viewer_language: Some(LanguageTag::Es),
            ..SessionConfig::default()
        };
        assert_eq!(session.resolve_viewer_language(), LanguageTag::Es);
    }
}
