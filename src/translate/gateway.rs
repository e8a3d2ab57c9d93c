use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::language::LanguageTag;
use super::TranslationBackend;

/// How a translation came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    /// The backend returned different text
    Translated,
    /// The backend answered with the input text
    Unchanged,
    /// The backend failed or timed out; text is the input
    Failed,
}

/// Result of a gateway call, valid only for `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    pub target: LanguageTag,
    pub status: TranslationStatus,
}

impl Translation {
    fn pass_through(text: &str, target: LanguageTag, status: TranslationStatus) -> Self {
        Self {
            text: text.to_string(),
            target,
            status,
        }
    }
}

/// Best-effort translation: never fails, degrades to the original text.
#[derive(Clone)]
pub struct TranslationGateway {
    backend: Arc<dyn TranslationBackend>,
    timeout: Duration,
}

impl TranslationGateway {
    pub fn new(backend: Arc<dyn TranslationBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn translate(&self, text: &str, target: LanguageTag) -> Translation {
        if text.trim().is_empty() {
            return Translation::pass_through(text, target, TranslationStatus::Unchanged);
        }
        if target == LanguageTag::Other {
            warn!("No concrete target language, keeping original");
            return Translation::pass_through(text, target, TranslationStatus::Failed);
        }

        let outcome = tokio::time::timeout(self.timeout, self.backend.translate(text, target)).await;

        match outcome {
            Ok(Ok(translated)) if translated.trim() == text.trim() => {
                debug!("{} backend returned the input unchanged", self.backend.name());
                Translation::pass_through(text, target, TranslationStatus::Unchanged)
            }
            Ok(Ok(translated)) => Translation {
                text: translated,
                target,
                status: TranslationStatus::Translated,
            },
            Ok(Err(e)) => {
                warn!("Translation to {} failed, keeping original: {}", target, e);
                Translation::pass_through(text, target, TranslationStatus::Failed)
            }
            Err(_) => {
                warn!(
                    "Translation to {} timed out after {:?}, keeping original",
                    target, self.timeout
                );
                Translation::pass_through(text, target, TranslationStatus::Failed)
            }
        }
    }
}
