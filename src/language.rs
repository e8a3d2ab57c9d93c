use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CharlaError, Result};

/// Closed set of languages the transcript knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    /// Spanish, the primary language
    Es,
    /// English, the secondary language
    En,
    /// Unknown or undetermined
    Other,
}

impl LanguageTag {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
            Self::Other => "other",
        }
    }

    /// Short uppercase badge shown next to a message
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Es => "ES",
            Self::En => "EN",
            Self::Other => "??",
        }
    }

    /// Map a locale identifier (`es_HN.UTF-8`, `en-US`, ...) to a viewer language.
    ///
    /// Anything that is not Spanish reads in English.
    pub fn from_locale(locale: &str) -> Self {
        if locale.trim().to_lowercase().starts_with("es") {
            Self::Es
        } else {
            Self::En
        }
    }

    /// Parse a language that can be translated into; `other` is rejected
    pub fn parse_target(s: &str) -> Result<Self> {
        match s.parse::<Self>()? {
            Self::Other => Err(CharlaError::Config(format!(
                "'{}' is not a target language. Valid targets: es, en",
                s.trim()
            ))),
            language => Ok(language),
        }
    }

    /// Derive the viewer language from the process locale environment
    pub fn from_environment() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.trim().is_empty() && value != "C" && value != "POSIX")
            .map(|locale| Self::from_locale(&locale))
            .unwrap_or(Self::En)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LanguageTag {
    type Err = CharlaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "es" | "spanish" | "español" => Ok(Self::Es),
            "en" | "english" => Ok(Self::En),
            "other" => Ok(Self::Other),
            _ => Err(CharlaError::Config(format!(
                "Invalid language '{}'. Valid languages: es, en, other",
                s
            ))),
        }
    }
}
