use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::detect::classify;
use crate::language::LanguageTag;
use crate::translate::{Translation, TranslationStatus};

/// Stable identifier of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    /// The viewing user
    Local,
    /// The counterpart
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    ShowOriginal,
    ShowTranslated,
}

impl DisplayMode {
    pub fn flipped(self) -> Self {
        match self {
            Self::ShowOriginal => Self::ShowTranslated,
            Self::ShowTranslated => Self::ShowOriginal,
        }
    }
}

/// Where a message is in its detect/translate lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    Tagged,
    TranslationPending,
    TranslationReady,
}

/// Who asked for an in-flight translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Reveal {
    /// Auto-translate: show the result only if auto-translate is still on
    Auto,
    /// The viewer asked: always show the result
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingTranslation {
    pub target: LanguageTag,
    pub reveal: Reveal,
}

/// Input for a new transcript entry
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub author: Author,
    pub text: String,
    pub language: Option<LanguageTag>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl NewMessage {
    pub fn new(author: Author, text: impl Into<String>) -> Self {
        Self {
            author,
            text: text.into(),
            language: None,
            sent_at: None,
        }
    }

    pub fn local(text: impl Into<String>) -> Self {
        Self::new(Author::Local, text)
    }

    pub fn remote(text: impl Into<String>) -> Self {
        Self::new(Author::Remote, text)
    }

    /// Skip classification and use a language the sender already knows
    pub fn with_language(mut self, language: LanguageTag) -> Self {
        self.language = Some(language);
        self
    }

    /// Approximate send time reported by the delivery backend
    pub fn sent_at(mut self, at: DateTime<Utc>) -> Self {
        self.sent_at = Some(at);
        self
    }
}

/// A single transcript entry
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub author: Author,
    pub original_text: String,
    pub detected_language: LanguageTag,
    pub translation: Option<Translation>,
    pub display_mode: DisplayMode,
    pub created_at: DateTime<Utc>,
    /// Set once the viewer flips this message by hand; auto-translate leaves it alone
    pub pinned_by_viewer: bool,
    #[serde(skip)]
    pub(crate) pending: Option<PendingTranslation>,
}

impl Message {
    /// Build a tagged message; classification happens here when no language is supplied
    pub(crate) fn tagged(new: NewMessage, created_at: DateTime<Utc>) -> Self {
        let detected_language = new.language.unwrap_or_else(|| classify(&new.text));

        Self {
            id: MessageId::new(),
            author: new.author,
            original_text: new.text,
            detected_language,
            translation: None,
            display_mode: DisplayMode::ShowOriginal,
            created_at,
            pinned_by_viewer: false,
            pending: None,
        }
    }

    /// Cached translation, if it was computed for `viewer`
    pub fn translation_for(&self, viewer: LanguageTag) -> Option<&Translation> {
        self.translation.as_ref().filter(|t| t.target == viewer)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_foreign_to(&self, viewer: LanguageTag) -> bool {
        self.detected_language != viewer
    }

    pub fn showing_translation(&self, viewer: LanguageTag) -> bool {
        self.display_mode == DisplayMode::ShowTranslated && self.translation_for(viewer).is_some()
    }

    pub fn visible_text(&self, viewer: LanguageTag) -> &str {
        match self.translation_for(viewer) {
            Some(translation) if self.display_mode == DisplayMode::ShowTranslated => {
                &translation.text
            }
            _ => &self.original_text,
        }
    }

    pub fn state(&self, viewer: LanguageTag) -> MessageState {
        if self.is_pending() {
            MessageState::TranslationPending
        } else if self.translation_for(viewer).is_some() {
            MessageState::TranslationReady
        } else {
            MessageState::Tagged
        }
    }

    pub fn view(&self, viewer: LanguageTag) -> MessageView {
        let showing_translation = self.showing_translation(viewer);

        MessageView {
            id: self.id,
            author: self.author,
            created_at: self.created_at,
            detected_language: self.detected_language,
            badge: self.detected_language.badge(),
            visible_text: self.visible_text(viewer).to_string(),
            showing_translation,
            state: self.state(viewer),
            translation_status: self.translation_for(viewer).map(|t| t.status),
            control: ControlLabel::for_display(showing_translation),
            control_label: ControlLabel::for_display(showing_translation).text(viewer),
        }
    }
}

/// Caption of the per-message translate control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlLabel {
    Translate,
    ShowOriginal,
}

impl ControlLabel {
    fn for_display(showing_translation: bool) -> Self {
        if showing_translation {
            Self::ShowOriginal
        } else {
            Self::Translate
        }
    }

    /// Caption in the viewer's language
    pub fn text(&self, viewer: LanguageTag) -> &'static str {
        match (self, viewer) {
            (Self::Translate, LanguageTag::Es) => "Traducir",
            (Self::ShowOriginal, LanguageTag::Es) => "Ver original",
            (Self::Translate, _) => "Translate",
            (Self::ShowOriginal, _) => "Show original",
        }
    }
}

/// Render row for a message as seen by the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    pub id: MessageId,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub detected_language: LanguageTag,
    pub badge: &'static str,
    pub visible_text: String,
    pub showing_translation: bool,
    pub state: MessageState,
    pub translation_status: Option<TranslationStatus>,
    pub control: ControlLabel,
    pub control_label: &'static str,
}
