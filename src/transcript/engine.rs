use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{AutoTranslateScope, SessionConfig};
use crate::error::{CharlaError, Result};
use crate::language::LanguageTag;
use crate::translate::{Translation, TranslationGateway};
use super::message::{
    Author, DisplayMode, Message, MessageId, MessageView, NewMessage, PendingTranslation, Reveal,
};

/// Viewer-side settings for one chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPreferences {
    pub viewer_language: LanguageTag,
    pub auto_translate: bool,
    pub scope: AutoTranslateScope,
}

impl SessionPreferences {
    pub fn new(viewer_language: LanguageTag, auto_translate: bool) -> Self {
        Self {
            viewer_language,
            auto_translate,
            scope: AutoTranslateScope::All,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            viewer_language: config.resolve_viewer_language(),
            auto_translate: config.auto_translate,
            scope: config.auto_translate_scope,
        }
    }

    pub fn with_scope(mut self, scope: AutoTranslateScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_viewer_language(self.viewer_language)
    }
}

fn check_viewer_language(language: LanguageTag) -> Result<()> {
    if language == LanguageTag::Other {
        return Err(CharlaError::Config(
            "viewer language must be a concrete language (es or en)".to_string(),
        ));
    }
    Ok(())
}

/// Result of a viewer tapping the per-message control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// A cached translation existed; the display mode is now this
    Flipped(DisplayMode),
    /// No translation yet; one is in flight and will be shown when ready
    Translating,
}

/// Consistent read of the whole transcript
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptSnapshot {
    pub version: u64,
    pub viewer_language: LanguageTag,
    pub auto_translate: bool,
    pub messages: Vec<MessageView>,
}

/// Position of a message: send time first, insertion order on ties
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OrderKey {
    created_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug)]
struct TranslationJob {
    id: MessageId,
    text: String,
    target: LanguageTag,
}

struct TranscriptState {
    prefs: SessionPreferences,
    messages: BTreeMap<OrderKey, Message>,
    index: HashMap<MessageId, OrderKey>,
    next_seq: u64,
    last_created_at: Option<DateTime<Utc>>,
    version: u64,
}

fn auto_applies(prefs: &SessionPreferences, message: &Message) -> bool {
    let in_scope = match prefs.scope {
        AutoTranslateScope::All => true,
        AutoTranslateScope::Remote => message.author == Author::Remote,
    };
    prefs.auto_translate && in_scope && message.is_foreign_to(prefs.viewer_language)
}

impl TranscriptState {
    fn new(prefs: SessionPreferences) -> Self {
        Self {
            prefs,
            messages: BTreeMap::new(),
            index: HashMap::new(),
            next_seq: 0,
            last_created_at: None,
            version: 0,
        }
    }

    fn get(&self, id: MessageId) -> Option<&Message> {
        self.index.get(&id).and_then(|key| self.messages.get(key))
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        let key = self.index.get(&id)?;
        self.messages.get_mut(key)
    }

    fn touch(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    fn has_pending(&self) -> bool {
        self.messages.values().any(Message::is_pending)
    }

    fn next_key(&mut self, sent_at: Option<DateTime<Utc>>) -> OrderKey {
        let created_at = match sent_at {
            Some(at) => at,
            None => {
                let now = Utc::now();
                self.last_created_at.map_or(now, |last| last.max(now))
            }
        };
        self.last_created_at = Some(self.last_created_at.map_or(created_at, |last| last.max(created_at)));

        let key = OrderKey {
            created_at,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        key
    }

    fn insert(&mut self, new: NewMessage) -> (MessageId, Option<TranslationJob>) {
        let key = self.next_key(new.sent_at);
        let message = Message::tagged(new, key.created_at);
        let id = message.id;

        debug!(
            "Appended {:?} message {} tagged {}",
            message.author, id, message.detected_language
        );

        let wants_translation = auto_applies(&self.prefs, &message);
        self.index.insert(id, key);
        self.messages.insert(key, message);

        let job = if wants_translation {
            self.request_translation(id, Reveal::Auto)
        } else {
            None
        };
        (id, job)
    }

    /// Mark a message as awaiting a translation for the current viewer language.
    ///
    /// Returns a job only when no request for the same target is already in flight.
    fn request_translation(&mut self, id: MessageId, reveal: Reveal) -> Option<TranslationJob> {
        let target = self.prefs.viewer_language;
        let message = self.get_mut(id)?;

        match message.pending {
            Some(pending) if pending.target == target => {
                message.pending = Some(PendingTranslation {
                    target,
                    reveal: pending.reveal.max(reveal),
                });
                None
            }
            _ => {
                message.pending = Some(PendingTranslation { target, reveal });
                Some(TranslationJob {
                    id,
                    text: message.original_text.clone(),
                    target,
                })
            }
        }
    }

    /// Bring every message auto-translate covers to its default display.
    ///
    /// Cached translations are shown unless the viewer pinned the message;
    /// messages without one get a translation queued.
    fn reconcile(&mut self) -> Vec<TranslationJob> {
        let prefs = self.prefs;
        let mut ids = Vec::new();
        for message in self.messages.values_mut() {
            if !auto_applies(&prefs, message) {
                continue;
            }
            if message.translation_for(prefs.viewer_language).is_none() {
                ids.push(message.id);
            } else if !message.pinned_by_viewer {
                message.display_mode = DisplayMode::ShowTranslated;
            }
        }

        ids.into_iter()
            .filter_map(|id| self.request_translation(id, Reveal::Auto))
            .collect()
    }

    /// Merge a finished translation by id. Returns whether anything changed.
    fn apply_translation(&mut self, id: MessageId, translation: Translation) -> bool {
        let prefs = self.prefs;
        let Some(message) = self.get_mut(id) else {
            debug!("Translation for unknown message {} dropped", id);
            return false;
        };

        let reveal = match message.pending {
            Some(pending) if pending.target == translation.target => {
                message.pending = None;
                Some(pending.reveal)
            }
            _ => None,
        };

        if translation.target != prefs.viewer_language {
            debug!(
                "Discarding stale {} translation for message {}",
                translation.target, id
            );
            return reveal.is_some();
        }

        debug!(
            "Translation for message {} ready ({:?})",
            id, translation.status
        );
        message.translation = Some(translation);

        let show = match reveal {
            Some(Reveal::Forced) => true,
            Some(Reveal::Auto) => !message.pinned_by_viewer && auto_applies(&prefs, message),
            None => false,
        };
        if show {
            message.display_mode = DisplayMode::ShowTranslated;
        }
        true
    }

    fn snapshot(&self) -> TranscriptSnapshot {
        let viewer = self.prefs.viewer_language;
        TranscriptSnapshot {
            version: self.version,
            viewer_language: viewer,
            auto_translate: self.prefs.auto_translate,
            messages: self.messages.values().map(|m| m.view(viewer)).collect(),
        }
    }
}

struct Inner {
    state: Mutex<TranscriptState>,
    gateway: TranslationGateway,
    runtime: Handle,
    version: watch::Sender<u64>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, TranscriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, version: u64) {
        self.version.send_modify(|current| *current = (*current).max(version));
    }

    fn apply(&self, id: MessageId, translation: Translation) {
        let version = {
            let mut state = self.lock();
            if !state.apply_translation(id, translation) {
                return;
            }
            state.touch()
        };
        self.publish(version);
    }

    /// Clear the in-flight marker of a task that ended without a result
    fn abandon(&self, id: MessageId, target: LanguageTag) {
        let version = {
            let mut state = self.lock();
            let Some(message) = state.get_mut(id) else {
                return;
            };
            if message.pending.map(|p| p.target) != Some(target) {
                return;
            }
            message.pending = None;
            state.touch()
        };
        warn!("Translation of message {} to {} ended without a result", id, target);
        self.publish(version);
    }

    fn spawn_translations(self: &Arc<Self>, jobs: Vec<TranslationJob>) {
        for job in jobs {
            let gateway = self.gateway.clone();
            let mut in_flight = InFlight {
                inner: Arc::downgrade(self),
                id: job.id,
                target: job.target,
                finished: false,
            };

            self.runtime.spawn(async move {
                let translation = gateway.translate(&job.text, job.target).await;
                in_flight.finished = true;
                match in_flight.inner.upgrade() {
                    Some(inner) => inner.apply(job.id, translation),
                    None => debug!("Transcript closed, dropping translation for {}", job.id),
                }
            });
        }
    }
}

/// Held by a translation task; a task that panics or is cancelled before
/// finishing releases its message on drop.
struct InFlight {
    inner: Weak<Inner>,
    id: MessageId,
    target: LanguageTag,
    finished: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            inner.abandon(self.id, self.target);
        }
    }
}

/// Owner of a chat transcript: tags messages, runs translations, and resolves
/// what text each message shows.
///
/// Clones share the same transcript. Translation work is spawned on the tokio
/// runtime the engine was created in; results are merged by message id.
#[derive(Clone)]
pub struct TranscriptEngine {
    inner: Arc<Inner>,
}

impl TranscriptEngine {
    /// Create an engine. Must be called from within a tokio runtime.
    pub fn new(prefs: SessionPreferences, gateway: TranslationGateway) -> Result<Self> {
        prefs.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| CharlaError::Runtime(format!("No tokio runtime available: {}", e)))?;

        info!(
            "Starting transcript (viewer: {}, auto-translate: {})",
            prefs.viewer_language, prefs.auto_translate
        );

        let (version, _) = watch::channel(0);
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(TranscriptState::new(prefs)),
                gateway,
                runtime,
                version,
            }),
        })
    }

    /// Append a message. Its language is known when this returns; translation,
    /// if auto-translate applies, completes in the background.
    pub fn append_message(
        &self,
        author: Author,
        text: impl Into<String>,
        known_language: Option<LanguageTag>,
    ) -> MessageId {
        let mut new = NewMessage::new(author, text);
        new.language = known_language;
        self.append(new)
    }

    /// Append a fully described message, e.g. one delivered with its own send time
    pub fn append(&self, new: NewMessage) -> MessageId {
        let (id, job, version) = {
            let mut state = self.inner.lock();
            let (id, job) = state.insert(new);
            (id, job, state.touch())
        };
        self.inner.publish(version);
        self.inner.spawn_translations(job.into_iter().collect());
        id
    }

    /// Turn auto-translate on or off.
    ///
    /// Turning it on queues translations for every covered foreign message that
    /// has none yet. Turning it off leaves cached translations and display modes alone.
    pub fn set_auto_translate(&self, enabled: bool) {
        let (jobs, version) = {
            let mut state = self.inner.lock();
            state.prefs.auto_translate = enabled;
            let jobs = if enabled { state.reconcile() } else { Vec::new() };
            (jobs, state.touch())
        };

        info!(
            "Auto-translate {} ({} translation(s) queued)",
            if enabled { "enabled" } else { "disabled" },
            jobs.len()
        );
        self.inner.publish(version);
        self.inner.spawn_translations(jobs);
    }

    /// Change the viewer language. Translations for the old language stop being shown.
    pub fn set_viewer_language(&self, language: LanguageTag) -> Result<()> {
        check_viewer_language(language)?;

        let (jobs, version) = {
            let mut state = self.inner.lock();
            if state.prefs.viewer_language == language {
                return Ok(());
            }
            state.prefs.viewer_language = language;

            for message in state.messages.values_mut() {
                if message.pending.is_some_and(|p| p.target != language) {
                    message.pending = None;
                }
            }
            let jobs = state.reconcile();
            (jobs, state.touch())
        };

        info!("Viewer language changed to {}", language);
        self.inner.publish(version);
        self.inner.spawn_translations(jobs);
        Ok(())
    }

    /// Flip between original and translated text, translating first if needed
    pub fn toggle_message_display(&self, id: MessageId) -> Result<ToggleOutcome> {
        let (outcome, job, version) = {
            let mut state = self.inner.lock();
            let viewer = state.prefs.viewer_language;
            let message = state.get_mut(id).ok_or(CharlaError::MessageNotFound(id))?;
            message.pinned_by_viewer = true;

            if message.translation_for(viewer).is_some() {
                message.display_mode = message.display_mode.flipped();
                let mode = message.display_mode;
                (ToggleOutcome::Flipped(mode), None, state.touch())
            } else {
                let job = state.request_translation(id, Reveal::Forced);
                (ToggleOutcome::Translating, job, state.touch())
            }
        };

        debug!("Toggled message {}: {:?}", id, outcome);
        self.inner.publish(version);
        self.inner.spawn_translations(job.into_iter().collect());
        Ok(outcome)
    }

    /// Text the viewer currently sees for a message
    pub fn visible_text(&self, id: MessageId) -> Option<String> {
        let state = self.inner.lock();
        let viewer = state.prefs.viewer_language;
        state.get(id).map(|m| m.visible_text(viewer).to_string())
    }

    pub fn message(&self, id: MessageId) -> Option<Message> {
        self.inner.lock().get(id).cloned()
    }

    pub fn view(&self, id: MessageId) -> Option<MessageView> {
        let state = self.inner.lock();
        let viewer = state.prefs.viewer_language;
        state.get(id).map(|m| m.view(viewer))
    }

    /// All messages in send order
    pub fn messages(&self) -> Vec<Message> {
        self.inner.lock().messages.values().cloned().collect()
    }

    pub fn snapshot(&self) -> TranscriptSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn preferences(&self) -> SessionPreferences {
        self.inner.lock().prefs
    }

    pub fn len(&self) -> usize {
        self.inner.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver that observes a new version on every transcript change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    /// Wait until no translation is in flight
    pub async fn settle(&self) {
        let mut changes = self.subscribe();
        loop {
            if !self.inner.lock().has_pending() {
                return;
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    }
}
