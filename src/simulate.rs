//! Stand-in for a message delivery backend, used by the interactive chat.
//!
//! The transcript engine accepts remote messages whenever they arrive; this
//! module only produces some to talk to.

use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::language::LanguageTag;
use crate::transcript::{MessageId, NewMessage, TranscriptEngine};

const REPLY_IN_SPANISH: &str = "Claro, hacemos envíos internacionales. ¿A qué ciudad?";
const REPLY_IN_ENGLISH: &str = "Sure! We ship worldwide. Which city are you in?";

/// Load a short conversation that happened a few minutes ago
pub fn seed_history(engine: &TranscriptEngine) -> Vec<MessageId> {
    let now = Utc::now();
    vec![
        engine.append(
            NewMessage::remote("Hola, ¡gracias por escribir! ¿En qué puedo ayudarte?")
                .with_language(LanguageTag::Es)
                .sent_at(now - ChronoDuration::minutes(8)),
        ),
        engine.append(
            NewMessage::local("Hi! I want to know your delivery options to the US.")
                .with_language(LanguageTag::En)
                .sent_at(now - ChronoDuration::minutes(6)),
        ),
    ]
}

/// Canned counterpart reply, written in the other language
pub fn reply_for(sent_language: LanguageTag) -> &'static str {
    match sent_language {
        LanguageTag::En => REPLY_IN_SPANISH,
        _ => REPLY_IN_ENGLISH,
    }
}

/// Answers every local message after a fixed delay
#[derive(Clone)]
pub struct ReplySimulator {
    engine: TranscriptEngine,
    delay: Duration,
}

impl ReplySimulator {
    pub fn new(engine: TranscriptEngine, delay: Duration) -> Self {
        Self { engine, delay }
    }

    pub fn schedule_reply(&self, sent_language: LanguageTag) -> JoinHandle<MessageId> {
        let engine = self.engine.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let id = engine.append(NewMessage::remote(reply_for(sent_language)));
            debug!("Simulated reply {} delivered after {:?}", id, delay);
            id
        })
    }
}
