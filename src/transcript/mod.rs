// Translated transcript
//
// `message` holds the per-entry data model and render rows, `engine` owns the
// ordered transcript and coordinates classification and translation.

pub mod engine;
pub mod message;

pub use engine::{SessionPreferences, ToggleOutcome, TranscriptEngine, TranscriptSnapshot};
pub use message::{
    Author, ControlLabel, DisplayMode, Message, MessageId, MessageState, MessageView, NewMessage,
};
