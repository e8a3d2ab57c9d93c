//! Charla - Translated Chat Transcripts
//!
//! A chat transcript engine that tags every message with a detected language,
//! translates foreign messages on demand or automatically, and lets the viewer
//! flip each message between its original and translated text.

pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod language;
pub mod simulate;
pub mod transcript;
pub mod translate;
