use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::Result;
use crate::transcript::{Author, MessageState, TranscriptSnapshot};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect the language of a piece of text
    Detect {
        /// Text to classify
        text: String,
    },

    /// Translate text through the configured backend
    Translate {
        /// Target language (es or en)
        #[arg(short, long)]
        to: String,

        /// Text to translate
        text: String,
    },

    /// Start an interactive chat with a simulated counterpart
    Chat {
        /// Language to read messages in (defaults to config, then locale)
        #[arg(long)]
        viewer_language: Option<String>,

        /// Start with auto-translate disabled
        #[arg(long)]
        no_auto_translate: bool,

        /// Do not load the canned history
        #[arg(long)]
        no_seed: bool,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "charla.toml")]
        path: PathBuf,
    },
}

/// A line typed into the interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Send(String),
    Remote(String),
    Toggle(usize),
    Auto(bool),
    Show,
    Quit,
    Empty,
}

impl ChatInput {
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        if !line.starts_with('/') {
            return Ok(Self::Send(line.to_string()));
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match command {
            "/quit" | "/exit" => Ok(Self::Quit),
            "/show" => Ok(Self::Show),
            "/remote" if !rest.is_empty() => Ok(Self::Remote(rest.to_string())),
            "/remote" => Err("usage: /remote <text>".to_string()),
            "/toggle" => rest
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(Self::Toggle)
                .ok_or_else(|| "usage: /toggle <message number>".to_string()),
            "/auto" => match rest {
                "on" => Ok(Self::Auto(true)),
                "off" => Ok(Self::Auto(false)),
                _ => Err("usage: /auto on|off".to_string()),
            },
            other => Err(format!("unknown command {}", other)),
        }
    }
}

/// Render the transcript as numbered lines
pub fn render_transcript(snapshot: &TranscriptSnapshot) -> String {
    let mut out = format!(
        "── viewer: {} · auto-translate: {} ──\n",
        snapshot.viewer_language,
        if snapshot.auto_translate { "on" } else { "off" }
    );

    for (idx, message) in snapshot.messages.iter().enumerate() {
        let who = match message.author {
            Author::Local => "me",
            Author::Remote => "them",
        };
        let pending = if message.state == MessageState::TranslationPending {
            " …"
        } else {
            ""
        };
        out.push_str(&format!(
            "{:>3}. [{}] {:<4} {}{}   ({})\n",
            idx + 1,
            message.badge,
            who,
            message.visible_text,
            pending,
            message.control_label
        ));
    }
    out
}

/// Print a rendered transcript to stdout
pub fn print_transcript(snapshot: &TranscriptSnapshot) -> Result<()> {
    use std::io::Write;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(render_transcript(snapshot).as_bytes())?;
    stdout.flush()?;
    Ok(())
}
