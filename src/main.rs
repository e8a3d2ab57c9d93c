//! Charla - translated chat transcripts
//!
//! Entry point for the `charla` binary: language detection, one-off
//! translation, and an interactive chat against a simulated counterpart.

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{Level, info, warn};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use charla::cli::{Args, ChatInput, Commands, print_transcript};
use charla::config::Config;
use charla::detect::classify;
use charla::language::LanguageTag;
use charla::simulate::{ReplySimulator, seed_history};
use charla::transcript::{Author, SessionPreferences, TranscriptEngine};
use charla::translate::BackendFactory;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.verbose)?;

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("charla.toml").exists() {
                info!("Found charla.toml in current directory, loading...");
                Config::from_file("charla.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Detect { text } => {
            println!("{}", classify(&text));
        }
        Commands::Translate { to, text } => {
            let target = LanguageTag::parse_target(&to)?;
            let gateway = BackendFactory::create_gateway(&config.translate)?;
            let translation = gateway.translate(&text, target).await;
            println!("{}", translation.text);
            info!("Translation status: {:?}", translation.status);
        }
        Commands::Chat {
            viewer_language,
            no_auto_translate,
            no_seed,
        } => {
            let mut prefs = SessionPreferences::from_config(&config.session);
            if let Some(language) = viewer_language {
                prefs.viewer_language = LanguageTag::parse_target(&language)?;
            }
            if no_auto_translate {
                prefs.auto_translate = false;
            }
            let seed = config.demo.seed_history && !no_seed;
            run_chat(&config, prefs, seed).await?;
        }
        Commands::InitConfig { path } => {
            if path.exists() {
                anyhow::bail!("{} already exists", path.display());
            }
            Config::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

/// Interactive transcript: plain lines are sent, slash commands drive the engine
async fn run_chat(config: &Config, prefs: SessionPreferences, seed: bool) -> Result<()> {
    let gateway = BackendFactory::create_gateway(&config.translate)?;
    let engine = TranscriptEngine::new(prefs, gateway)?;
    if seed {
        seed_history(&engine);
    }
    let simulator = ReplySimulator::new(engine.clone(), config.demo.reply_delay());

    println!("Type a message, or /remote <text>, /toggle <n>, /auto on|off, /show, /quit");
    print_transcript(&engine.snapshot())?;

    let watcher = {
        let engine = engine.clone();
        let mut changes = engine.subscribe();
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                // coalesce bursts of updates into one redraw
                tokio::time::sleep(Duration::from_millis(30)).await;
                changes.borrow_and_update();
                if let Err(e) = print_transcript(&engine.snapshot()) {
                    warn!("Failed to render transcript: {}", e);
                    break;
                }
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ChatInput::parse(&line) {
            Ok(ChatInput::Send(text)) => {
                let id = engine.append_message(Author::Local, text, None);
                if let Some(message) = engine.message(id) {
                    simulator.schedule_reply(message.detected_language);
                }
            }
            Ok(ChatInput::Remote(text)) => {
                engine.append_message(Author::Remote, text, None);
            }
            Ok(ChatInput::Toggle(number)) => {
                let snapshot = engine.snapshot();
                match snapshot.messages.get(number - 1) {
                    Some(message) => {
                        engine.toggle_message_display(message.id)?;
                    }
                    None => eprintln!("No message #{}", number),
                }
            }
            Ok(ChatInput::Auto(enabled)) => engine.set_auto_translate(enabled),
            Ok(ChatInput::Show) => print_transcript(&engine.snapshot())?,
            Ok(ChatInput::Quit) => break,
            Ok(ChatInput::Empty) => {}
            Err(usage) => eprintln!("{}", usage),
        }
    }

    watcher.abort();
    info!("Chat closed with {} message(s)", engine.len());
    Ok(())
}

/// Setup logging to stderr and a daily log file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".charla").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "charla.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // stdout belongs to the transcript
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("charla.log").display()
    );

    Ok(guard)
}
