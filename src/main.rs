use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pronunciation_coach::config::ConfigBuilder;
use pronunciation_coach::{driver, SessionError, SessionOutcome};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// Ask a realtime speech model to critique the pronunciation in a recording.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Recording to analyse. Only WAV files are read (integer PCM of 8 to 32
    /// bits or 32-bit float); convert other formats first. Defaults to
    /// recording.wav
    audio: Option<PathBuf>,

    /// Instruction sent together with the recording
    #[arg(long)]
    prompt: Option<String>,

    /// Language the critique is written in
    #[arg(long)]
    language: Option<String>,

    /// Realtime model identifier
    #[arg(long)]
    model: Option<String>,

    /// Websocket base URL, e.g. wss://api.openai.com/v1
    #[arg(long)]
    base_url: Option<String>,

    /// Give up if no response text arrives within this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // --- 1. Initialize Logging ---
    // Logs go to stderr; stdout carries only the critique.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    // --- 2. Load Configuration ---
    let args = Cli::parse();
    let mut builder = ConfigBuilder::from_env().context("Failed to load configuration")?;
    if let Some(audio) = args.audio {
        builder = builder.with_audio_path(audio);
    }
    if let Some(prompt) = args.prompt.as_deref() {
        builder = builder.with_prompt(prompt);
    }
    if let Some(language) = args.language.as_deref() {
        builder = builder.with_language(language);
    }
    if let Some(model) = args.model.as_deref() {
        builder = builder.with_model(model);
    }
    if let Some(base_url) = args.base_url.as_deref() {
        builder = builder.with_base_url(base_url);
    }
    if let Some(secs) = args.timeout_secs {
        builder = builder.with_response_timeout(Duration::from_secs(secs));
    }
    let config = builder.build().context("Failed to load configuration")?;

    // --- 3. Run the session ---
    match driver::run(&config, std::io::stdout()).await {
        Ok(SessionOutcome::Completed(critique)) => {
            // the critique has already been streamed to stdout
            tracing::info!("critique received: {} chars", critique.text().chars().count());
            Ok(ExitCode::SUCCESS)
        }
        Ok(_) => Ok(ExitCode::FAILURE),
        Err(SessionError::MissingInput(path)) => {
            tracing::error!("input file not found: {}", path.display());
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("Session failed"),
    }
}
