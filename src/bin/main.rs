//! Kokoro text-to-speech command line.
//!
//! ```text
//! kokorotts --text "Hello, world." --style af_heart
//! ```
//!
//! Requires the `cli` feature (which implies `espeak`):
//! `cargo run --features cli -- --text "..."`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kokorotts::{phonemize, write_wav, Kokoro};

/// Kokoro TTS — text in, 24 kHz WAV out.
#[derive(Debug, Parser)]
#[command(name = "kokorotts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// ONNX model file
    #[arg(short, long, default_value = "models/kokoro.onnx")]
    model: PathBuf,

    /// Vocabulary file (symbol → id JSON object)
    #[arg(short = 'c', long, default_value = "models/vocab.json")]
    vocab: PathBuf,

    /// Voice directory (one JSON style table per file)
    #[arg(short = 'v', long, default_value = "voices")]
    voices: PathBuf,

    /// Text to speak
    #[arg(short, long)]
    text: String,

    /// Style name
    #[arg(short, long, default_value = "af_heart")]
    style: String,

    /// Output WAV path
    #[arg(short, long, default_value = "output.wav")]
    output: PathBuf,

    /// Speed scalar passed to the model
    #[arg(long, default_value_t = 1)]
    speed: i32,

    /// Apply the spectral post-filter to the generated waveform
    #[arg(long)]
    post_filter: bool,

    /// Log filter (e.g. "info", "kokorotts=debug")
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if !phonemize::is_espeak_available() {
        anyhow::bail!(
            "espeak-ng failed to initialise — install it (apt install espeak-ng / \
             brew install espeak-ng) or set the data path"
        );
    }

    let tts = Kokoro::load(&cli.model, &cli.vocab, &cli.voices)?;
    info!(styles = ?tts.available_styles(), "ready");

    let phonemizer = phonemize::EspeakBackend::new(phonemize::EN_US)?;
    let audio = tts.synthesize(&cli.text, &cli.style, cli.speed, &phonemizer)?;

    let audio = if cli.post_filter {
        tts.post_filter().process(&audio)
    } else {
        audio
    };

    write_wav(&audio, &cli.output)?;
    Ok(())
}
