use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use sayword::app::App;
use sayword::config::{Config, RecognitionBackend, SynthesisBackend, WhisperConfig};
use sayword::logging::init_logging;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Engine {
    Console,
    Whisper,
}

/// Speech practice: say a word, hear how it should sound.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file, defaults to the user config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma separated words to practice, overrides the configured vocabulary
    #[arg(short, long, value_delimiter = ',')]
    words: Option<Vec<String>>,

    /// Recognition backend, overrides the configured one
    #[arg(short, long, value_enum)]
    engine: Option<Engine>,

    /// Log the feedback instead of speaking it
    #[arg(long)]
    silent: bool,

    /// More logging, repeat for more (-vvv includes the recognizer backends)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn apply(args: Args, mut config: Config) -> Config {
    if let Some(words) = args.words {
        config.exercise.vocabulary = words;
    }
    match args.engine {
        Some(Engine::Console) => config.recognition.backend = RecognitionBackend::Console,
        Some(Engine::Whisper) => {
            if !matches!(config.recognition.backend, RecognitionBackend::Whisper(_)) {
                config.recognition.backend =
                    RecognitionBackend::Whisper(WhisperConfig::default());
            }
        }
        None => {}
    }
    if args.silent {
        config.synthesis.backend = SynthesisBackend::Log;
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => {
            Config::from_file(path).context(format!("Reading config {}", path.display()))?
        }
        None => Config::load_or_write_default(None)?,
    };
    let config = apply(args, config);
    info!("Using recognition backend {:?}", config.recognition.backend);

    let mut app = App::with_config(config).await?;
    app.run().await
}
