//! Configuration management for the sayword application.
//!
//! This module provides functionality for loading and managing application
//! configuration, including the exercise vocabulary, the speech backends and
//! the restart policy of the listen loop.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::listen::LoopSettings;
use crate::vocabulary::{DEFAULT_WORDS, Vocabulary};

/// Recognition backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RecognitionBackend {
    /// Read typed utterances from standard input
    Console,
    /// Transcribe microphone input with a Whisper model
    Whisper(WhisperConfig),
}

/// Whisper backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct WhisperConfig {
    /// Model repository on Hugging Face
    pub repo: String,
    /// Model filename
    pub filename: String,
    /// Audio input device name (e.g., "sysdefault:CARD=C920")
    /// If not specified, the default device will be used
    pub device: Option<String>,
    /// RMS level above which a frame counts as speech
    pub threshold: f32,
    /// Trailing silence that ends an utterance, in milliseconds
    pub silence_ms: u64,
    /// Give up with `no-speech` when nothing is said for this long
    pub no_speech_timeout_ms: u64,
    /// Hard cap on one utterance
    pub max_utterance_ms: u64,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            repo: "ggerganov/whisper.cpp".to_string(),
            filename: "ggml-base.en.bin".to_string(),
            device: None,
            threshold: 0.02,
            silence_ms: 800,
            no_speech_timeout_ms: 8000,
            max_utterance_ms: 6000,
        }
    }
}

/// Recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct RecognitionConfig {
    /// Language tag used for recognition and spoken feedback
    pub language: String,
    pub backend: RecognitionBackend,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            backend: RecognitionBackend::Console,
        }
    }
}

/// Speech synthesis backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SynthesisBackend {
    /// Run a text to speech program, see [`crate::synth::CommandSynth`]
    Command {
        program: String,
        args: Vec<String>,
        /// Words per minute at rate 1.0
        base_wpm: u32,
    },
    /// Only log what would be said
    Log,
}

/// Synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct SynthesisConfig {
    /// Speech rate, 1.0 is normal speed
    pub rate: f32,
    pub backend: SynthesisBackend,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            rate: 0.9,
            backend: SynthesisBackend::Command {
                program: "espeak-ng".to_string(),
                args: ["-v", "{language}", "-s", "{wpm}", "{text}"]
                    .iter()
                    .map(|a| a.to_string())
                    .collect(),
                base_wpm: 175,
            },
        }
    }
}

/// Restart policy of the listen loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct RestartConfig {
    /// Delay before listening again after a session ended
    pub delay_ms: u64,
    /// Additional delay after feedback was spoken, so playback is not picked up
    pub feedback_hold_ms: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            feedback_hold_ms: 0,
        }
    }
}

/// Exercise content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct ExerciseConfig {
    pub vocabulary: Vec<String>,
}

impl Default for ExerciseConfig {
    fn default() -> Self {
        Self {
            vocabulary: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Feedback channels outside the terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct FeedbackConfig {
    /// Show a desktop notification on correct pronunciation
    pub notify: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self { notify: true }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Config {
    pub recognition: RecognitionConfig,
    pub synthesis: SynthesisConfig,
    pub restart: RestartConfig,
    pub exercise: ExerciseConfig,
    pub feedback: FeedbackConfig,
}

impl Config {
    /// Gets the default configuration file path.
    fn default_config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .context("Cannot find config directory")
            .unwrap_or_else(|_| PathBuf::from("~/.config"));
        let mut path = config_dir;
        path.push("sayword");
        path.push("config.toml");
        path
    }

    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents).map_err(|err| {
            Error::Config(format!("{}: {}", path.as_ref().display(), err.message()))
        })?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Loads configuration from the default location, creating it if it doesn't exist.
    pub fn load_or_write_default(path: Option<&Path>) -> Result<Self> {
        let default_path = Self::default_config_path();
        let path = path.unwrap_or(&default_path);
        if path.exists() {
            return Self::from_file(path)
                .context(format!("Reading default config from {}", path.display()));
        }

        let config = Self::default();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config.save_to_file(path)?;
        Ok(config)
    }

    /// Validated vocabulary of the exercise.
    pub fn vocabulary(&self) -> Result<Vocabulary> {
        Vocabulary::new(&self.exercise.vocabulary).context("Invalid exercise vocabulary")
    }

    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            language: self.recognition.language.clone(),
            speech_rate: self.synthesis.rate,
            restart_delay: Duration::from_millis(self.restart.delay_ms),
            feedback_hold: Duration::from_millis(self.restart.feedback_hold_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.recognition.language, "en-US");
        assert!(matches!(
            config.recognition.backend,
            RecognitionBackend::Console
        ));
        assert_eq!(config.synthesis.rate, 0.9);
        assert_eq!(config.restart.delay_ms, 1000);
        assert_eq!(config.restart.feedback_hold_ms, 0);
        assert_eq!(config.exercise.vocabulary.len(), 10);
        assert!(config.feedback.notify);
        assert_eq!(config.loop_settings(), LoopSettings::default());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("language = \"en-US\""));
        assert!(toml.contains("type = \"console\""));
        assert!(toml.contains("type = \"command\""));
        assert!(toml.contains("program = \"espeak-ng\""));
        assert!(toml.contains("delay_ms = 1000"));
        assert!(toml.contains("\"elephant\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [recognition]
            language = "en-GB"
            backend = { type = "whisper", repo = "test/repo", filename = "test.bin", threshold = 0.05, silence_ms = 500, no_speech_timeout_ms = 4000, max_utterance_ms = 3000 }

            [synthesis]
            rate = 0.75
            backend = { type = "log" }

            [restart]
            delay_ms = 250
            feedback_hold_ms = 1200

            [exercise]
            vocabulary = ["cat", "dog"]

            [feedback]
            notify = false
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.recognition.language, "en-GB");
        match &config.recognition.backend {
            RecognitionBackend::Whisper(whisper) => {
                assert_eq!(whisper.repo, "test/repo");
                assert_eq!(whisper.filename, "test.bin");
                assert_eq!(whisper.device, None);
                assert_eq!(whisper.silence_ms, 500);
            }
            other => panic!("unexpected backend {other:?}"),
        }
        assert!(matches!(config.synthesis.backend, SynthesisBackend::Log));
        assert!(!config.feedback.notify);

        let settings = config.loop_settings();
        assert_eq!(settings.language, "en-GB");
        assert_eq!(settings.speech_rate, 0.75);
        assert_eq!(settings.restart_delay, Duration::from_millis(250));
        assert_eq!(settings.feedback_hold, Duration::from_millis(1200));
        assert_eq!(
            config.vocabulary().unwrap().iter().collect::<Vec<_>>(),
            vec!["cat", "dog"]
        );
    }

    #[test]
    fn test_invalid_vocabulary() {
        let mut config = Config::default();
        config.exercise.vocabulary = vec!["cat".to_string(), "Cat".to_string()];
        assert!(config.vocabulary().is_err());
    }

    #[test]
    fn test_invalid_config() {
        let toml = r#"
            [restart]
            delay_ms = "soon"
            feedback_hold_ms = 0
        "#;

        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_config_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[restart]\ndelay_ms = \"soon\"\n").unwrap();

        let err = Config::load_or_write_default(Some(&config_path)).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::Config(msg)) => assert!(msg.contains("config.toml")),
            other => panic!("expected a config error, got {other:?}"),
        }
        // The broken file is left alone.
        let contents = std::fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("soon"));
    }

    #[test]
    fn test_unknown_backend() {
        let toml = r#"
            [recognition]
            language = "en-US"
            backend = { type = "webkit" }
        "#;

        let result: Result<RecognitionConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.recognition.backend = RecognitionBackend::Whisper(WhisperConfig::default());
        config.restart.feedback_hold_ms = 1500;
        config.exercise.vocabulary = vec!["hello".to_string(), "water".to_string()];

        config.save_to_file(&config_path).unwrap();
        let loaded_config = Config::from_file(&config_path).unwrap();

        assert_eq!(loaded_config, config);
    }

    #[test]
    fn test_config_creation() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("sayword").join("config.toml");

        let config = Config::load_or_write_default(Some(&config_path)).unwrap();
        assert!(config_path.exists());
        assert_eq!(config, Config::default());

        // Second call reads the file back instead of rewriting it.
        let again = Config::load_or_write_default(Some(&config_path)).unwrap();
        assert_eq!(again, config);
    }
}
