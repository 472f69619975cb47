//! Spoken feedback.
//!
//! Speech is fire-and-forget: failures are logged and never reach the loop.

use log::{debug, info, warn};
use tokio::process::{Child, Command};

use crate::config::{SynthesisBackend, SynthesisConfig};
use crate::engine::SynthesisEngine;
use crate::error::Error;

/// Runs an external text to speech program for every phrase.
///
/// Arguments are templates, `{text}`, `{language}`, `{rate}` and `{wpm}` are
/// substituted before spawning.
#[derive(Debug, Clone)]
pub struct CommandSynth {
    program: String,
    args: Vec<String>,
    base_wpm: u32,
}

impl CommandSynth {
    pub fn new(program: impl Into<String>, args: Vec<String>, base_wpm: u32) -> Self {
        Self {
            program: program.into(),
            args,
            base_wpm,
        }
    }

    fn expand_args(&self, text: &str, language: &str, rate: f32) -> Vec<String> {
        let wpm = (self.base_wpm as f32 * rate).round() as u32;
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{language}", &language.to_lowercase())
                    .replace("{rate}", &rate.to_string())
                    .replace("{wpm}", &wpm.to_string())
                    .replace("{text}", text)
            })
            .collect()
    }

    fn spawn(&self, text: &str, language: &str, rate: f32) -> Result<Child, Error> {
        let args = self.expand_args(text, language, rate);
        debug!("Running {} {:?}", self.program, args);
        Command::new(&self.program)
            .args(&args)
            .kill_on_drop(false)
            .spawn()
            .map_err(|err| Error::Synthesis(format!("cannot run {}: {err}", self.program)))
    }
}

impl SynthesisEngine for CommandSynth {
    fn speak(&mut self, text: &str, language: &str, rate: f32) {
        match self.spawn(text, language, rate) {
            Ok(mut child) => {
                let program = self.program.clone();
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if !status.success() => {
                            warn!("{program} exited with {status}")
                        }
                        Ok(_) => {}
                        Err(err) => warn!("Could not wait for {program}: {err}"),
                    }
                });
            }
            Err(err) => warn!("{err}"),
        }
    }
}

/// Logs phrases instead of speaking them.
#[derive(Debug, Default, Clone)]
pub struct LogSynth;

impl SynthesisEngine for LogSynth {
    fn speak(&mut self, text: &str, language: &str, rate: f32) {
        info!("Say ({language}, x{rate}): {text}");
    }
}

/// Builds the synthesizer selected in the configuration.
pub fn from_config(config: &SynthesisConfig) -> Box<dyn SynthesisEngine> {
    match &config.backend {
        SynthesisBackend::Command {
            program,
            args,
            base_wpm,
        } => Box::new(CommandSynth::new(program.clone(), args.clone(), *base_wpm)),
        SynthesisBackend::Log => Box::new(LogSynth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_args() {
        let synth = CommandSynth::new(
            "espeak-ng",
            vec![
                "-v".to_string(),
                "{language}".to_string(),
                "-s".to_string(),
                "{wpm}".to_string(),
                "{text}".to_string(),
            ],
            200,
        );
        assert_eq!(
            synth.expand_args("banana split", "en-US", 0.9),
            vec!["-v", "en-us", "-s", "180", "banana split"]
        );
    }

    #[test]
    fn test_rate_placeholder() {
        let synth = CommandSynth::new("say", vec!["--rate={rate}".to_string()], 175);
        assert_eq!(synth.expand_args("cat", "en-US", 1.0), vec!["--rate=1"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_not_fatal() {
        let mut synth = CommandSynth::new("sayword-no-such-program", vec![], 175);
        synth.speak("cat", "en-US", 0.9);
    }

    #[tokio::test]
    async fn test_missing_program_is_a_synthesis_error() {
        let synth = CommandSynth::new("sayword-no-such-program", vec![], 175);
        let err = synth.spawn("cat", "en-US", 0.9).unwrap_err();
        assert!(matches!(err, Error::Synthesis(_)));
        assert_eq!(err.code(), "synthesis");
        assert!(err.to_string().contains("sayword-no-such-program"));
    }
}
