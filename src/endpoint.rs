//! Energy based utterance endpointing.
//!
//! Decides when a single spoken utterance is complete: speech is any chunk
//! whose RMS level reaches the threshold, and the utterance ends after enough
//! trailing silence or when it grows past the maximum length.

use std::time::Duration;

use crate::config::WhisperConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointConfig {
    pub threshold: f32,
    pub silence: Duration,
    pub no_speech_timeout: Duration,
    pub max_utterance: Duration,
}

impl From<&WhisperConfig> for EndpointConfig {
    fn from(config: &WhisperConfig) -> Self {
        Self {
            threshold: config.threshold,
            silence: Duration::from_millis(config.silence_ms),
            no_speech_timeout: Duration::from_millis(config.no_speech_timeout_ms),
            max_utterance: Duration::from_millis(config.max_utterance_ms),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Progress {
    /// Keep feeding audio
    Continue,
    /// The utterance is complete
    Utterance(Vec<f32>),
    /// Nothing was said before the timeout
    NoSpeech,
}

pub struct Endpointer {
    threshold: f32,
    silence_samples: usize,
    no_speech_samples: usize,
    max_samples: usize,
    samples: Vec<f32>,
    heard_speech: bool,
    silent_run: usize,
    seen: usize,
}

fn samples_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_millis() * sample_rate as u128 / 1000) as usize
}

pub fn rms(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    let energy: f32 = chunk.iter().map(|s| s * s).sum();
    (energy / chunk.len() as f32).sqrt()
}

impl Endpointer {
    pub fn new(config: &EndpointConfig, sample_rate: u32) -> Self {
        Self {
            threshold: config.threshold,
            silence_samples: samples_for(config.silence, sample_rate),
            no_speech_samples: samples_for(config.no_speech_timeout, sample_rate),
            max_samples: samples_for(config.max_utterance, sample_rate),
            samples: Vec::new(),
            heard_speech: false,
            silent_run: 0,
            seen: 0,
        }
    }

    pub fn push(&mut self, chunk: &[f32]) -> Progress {
        self.seen += chunk.len();
        if rms(chunk) >= self.threshold {
            self.heard_speech = true;
            self.silent_run = 0;
        } else if self.heard_speech {
            self.silent_run += chunk.len();
        }

        if self.heard_speech {
            self.samples.extend_from_slice(chunk);
            if self.silent_run >= self.silence_samples || self.samples.len() >= self.max_samples {
                return Progress::Utterance(std::mem::take(&mut self.samples));
            }
        } else if self.seen >= self.no_speech_samples {
            return Progress::NoSpeech;
        }
        Progress::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 1000;

    fn config() -> EndpointConfig {
        EndpointConfig {
            threshold: 0.1,
            silence: Duration::from_millis(300),
            no_speech_timeout: Duration::from_millis(1000),
            max_utterance: Duration::from_millis(2000),
        }
    }

    fn loud() -> Vec<f32> {
        vec![0.5; 100]
    }

    fn quiet() -> Vec<f32> {
        vec![0.0; 100]
    }

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms(&[0.5, -0.5]), 0.5);
    }

    #[test]
    fn test_utterance_ends_after_silence() {
        let mut endpointer = Endpointer::new(&config(), RATE);
        assert_eq!(endpointer.push(&quiet()), Progress::Continue);
        assert_eq!(endpointer.push(&loud()), Progress::Continue);
        assert_eq!(endpointer.push(&loud()), Progress::Continue);
        assert_eq!(endpointer.push(&quiet()), Progress::Continue);
        assert_eq!(endpointer.push(&quiet()), Progress::Continue);
        match endpointer.push(&quiet()) {
            // Leading silence is dropped, trailing silence kept.
            Progress::Utterance(samples) => assert_eq!(samples.len(), 500),
            other => panic!("expected an utterance, got {other:?}"),
        }
    }

    #[test]
    fn test_no_speech_timeout() {
        let mut endpointer = Endpointer::new(&config(), RATE);
        for _ in 0..9 {
            assert_eq!(endpointer.push(&quiet()), Progress::Continue);
        }
        assert_eq!(endpointer.push(&quiet()), Progress::NoSpeech);
    }

    #[test]
    fn test_max_utterance() {
        let mut endpointer = Endpointer::new(&config(), RATE);
        for _ in 0..19 {
            assert_eq!(endpointer.push(&loud()), Progress::Continue);
        }
        assert!(matches!(endpointer.push(&loud()), Progress::Utterance(s) if s.len() == 2000));
    }
}
