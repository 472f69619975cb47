//! Speech capabilities the listen loop depends on.
//!
//! The loop only relies on the contracts below. Concrete recognizers post
//! their [`RecognitionEvent`]s on the host's event channel, the loop never
//! polls them.

use crate::error::Error;

pub mod console;
#[cfg(feature = "whisper")]
pub mod whisper;

/// Events a recognition session emits, in order: `Started`, at most one
/// `Result` or `Error`, then `Ended`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    Result(String),
    Error(String),
    Ended,
}

/// One-utterance-per-session speech recognizer.
pub trait RecognitionEngine {
    /// Whether the capability exists on this host at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Begins one recognition session.
    fn start(&mut self) -> Result<(), Error>;

    /// Ends the active session, if any.
    fn stop(&mut self) -> Result<(), Error>;
}

/// Fire-and-forget text to speech.
pub trait SynthesisEngine {
    fn speak(&mut self, text: &str, language: &str, rate: f32);
}

impl<T: RecognitionEngine + ?Sized> RecognitionEngine for Box<T> {
    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    fn start(&mut self) -> Result<(), Error> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<(), Error> {
        (**self).stop()
    }
}

impl<T: SynthesisEngine + ?Sized> SynthesisEngine for Box<T> {
    fn speak(&mut self, text: &str, language: &str, rate: f32) {
        (**self).speak(text, language, rate)
    }
}

/// Recognizer standing in for a backend this build or host cannot provide.
#[derive(Debug, Default)]
pub struct Unavailable;

impl RecognitionEngine for Unavailable {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self) -> Result<(), Error> {
        Err(Error::Unsupported)
    }

    fn stop(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
