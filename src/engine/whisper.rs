//! Microphone recognizer backed by a local Whisper model.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::task::JoinHandle;

use crate::asr::{Asr, download_model};
use crate::audio::{Capture, SAMPLE_RATE};
use crate::config::WhisperConfig;
use crate::endpoint::{EndpointConfig, Endpointer, Progress};
use crate::engine::{RecognitionEngine, RecognitionEvent};
use crate::error::Error;
use crate::listen::{EventSender, LoopEvent};
use crate::vocabulary::Vocabulary;

struct Session {
    // Dropping the stream releases the microphone.
    _stream: cpal::Stream,
    task: JoinHandle<()>,
}

pub struct WhisperEngine {
    capture: Option<Capture>,
    asr: Arc<Asr>,
    endpoint: EndpointConfig,
    tx: EventSender,
    session: Option<Session>,
}

impl WhisperEngine {
    pub async fn new(
        config: &WhisperConfig,
        language: &str,
        vocabulary: &Vocabulary,
        tx: EventSender,
    ) -> Result<Self> {
        let capture = Capture::new(config.device.as_deref())?;
        let model_path = download_model(config)
            .await
            .context("Failed to download model")?;
        let prompt = vocabulary.iter().collect::<Vec<_>>().join(", ");
        let asr = Asr::load(&model_path, prompt, language)?;
        Ok(Self {
            capture,
            asr: Arc::new(asr),
            endpoint: config.into(),
            tx,
            session: None,
        })
    }
}

async fn run_session(
    mut audio: UnboundedReceiver<Vec<f32>>,
    endpoint: EndpointConfig,
    asr: Arc<Asr>,
    tx: EventSender,
) {
    let send = |event: RecognitionEvent| {
        if let Err(err) = tx.send(LoopEvent::Engine(event)) {
            debug!("Loop is gone, dropping {:?}", err.0);
        }
    };
    send(RecognitionEvent::Started);

    let mut endpointer = Endpointer::new(&endpoint, SAMPLE_RATE);
    let mut outcome = None;
    while let Some(chunk) = audio.recv().await {
        match endpointer.push(&chunk) {
            Progress::Continue => continue,
            progress => {
                outcome = Some(progress);
                break;
            }
        }
    }
    drop(audio);

    let event = match outcome {
        Some(Progress::Utterance(samples)) => {
            info!("Transcribing audio...");
            match tokio::task::spawn_blocking(move || asr.run(&samples)).await {
                Ok(Ok(text)) if text.is_empty() => RecognitionEvent::Error("no-speech".to_string()),
                Ok(Ok(text)) => RecognitionEvent::Result(text),
                Ok(Err(err)) => {
                    error!("Error running ASR {err:?}");
                    RecognitionEvent::Error("aborted".to_string())
                }
                Err(err) => {
                    error!("Transcription task failed: {err}");
                    RecognitionEvent::Error("aborted".to_string())
                }
            }
        }
        Some(_) => RecognitionEvent::Error("no-speech".to_string()),
        None => RecognitionEvent::Error("audio-capture".to_string()),
    };
    send(event);
    send(RecognitionEvent::Ended);
}

impl RecognitionEngine for WhisperEngine {
    fn is_supported(&self) -> bool {
        self.capture.is_some()
    }

    fn start(&mut self) -> Result<(), Error> {
        if self
            .session
            .as_ref()
            .is_some_and(|session| !session.task.is_finished())
        {
            return Err(Error::Recognition("invalid-state".to_string()));
        }
        // Release the microphone of the previous session before reopening it.
        self.session = None;
        let capture = self.capture.as_ref().ok_or(Error::Unsupported)?;
        let (audio_tx, audio_rx) = unbounded_channel();
        let stream = capture.open(audio_tx).map_err(|err| {
            error!("Cannot open microphone: {err:?}");
            Error::Recognition("audio-capture".to_string())
        })?;
        let task = tokio::spawn(run_session(
            audio_rx,
            self.endpoint.clone(),
            self.asr.clone(),
            self.tx.clone(),
        ));
        self.session = Some(Session {
            _stream: stream,
            task,
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        if let Some(session) = self.session.take() {
            session.task.abort();
        }
        Ok(())
    }
}
