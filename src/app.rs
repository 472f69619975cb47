//! Main application logic.
//!
//! This module wires the configuration, the speech engines and the listen loop
//! together, and drives the loop from a single event channel.

use std::io::Write;

use anyhow::{Context, Result};
use log::{error, info};
use notify_rust::Notification;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::sync::watch;

use crate::config::{Config, RecognitionBackend};
use crate::engine::console::ConsoleEngine;
use crate::engine::{RecognitionEngine, SynthesisEngine};
use crate::error::Error;
use crate::feedback::{Snapshot, Status, error_notice, success_notice};
use crate::listen::{EventSender, ListenLoop, ListenState, LoopEvent};
use crate::schedule::TokioScheduler;
use crate::synth;
use crate::vocabulary::Vocabulary;

type Loop = ListenLoop<Box<dyn RecognitionEngine>, Box<dyn SynthesisEngine>, TokioScheduler>;

/// Main application struct that coordinates all components.
pub struct App {
    listen: Loop,
    config: Config,
    rx: UnboundedReceiver<LoopEvent>,
    snapshots: watch::Sender<Snapshot>,
    out: Box<dyn Write + Send>,
}

async fn recognizer_from_config(
    config: &Config,
    vocabulary: &Vocabulary,
    tx: EventSender,
) -> Result<Box<dyn RecognitionEngine>> {
    match &config.recognition.backend {
        RecognitionBackend::Console => Ok(Box::new(ConsoleEngine::stdin(tx))),
        #[cfg(feature = "whisper")]
        RecognitionBackend::Whisper(whisper) => {
            let engine = crate::engine::whisper::WhisperEngine::new(
                whisper,
                &config.recognition.language,
                vocabulary,
                tx,
            )
            .await?;
            Ok(Box::new(engine))
        }
        #[cfg(not(feature = "whisper"))]
        RecognitionBackend::Whisper(_) => {
            let _ = (vocabulary, tx);
            error!("This build has no whisper support, rebuild with `--features whisper`");
            Ok(Box::new(crate::engine::Unavailable))
        }
    }
}

impl App {
    /// Creates a new App instance, building the engines the configuration selects.
    pub async fn with_config(config: Config) -> Result<Self> {
        let vocabulary = config.vocabulary()?;
        let (tx, rx) = unbounded_channel();
        let recognizer = recognizer_from_config(&config, &vocabulary, tx.clone())
            .await
            .context("Setting up speech recognition")?;
        Ok(Self::assemble(config, vocabulary, recognizer, tx, rx))
    }

    /// Creates an App around the recognizer `make` returns for the loop's
    /// event sender. The configured recognition backend is not used.
    pub fn with_recognizer<F>(config: Config, make: F) -> Result<Self>
    where
        F: FnOnce(EventSender) -> Box<dyn RecognitionEngine>,
    {
        let vocabulary = config.vocabulary()?;
        let (tx, rx) = unbounded_channel();
        let recognizer = make(tx.clone());
        Ok(Self::assemble(config, vocabulary, recognizer, tx, rx))
    }

    fn assemble(
        config: Config,
        vocabulary: Vocabulary,
        recognizer: Box<dyn RecognitionEngine>,
        tx: EventSender,
        rx: UnboundedReceiver<LoopEvent>,
    ) -> Self {
        let synthesizer = synth::from_config(&config.synthesis);
        let listen = ListenLoop::new(
            vocabulary,
            recognizer,
            synthesizer,
            TokioScheduler::new(tx),
            config.loop_settings(),
        );
        let (snapshots, _) = watch::channel(listen.snapshot().clone());
        Self {
            listen,
            config,
            rx,
            snapshots,
            out: Box::new(std::io::stdout()),
        }
    }

    /// Sends the transcript and feedback lines to `out` instead of stdout.
    pub fn with_output(mut self, out: impl Write + Send + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    /// Receiver of the loop's snapshot, updated after every event.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Runs until the input ends or Ctrl-C is pressed.
    ///
    /// Fails with [`Error::Unsupported`] when there is no way to listen.
    pub async fn run(&mut self) -> Result<()> {
        info!("{}", self.listen.vocabulary().hint(5));
        self.listen.start();
        self.publish();
        if self.listen.state() == ListenState::Unsupported {
            self.notify("Speech practice", &Status::Unsupported.to_string());
            return Err(Error::Unsupported.into());
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            let event = tokio::select! {
                event = self.rx.recv() => match event {
                    Some(event) => event,
                    None => LoopEvent::Teardown,
                },
                _ = &mut ctrl_c => LoopEvent::Teardown,
            };
            let previous = self.listen.snapshot().status.clone();
            if let Some(result) = self.listen.handle_event(event) {
                let snapshot = self.listen.snapshot();
                let lines = format!("You said: {}\n{}", snapshot.heard, snapshot.feedback);
                self.say(&lines);
                if let Some(notice) = success_notice(&result) {
                    info!("{notice}");
                    self.notify("Correct!", &notice);
                }
            }
            let failure = match &self.listen.snapshot().status {
                status @ Status::Error(code) if *status != previous => Some(error_notice(code)),
                _ => None,
            };
            if let Some(notice) = failure {
                self.say(&notice);
                self.notify("Recognition error", &notice);
            }
            self.publish();
            if self.listen.state() == ListenState::Stopped {
                break;
            }
        }

        info!("Done exiting");
        Ok(())
    }

    fn say(&mut self, lines: &str) {
        if let Err(err) = writeln!(self.out, "{lines}").and_then(|_| self.out.flush()) {
            error!("Cannot write output: {err}");
        }
    }

    fn publish(&self) {
        let snapshot = self.listen.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == *snapshot {
                return false;
            }
            if current.status != snapshot.status {
                info!("{}", snapshot.status);
            }
            *current = snapshot.clone();
            true
        });
    }

    fn notify(&self, summary: &str, content: &str) {
        if self.config.feedback.notify {
            if let Err(err) = Notification::new()
                .summary(summary)
                .body(content)
                .icon("audio-input-microphone")
                .show()
            {
                error!("Cannot show notification: {err} , content was : {summary} {content}")
            };
        }
    }
}
