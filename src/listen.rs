//! Continuous listening loop.
//!
//! [`ListenLoop`] is a finite state machine fed through a single entry point,
//! [`ListenLoop::handle_event`]. One recognition session runs at a time; every
//! session that ends schedules exactly one restart, and teardown cancels any
//! restart still pending.
//!
//! ```text
//! Idle -> Listening -> (Error) -> RestartPending -> Listening -> ...
//!   \-> Unsupported (terminal)          any -> Stopped (teardown)
//! ```

use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::engine::{RecognitionEngine, RecognitionEvent, SynthesisEngine};
use crate::feedback::{Snapshot, Status, feedback_message};
use crate::matcher::{MatchResult, classify, normalize};
use crate::schedule::{Cancel, Scheduler};
use crate::vocabulary::Vocabulary;

/// Everything the loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    /// Emitted by the recognition engine
    Engine(RecognitionEvent),
    /// A scheduled restart fired
    RestartDue { ticket: u64 },
    /// The consumer no longer wants to listen
    Teardown,
}

impl From<RecognitionEvent> for LoopEvent {
    fn from(event: RecognitionEvent) -> Self {
        LoopEvent::Engine(event)
    }
}

pub type EventSender = UnboundedSender<LoopEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenState {
    Idle,
    /// A session was started and has not ended yet
    Listening,
    /// The running session reported an error and has not ended yet
    Error,
    RestartPending,
    /// No recognition capability, nothing will ever be started
    Unsupported,
    Stopped,
}

impl ListenState {
    /// Whether a recognition session is in flight.
    pub fn session_active(self) -> bool {
        matches!(self, ListenState::Listening | ListenState::Error)
    }
}

/// Tunables of the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    /// Language tag for recognition and synthesis
    pub language: String,
    /// Speech rate of the spoken feedback, 1.0 being normal
    pub speech_rate: f32,
    /// Delay between a session ending and the next one starting
    pub restart_delay: Duration,
    /// Extra delay after a session whose feedback was spoken aloud
    pub feedback_hold: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            speech_rate: 0.9,
            restart_delay: Duration::from_secs(1),
            feedback_hold: Duration::ZERO,
        }
    }
}

struct PendingRestart<H> {
    ticket: u64,
    handle: H,
}

pub struct ListenLoop<R, S, C: Scheduler> {
    vocabulary: Vocabulary,
    recognizer: R,
    synthesizer: S,
    scheduler: C,
    settings: LoopSettings,
    state: ListenState,
    snapshot: Snapshot,
    pending: Option<PendingRestart<C::Handle>>,
    next_ticket: u64,
    last_error: Option<String>,
    spoke_feedback: bool,
}

impl<R, S, C> ListenLoop<R, S, C>
where
    R: RecognitionEngine,
    S: SynthesisEngine,
    C: Scheduler,
{
    pub fn new(
        vocabulary: Vocabulary,
        recognizer: R,
        synthesizer: S,
        scheduler: C,
        settings: LoopSettings,
    ) -> Self {
        Self {
            vocabulary,
            recognizer,
            synthesizer,
            scheduler,
            settings,
            state: ListenState::Idle,
            snapshot: Snapshot::default(),
            pending: None,
            next_ticket: 0,
            last_error: None,
            spoke_feedback: false,
        }
    }

    pub fn state(&self) -> ListenState {
        self.state
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Starts listening, or enters the terminal `Unsupported` state when the
    /// recognizer is not available on this host.
    pub fn start(&mut self) {
        if self.state != ListenState::Idle {
            debug!("Loop already started ({:?})", self.state);
            return;
        }
        if !self.recognizer.is_supported() {
            warn!("Speech recognition is not supported, not listening");
            self.state = ListenState::Unsupported;
            self.snapshot.status = Status::Unsupported;
            return;
        }
        self.begin_session();
    }

    /// Feeds one event into the machine.
    ///
    /// Returns the classification when the event was a recognition result, so
    /// the caller can raise its own success notification on exact matches.
    pub fn handle_event(&mut self, event: LoopEvent) -> Option<MatchResult> {
        if matches!(self.state, ListenState::Unsupported | ListenState::Stopped) {
            debug!("Ignoring {event:?} in {:?}", self.state);
            return None;
        }
        match event {
            LoopEvent::Engine(RecognitionEvent::Started) => {
                if self.state.session_active() {
                    self.snapshot.status = Status::Listening;
                }
                None
            }
            LoopEvent::Engine(RecognitionEvent::Result(transcript)) => {
                if !self.state.session_active() {
                    debug!("Result outside of a session: {transcript:?}");
                    return None;
                }
                Some(self.judge(&transcript))
            }
            LoopEvent::Engine(RecognitionEvent::Error(code)) => {
                if self.state.session_active() {
                    warn!("Recognition error: {code}");
                    self.state = ListenState::Error;
                    self.snapshot.status = Status::Error(code.clone());
                    self.last_error = Some(code);
                }
                None
            }
            LoopEvent::Engine(RecognitionEvent::Ended) => {
                if self.state.session_active() {
                    self.schedule_restart();
                } else {
                    debug!("Stray end of session in {:?}", self.state);
                }
                None
            }
            LoopEvent::RestartDue { ticket } => {
                self.restart(ticket);
                None
            }
            LoopEvent::Teardown => {
                self.teardown();
                None
            }
        }
    }

    /// Stops the active session and drops any pending restart.
    pub fn teardown(&mut self) {
        if self.state == ListenState::Stopped {
            return;
        }
        if let Some(pending) = self.pending.take() {
            pending.handle.cancel();
        }
        if self.state.session_active() {
            if let Err(err) = self.recognizer.stop() {
                warn!("Could not stop recognition: {err}");
            }
        }
        info!("Stopped listening");
        self.state = ListenState::Stopped;
        self.snapshot.status = Status::Stopped;
    }

    fn begin_session(&mut self) {
        if self.state.session_active() {
            warn!("A recognition session is already running, not starting another");
            return;
        }
        self.state = ListenState::Listening;
        self.last_error = None;
        self.spoke_feedback = false;
        debug!("Starting recognition session");
        if let Err(err) = self.recognizer.start() {
            // No `Ended` follows a session that never started.
            let code = err.code().to_string();
            warn!("Could not start recognition: {err}");
            self.snapshot.status = Status::Error(code.clone());
            self.last_error = Some(code);
            self.schedule_restart();
        }
    }

    fn judge(&mut self, transcript: &str) -> MatchResult {
        let result = classify(&self.vocabulary, transcript);
        info!("Heard {:?}, judged {:?}", transcript, result);
        self.snapshot.heard = normalize(transcript);
        self.snapshot.feedback = feedback_message(&result);
        self.snapshot.matched = Some(result.is_exact());
        self.synthesizer.speak(
            result.word(),
            &self.settings.language,
            self.settings.speech_rate,
        );
        self.spoke_feedback = true;
        result
    }

    fn schedule_restart(&mut self) {
        if let Some(previous) = self.pending.take() {
            previous.handle.cancel();
        }
        let mut delay = self.settings.restart_delay;
        if self.spoke_feedback {
            delay += self.settings.feedback_hold;
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let handle = self
            .scheduler
            .schedule_after(delay, LoopEvent::RestartDue { ticket });
        self.pending = Some(PendingRestart { ticket, handle });
        self.state = ListenState::RestartPending;
        self.snapshot.status = Status::Restarting {
            last_error: self.last_error.take(),
        };
        debug!("Restart {ticket} scheduled in {delay:?}");
    }

    fn restart(&mut self, ticket: u64) {
        let due = matches!(&self.pending, Some(pending) if pending.ticket == ticket);
        if self.state != ListenState::RestartPending || !due {
            debug!("Dropping stale restart {ticket}");
            return;
        }
        self.pending = None;
        self.begin_session();
    }
}
