//! Recognizer that takes typed lines as utterances.
//!
//! Each session reads exactly one line. A blank line is reported as
//! `no-speech`, the way a microphone recognizer reports silence. End of input
//! asks the loop to tear down.
//!
//! Lines are read on a plain OS thread and forwarded over a channel. A read
//! blocked on an idle terminal then never holds up runtime shutdown.

use std::io::BufRead;
use std::sync::Arc;

use log::{debug, error};
use tokio::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

use crate::engine::{RecognitionEngine, RecognitionEvent};
use crate::error::Error;
use crate::listen::{EventSender, LoopEvent};

type LineReceiver = UnboundedReceiver<std::io::Result<String>>;

pub struct ConsoleEngine {
    lines: Arc<Mutex<LineReceiver>>,
    tx: EventSender,
    session: Option<JoinHandle<()>>,
}

fn forward_lines<Rd: BufRead>(reader: Rd, lines: UnboundedSender<std::io::Result<String>>) {
    for line in reader.lines() {
        let failed = line.is_err();
        if lines.send(line).is_err() || failed {
            return;
        }
    }
    debug!("Input closed");
}

impl ConsoleEngine {
    pub fn stdin(tx: EventSender) -> Self {
        let (line_tx, line_rx) = unbounded_channel();
        std::thread::spawn(move || forward_lines(std::io::stdin().lock(), line_tx));
        Self::from_lines(line_rx, tx)
    }

    /// Reads utterances from `reader` on a dedicated thread.
    pub fn new<Rd>(reader: Rd, tx: EventSender) -> Self
    where
        Rd: BufRead + Send + 'static,
    {
        let (line_tx, line_rx) = unbounded_channel();
        std::thread::spawn(move || forward_lines(reader, line_tx));
        Self::from_lines(line_rx, tx)
    }

    /// Takes utterances from a channel; the channel closing means end of input.
    pub fn from_lines(lines: LineReceiver, tx: EventSender) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
            tx,
            session: None,
        }
    }

    fn running(&self) -> bool {
        self.session.as_ref().is_some_and(|task| !task.is_finished())
    }
}

async fn read_utterance(lines: Arc<Mutex<LineReceiver>>, tx: EventSender) {
    let send = |event: LoopEvent| {
        if let Err(err) = tx.send(event) {
            debug!("Loop is gone, dropping {:?}", err.0);
        }
    };
    send(RecognitionEvent::Started.into());
    let line = lines.lock().await.recv().await;
    match line {
        Some(Ok(line)) if line.trim().is_empty() => {
            send(RecognitionEvent::Error("no-speech".to_string()).into())
        }
        Some(Ok(line)) => send(RecognitionEvent::Result(line).into()),
        None => {
            send(LoopEvent::Teardown);
            return;
        }
        Some(Err(err)) => {
            error!("Could not read input: {err}");
            send(RecognitionEvent::Error("audio-capture".to_string()).into());
        }
    }
    send(RecognitionEvent::Ended.into());
}

impl RecognitionEngine for ConsoleEngine {
    fn start(&mut self) -> Result<(), Error> {
        if self.running() {
            return Err(Error::Recognition("invalid-state".to_string()));
        }
        let lines = self.lines.clone();
        let tx = self.tx.clone();
        self.session = Some(tokio::spawn(read_utterance(lines, tx)));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        if let Some(task) = self.session.take() {
            task.abort();
        }
        Ok(())
    }
}
