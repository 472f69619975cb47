//! Deferred delivery of loop events.
//!
//! Restarts go through a [`Scheduler`] so the loop never sleeps itself and
//! tests can decide when time passes.

use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;

use crate::listen::{EventSender, LoopEvent};

/// Handle to a scheduled action.
pub trait Cancel {
    /// Prevents the action from firing. No-op if it already fired.
    fn cancel(self);
}

pub trait Scheduler {
    type Handle: Cancel;

    /// Delivers `event` back to the loop once `delay` has elapsed.
    fn schedule_after(&mut self, delay: Duration, event: LoopEvent) -> Self::Handle;
}

/// Scheduler backed by tokio timers, posting onto the host's event channel.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    tx: EventSender,
}

impl TokioScheduler {
    pub fn new(tx: EventSender) -> Self {
        Self { tx }
    }
}

#[derive(Debug)]
pub struct TimerHandle(JoinHandle<()>);

impl Cancel for TimerHandle {
    fn cancel(self) {
        self.0.abort();
    }
}

impl Scheduler for TokioScheduler {
    type Handle = TimerHandle;

    fn schedule_after(&mut self, delay: Duration, event: LoopEvent) -> TimerHandle {
        let tx = self.tx.clone();
        TimerHandle(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = tx.send(event) {
                debug!("Loop is gone, dropping scheduled {:?}", err.0);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test(start_paused = true)]
    async fn test_event_fires_after_delay() {
        let (tx, mut rx) = unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);
        let started = tokio::time::Instant::now();
        let _handle =
            scheduler.schedule_after(Duration::from_secs(1), LoopEvent::RestartDue { ticket: 7 });

        let event = rx.recv().await.unwrap();
        assert_eq!(event, LoopEvent::RestartDue { ticket: 7 });
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_event_never_fires() {
        let (tx, mut rx) = unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);
        let handle =
            scheduler.schedule_after(Duration::from_secs(1), LoopEvent::RestartDue { ticket: 1 });
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
