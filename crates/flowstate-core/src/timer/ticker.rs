//! One-second tick delivery.
//!
//! The engine never sleeps. A [`Scheduler`] posts [`Signal::Tick`] into the
//! controller's signal channel; at most one periodic task exists at a time.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error};

use crate::controller::Signal;

/// A single cancellable periodic task.
pub trait Scheduler: Send {
    /// Begin ticking. Replaces any task already running.
    fn start(&mut self);
    /// Stop ticking. No-op when idle.
    fn cancel(&mut self);
    fn is_active(&self) -> bool;
}

/// Tokio-backed scheduler.
pub struct IntervalScheduler {
    tx: UnboundedSender<Signal>,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl IntervalScheduler {
    pub fn new(tx: UnboundedSender<Signal>) -> Self {
        Self::with_period(tx, Duration::from_secs(1))
    }

    pub fn with_period(tx: UnboundedSender<Signal>, period: Duration) -> Self {
        Self {
            tx,
            period,
            task: None,
        }
    }
}

impl Scheduler for IntervalScheduler {
    fn start(&mut self) {
        self.cancel();

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("cannot start ticker outside a tokio runtime: {e}");
                return;
            }
        };

        let tx = self.tx.clone();
        let period = self.period;
        self.task = Some(handle.spawn(async move {
            // First tick one period from now, not immediately.
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(Signal::Tick).is_err() {
                    debug!("signal channel closed, ticker exiting");
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Scheduler that never fires on its own; tests call
/// [`FlowController::handle_signal`](crate::FlowController::handle_signal)
/// with [`Signal::Tick`] directly.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    active: bool,
    pub starts: usize,
    pub cancels: usize,
}

impl Scheduler for ManualScheduler {
    fn start(&mut self) {
        self.active = true;
        self.starts += 1;
    }

    fn cancel(&mut self) {
        if self.active {
            self.cancels += 1;
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
