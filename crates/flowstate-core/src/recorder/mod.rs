//! Turns a confirmed [`CompletionRequest`] into a stored session.
//!
//! Recording runs as a detached tokio task. The caller does not wait for it:
//! the timer moves on to the break immediately and the outcome arrives later
//! as a [`Signal::Recorded`]. Failures are logged and reported, never retried.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api::{NewSession, SessionApi, SessionRecord};
use crate::controller::Signal;
use crate::timer::CompletionRequest;

/// Result of one recording attempt, as delivered back to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Saved {
        session_id: String,
        duration_minutes: u64,
        today_count: u32,
    },
    Failed {
        message: String,
    },
}

pub struct SessionRecorder {
    api: Arc<dyn SessionApi>,
    today: Arc<AtomicU32>,
    signals: Option<UnboundedSender<Signal>>,
}

impl SessionRecorder {
    pub fn new(api: Arc<dyn SessionApi>) -> Self {
        Self {
            api,
            today: Arc::new(AtomicU32::new(0)),
            signals: None,
        }
    }

    /// Report outcomes as [`Signal::Recorded`] on `tx`.
    pub fn with_signals(mut self, tx: UnboundedSender<Signal>) -> Self {
        self.signals = Some(tx);
        self
    }

    /// Sessions saved since this recorder was created.
    pub fn today_count(&self) -> u32 {
        self.today.load(Ordering::SeqCst)
    }

    /// Body sent for `request`: a blank note becomes the status default.
    pub fn payload(request: &CompletionRequest, category_id: Option<i64>) -> NewSession {
        let note = request.note.trim();
        NewSession {
            duration_minutes: request.elapsed_minutes,
            status: request.status,
            note: if note.is_empty() {
                request.status.default_note().to_string()
            } else {
                note.to_string()
            },
            category_id,
        }
    }

    /// Spawn the create-session call. Must be called inside a tokio runtime.
    pub fn record(
        &self,
        request: CompletionRequest,
        category_id: Option<i64>,
    ) -> JoinHandle<RecordOutcome> {
        let body = Self::payload(&request, category_id);
        let api = Arc::clone(&self.api);
        let today = Arc::clone(&self.today);
        let signals = self.signals.clone();

        tokio::spawn(async move {
            let outcome = match api.create_session(&body).await {
                Ok(record) => saved(record, &body, &today),
                Err(e) => {
                    error!("failed to save session: {e}");
                    RecordOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };
            if let Some(tx) = signals {
                // The controller may already be gone; the outcome is still returned.
                let _ = tx.send(Signal::Recorded(outcome.clone()));
            }
            outcome
        })
    }
}

fn saved(record: SessionRecord, body: &NewSession, today: &AtomicU32) -> RecordOutcome {
    let today_count = today.fetch_add(1, Ordering::SeqCst) + 1;
    info!(
        session_id = %record.id,
        minutes = body.duration_minutes,
        today_count,
        "session recorded"
    );
    RecordOutcome::Saved {
        session_id: record.id,
        duration_minutes: body.duration_minutes,
        today_count,
    }
}
