//! Focus/break countdown state machine.
//!
//! The engine counts ticks, not wall-clock time: every [`FocusTimer::tick`]
//! removes exactly one second. It owns no thread or timer of its own -- a
//! [`Scheduler`](super::Scheduler) delivers the ticks, and the
//! [`FlowController`](crate::FlowController) feeds in fresh durations at mode
//! transitions.
//!
//! ## State Transitions
//!
//! ```text
//! FocusIdle --start--> FocusRunning <--toggle--> FocusPaused
//! FocusRunning --finish (>= 1 min)--> AwaitingCompletion --confirm--> BreakRunning
//! FocusRunning --finish (< 1 min)--> FocusIdle
//! BreakRunning --reaches 0--> FocusRunning
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Focus,
    Break,
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerMode::Focus => f.write_str("focus"),
            TimerMode::Break => f.write_str("break"),
        }
    }
}

/// Phase derived from the raw state; see the module diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    AwaitingCompletion,
}

/// Outcome recorded for a focus interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Completed,
    Partial,
}

impl SessionStatus {
    /// Note used when the user leaves theirs blank.
    pub fn default_note(self) -> &'static str {
        match self {
            SessionStatus::Completed => "Completed",
            SessionStatus::Partial => "Finished early",
        }
    }
}

/// A finished focus interval waiting for the user's note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub status: SessionStatus,
    pub elapsed_minutes: u64,
    pub note: String,
}

/// Raw countdown state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub duration_secs: u64,
    pub remaining_secs: u64,
    pub running: bool,
    /// Set when a focus countdown begins from its full duration. Reported
    /// only; elapsed time always comes from `duration - remaining`.
    pub started_at: Option<DateTime<Utc>>,
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Not running; the tick was stale and ignored.
    Ignored,
    Counted { remaining_secs: u64 },
    /// Focus reached zero and was finished naturally.
    FocusExpired(Finish),
    /// Break reached zero; the caller must start the next focus interval.
    BreakExpired,
}

/// Result of finishing a focus interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finish {
    /// At least one minute elapsed; waiting for [`FocusTimer::confirm_completion`].
    Requested(CompletionRequest),
    /// Nothing elapsed; reset without recording anything.
    Discarded { elapsed_secs: u64 },
}

/// Core countdown engine.
#[derive(Debug, Clone)]
pub struct FocusTimer {
    state: TimerState,
    pending: Option<CompletionRequest>,
}

impl FocusTimer {
    /// Idle focus countdown of `focus_secs` (at least one second).
    pub fn new(focus_secs: u64) -> Self {
        let duration = focus_secs.max(1);
        Self {
            state: TimerState {
                mode: TimerMode::Focus,
                duration_secs: duration,
                remaining_secs: duration,
                running: false,
                started_at: None,
            },
            pending: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn pending(&self) -> Option<&CompletionRequest> {
        self.pending.as_ref()
    }

    pub fn phase(&self) -> TimerPhase {
        if self.pending.is_some() {
            TimerPhase::AwaitingCompletion
        } else if self.state.running {
            TimerPhase::Running
        } else if self.state.remaining_secs == self.state.duration_secs {
            TimerPhase::Idle
        } else {
            TimerPhase::Paused
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume. No-op while running or awaiting completion.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state.running || self.pending.is_some() {
            return None;
        }
        let from_full = self.state.remaining_secs == self.state.duration_secs;
        if from_full && self.state.mode == TimerMode::Focus {
            self.state.started_at = Some(now);
        }
        self.state.running = true;
        Some(Event::TimerStarted {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            resumed: !from_full,
            at: now,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.state.running = false;
        Some(Event::TimerPaused {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Flip between running and paused. Refused while awaiting completion.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state.running {
            self.pause()
        } else {
            self.start(now)
        }
    }

    /// Back to the full duration of the current mode. Only when stopped and
    /// not awaiting completion.
    pub fn reset(&mut self) -> Option<Event> {
        if self.state.running || self.pending.is_some() {
            return None;
        }
        self.state.remaining_secs = self.state.duration_secs;
        self.state.started_at = None;
        Some(Event::TimerReset {
            mode: self.state.mode,
            duration_secs: self.state.duration_secs,
            at: Utc::now(),
        })
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> Tick {
        if !self.state.running {
            return Tick::Ignored;
        }
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        if self.state.remaining_secs > 0 {
            return Tick::Counted {
                remaining_secs: self.state.remaining_secs,
            };
        }
        match self.state.mode {
            TimerMode::Focus => match self.finish(false) {
                Some(finish) => Tick::FocusExpired(finish),
                None => Tick::Ignored,
            },
            TimerMode::Break => {
                self.state.running = false;
                Tick::BreakExpired
            }
        }
    }

    /// User-confirmed early finish. Only from a running focus interval.
    pub fn finish_early(&mut self) -> Option<Finish> {
        self.finish(true)
    }

    fn finish(&mut self, early: bool) -> Option<Finish> {
        if self.state.mode != TimerMode::Focus || !self.state.running {
            return None;
        }
        if !early && self.state.remaining_secs != 0 {
            return None;
        }
        self.state.running = false;

        let status = if early {
            SessionStatus::Partial
        } else {
            SessionStatus::Completed
        };
        let elapsed_minutes = self.elapsed_minutes(status);

        if elapsed_minutes == 0 {
            let elapsed_secs = self.state.duration_secs - self.state.remaining_secs;
            self.state.remaining_secs = self.state.duration_secs;
            self.state.started_at = None;
            return Some(Finish::Discarded { elapsed_secs });
        }

        let request = CompletionRequest {
            status,
            elapsed_minutes,
            note: status.default_note().to_string(),
        };
        self.pending = Some(request.clone());
        Some(Finish::Requested(request))
    }

    /// Take the pending request with the user's note attached. Elapsed
    /// minutes are recomputed from the current state. The caller moves on to
    /// the break with [`FocusTimer::begin_break`].
    pub fn confirm_completion(&mut self, note: &str) -> Option<CompletionRequest> {
        let pending = self.pending.take()?;
        let trimmed = note.trim();
        Some(CompletionRequest {
            status: pending.status,
            elapsed_minutes: self.elapsed_minutes(pending.status),
            note: if trimmed.is_empty() {
                pending.status.default_note().to_string()
            } else {
                trimmed.to_string()
            },
        })
    }

    /// Enter a running break of `break_secs`.
    pub fn begin_break(&mut self, break_secs: u64) -> Event {
        self.enter(TimerMode::Break, break_secs, None);
        Event::BreakStarted {
            duration_secs: self.state.duration_secs,
            at: Utc::now(),
        }
    }

    /// Enter a running focus interval of `focus_secs`.
    pub fn begin_focus(&mut self, focus_secs: u64, now: DateTime<Utc>) -> Event {
        self.enter(TimerMode::Focus, focus_secs, Some(now));
        Event::FocusStarted {
            duration_secs: self.state.duration_secs,
            at: now,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter(&mut self, mode: TimerMode, secs: u64, started_at: Option<DateTime<Utc>>) {
        let duration = secs.max(1);
        self.pending = None;
        self.state = TimerState {
            mode,
            duration_secs: duration,
            remaining_secs: duration,
            running: true,
            started_at,
        };
    }

    fn elapsed_minutes(&self, status: SessionStatus) -> u64 {
        let secs = match status {
            SessionStatus::Partial => self.state.duration_secs - self.state.remaining_secs,
            SessionStatus::Completed => self.state.duration_secs,
        };
        secs.div_ceil(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run_ticks(timer: &mut FocusTimer, n: u64) -> Tick {
        let mut last = Tick::Ignored;
        for _ in 0..n {
            last = timer.tick();
        }
        last
    }

    #[test]
    fn start_pause_resume() {
        let mut timer = FocusTimer::new(1500);
        assert_eq!(timer.phase(), TimerPhase::Idle);

        assert!(timer.start(Utc::now()).is_some());
        assert_eq!(timer.phase(), TimerPhase::Running);
        assert!(timer.state().started_at.is_some());

        timer.tick();
        assert!(timer.toggle(Utc::now()).is_some());
        assert_eq!(timer.phase(), TimerPhase::Paused);

        assert!(matches!(
            timer.toggle(Utc::now()),
            Some(Event::TimerStarted { resumed: true, .. })
        ));
        assert_eq!(timer.phase(), TimerPhase::Running);
    }

    #[test]
    fn start_twice_is_noop() {
        let mut timer = FocusTimer::new(60);
        let first = Utc::now();
        timer.start(first);
        assert!(timer.start(Utc::now()).is_none());
        assert_eq!(timer.state().started_at, Some(first));
    }

    #[test]
    fn resume_keeps_original_started_at() {
        let mut timer = FocusTimer::new(600);
        let first = Utc::now();
        timer.start(first);
        timer.tick();
        timer.pause();
        timer.start(first + chrono::Duration::seconds(30));
        assert_eq!(timer.state().started_at, Some(first));
    }

    #[test]
    fn ticks_ignored_when_stopped() {
        let mut timer = FocusTimer::new(60);
        assert_eq!(timer.tick(), Tick::Ignored);
        assert_eq!(timer.remaining_secs(), 60);
    }

    #[test]
    fn natural_finish_requests_completed() {
        let mut timer = FocusTimer::new(1500);
        timer.start(Utc::now());
        let last = run_ticks(&mut timer, 1500);
        let expected = CompletionRequest {
            status: SessionStatus::Completed,
            elapsed_minutes: 25,
            note: "Completed".into(),
        };
        assert_eq!(last, Tick::FocusExpired(Finish::Requested(expected)));
        assert_eq!(timer.phase(), TimerPhase::AwaitingCompletion);
        assert!(!timer.is_running());
    }

    #[test]
    fn early_finish_after_90_ticks_is_two_minutes() {
        let mut timer = FocusTimer::new(1500);
        timer.start(Utc::now());
        run_ticks(&mut timer, 90);
        match timer.finish_early() {
            Some(Finish::Requested(req)) => {
                assert_eq!(req.status, SessionStatus::Partial);
                assert_eq!(req.elapsed_minutes, 2);
                assert_eq!(req.note, "Finished early");
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn early_finish_under_a_minute_discards() {
        let mut timer = FocusTimer::new(1500);
        timer.start(Utc::now());
        // ceil(0/60) == 0 only when nothing elapsed at all
        assert_eq!(
            timer.finish_early(),
            Some(Finish::Discarded { elapsed_secs: 0 })
        );
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.remaining_secs(), 1500);
        assert!(timer.pending().is_none());
    }

    #[test]
    fn one_second_rounds_up_to_a_minute() {
        let mut timer = FocusTimer::new(1500);
        timer.start(Utc::now());
        timer.tick();
        assert!(matches!(
            timer.finish_early(),
            Some(Finish::Requested(CompletionRequest { elapsed_minutes: 1, .. }))
        ));
    }

    #[test]
    fn early_finish_rejected_outside_running_focus() {
        let mut timer = FocusTimer::new(1500);
        assert!(timer.finish_early().is_none());

        timer.begin_break(300);
        assert!(timer.finish_early().is_none());
    }

    #[test]
    fn confirm_uses_note_or_default() {
        let mut timer = FocusTimer::new(120);
        timer.start(Utc::now());
        run_ticks(&mut timer, 120);

        let req = timer.confirm_completion("   ").unwrap();
        assert_eq!(req.note, "Completed");
        assert_eq!(req.elapsed_minutes, 2);
        assert!(timer.confirm_completion("again").is_none());
    }

    #[test]
    fn confirm_trims_note() {
        let mut timer = FocusTimer::new(600);
        timer.start(Utc::now());
        run_ticks(&mut timer, 200);
        timer.finish_early();
        let req = timer.confirm_completion("  wrote tests ").unwrap();
        assert_eq!(req.note, "wrote tests");
        assert_eq!(req.elapsed_minutes, 4);
    }

    #[test]
    fn awaiting_blocks_toggle_and_reset() {
        let mut timer = FocusTimer::new(60);
        timer.start(Utc::now());
        run_ticks(&mut timer, 60);
        assert!(timer.toggle(Utc::now()).is_none());
        assert!(timer.reset().is_none());
        assert_eq!(timer.phase(), TimerPhase::AwaitingCompletion);
    }

    #[test]
    fn reset_only_when_stopped() {
        let mut timer = FocusTimer::new(300);
        timer.start(Utc::now());
        run_ticks(&mut timer, 10);
        assert!(timer.reset().is_none());

        timer.pause();
        assert!(timer.reset().is_some());
        assert_eq!(timer.remaining_secs(), 300);
        assert_eq!(timer.mode(), TimerMode::Focus);
        assert!(timer.state().started_at.is_none());
    }

    #[test]
    fn break_expiry_stops_and_reports() {
        let mut timer = FocusTimer::new(1500);
        timer.begin_break(300);
        assert!(timer.is_running());
        assert!(timer.state().started_at.is_none());
        let last = run_ticks(&mut timer, 300);
        assert_eq!(last, Tick::BreakExpired);

        let now = Utc::now();
        timer.begin_focus(1200, now);
        assert_eq!(timer.mode(), TimerMode::Focus);
        assert_eq!(timer.remaining_secs(), 1200);
        assert!(timer.is_running());
        assert_eq!(timer.state().started_at, Some(now));
    }

    #[test]
    fn zero_durations_are_clamped() {
        let mut timer = FocusTimer::new(0);
        assert_eq!(timer.state().duration_secs, 1);
        timer.begin_break(0);
        assert_eq!(timer.remaining_secs(), 1);
    }

    proptest! {
        #[test]
        fn remaining_is_duration_minus_ticks(d in 1u64..5000, frac in 0.0f64..1.0) {
            let t = ((d as f64) * frac) as u64;
            let mut timer = FocusTimer::new(d);
            timer.start(Utc::now());
            for _ in 0..t {
                timer.tick();
            }
            prop_assert_eq!(timer.remaining_secs(), d - t);
        }

        #[test]
        fn early_elapsed_matches_ceiling(d in 61u64..5000, frac in 0.0f64..1.0) {
            let t = ((d as f64) * frac) as u64;
            prop_assume!(t < d);
            let mut timer = FocusTimer::new(d);
            timer.start(Utc::now());
            for _ in 0..t {
                timer.tick();
            }
            match timer.finish_early() {
                Some(Finish::Requested(req)) => prop_assert_eq!(req.elapsed_minutes, t.div_ceil(60)),
                Some(Finish::Discarded { elapsed_secs }) => prop_assert_eq!(elapsed_secs, 0),
                None => prop_assert!(false, "finish_early refused while running"),
            }
        }
    }
}
