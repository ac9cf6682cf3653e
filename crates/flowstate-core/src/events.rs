use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::controller::TimerSnapshot;
use crate::playlist::Track;
use crate::timer::{CompletionRequest, TimerMode};

/// Every state change in the engine produces an Event.
/// The UI renders them; the CLI prints or logs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_secs: u64,
        /// False when starting from the full duration.
        resumed: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// A focus interval ended with at least one minute; waiting for a note.
    CompletionRequested {
        request: CompletionRequest,
        at: DateTime<Utc>,
    },
    /// A focus interval was finished before any second elapsed and was dropped.
    SessionDiscarded {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    FocusStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    BreakStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    PlaylistRebuilt {
        mode: TimerMode,
        tracks: usize,
        at: DateTime<Utc>,
    },
    TrackChanged {
        track: Option<Track>,
        position: usize,
        at: DateTime<Utc>,
    },
    MusicToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    CategorySelected {
        category_id: Option<i64>,
        at: DateTime<Utc>,
    },
    SessionRecorded {
        session_id: String,
        duration_minutes: u64,
        today_count: u32,
        at: DateTime<Utc>,
    },
    /// The create-session call failed; the session is lost.
    RecordingFailed {
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        #[serde(flatten)]
        snapshot: TimerSnapshot,
        at: DateTime<Utc>,
    },
}
