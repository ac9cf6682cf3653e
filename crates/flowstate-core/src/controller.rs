//! The focus/break session engine as the UI sees it.
//!
//! [`FlowController`] owns the countdown, the playlist, the audio controller,
//! the recorder and the tick scheduler. All mutation goes through `&mut self`
//! on one task: user commands are plain method calls, and asynchronous inputs
//! (ticks, end of track, recording outcomes) arrive as [`Signal`]s on a single
//! channel and are applied with [`FlowController::handle_signal`].
//!
//! Settings are read only at rebuild points: construction, every mode
//! transition, and an explicit [`FlowController::rebuild_playlist`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audio::AudioController;
use crate::events::Event;
use crate::playlist::{Catalog, Playlist, Track};
use crate::recorder::{RecordOutcome, SessionRecorder};
use crate::storage::{SettingsSource, TimerSettings};
use crate::timer::{
    format_clock, CompletionRequest, Finish, FocusTimer, Scheduler, Tick, TimerMode, TimerPhase,
};

/// Asynchronous inputs to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// One second of wall-clock time passed.
    Tick,
    /// The track started under `generation` played to its end.
    TrackEnded { generation: u64 },
    /// A recording task finished.
    Recorded(RecordOutcome),
}

/// What the UI renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub phase: TimerPhase,
    pub duration_secs: u64,
    pub remaining_secs: u64,
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub track: Option<Track>,
    pub track_position: usize,
    pub playlist_len: usize,
    pub music_enabled: bool,
    pub category_id: Option<i64>,
    pub today_count: u32,
    pub pending: Option<CompletionRequest>,
}

impl TimerSnapshot {
    /// Fraction of the current interval elapsed, 0.0..=1.0.
    pub fn progress(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        (self.duration_secs - self.remaining_secs) as f64 / self.duration_secs as f64
    }

    pub fn clock(&self) -> String {
        format_clock(self.remaining_secs)
    }
}

pub struct FlowController {
    timer: FocusTimer,
    playlist: Playlist,
    catalog: Catalog,
    audio: AudioController,
    recorder: SessionRecorder,
    settings: Arc<dyn SettingsSource>,
    scheduler: Box<dyn Scheduler>,
    category_id: Option<i64>,
    shuffle_seed: Option<u64>,
}

impl FlowController {
    /// Idle focus interval sized from `settings`, with a focus playlist ready.
    pub fn new(
        settings: Arc<dyn SettingsSource>,
        catalog: Catalog,
        audio: AudioController,
        recorder: SessionRecorder,
        scheduler: Box<dyn Scheduler>,
    ) -> Self {
        let initial = settings.load();
        let playlist = Playlist::build(TimerMode::Focus, &catalog, &initial.disabled_tracks, None);
        Self {
            timer: FocusTimer::new(initial.focus_secs),
            playlist,
            catalog,
            audio,
            recorder,
            settings,
            scheduler,
            category_id: None,
            shuffle_seed: None,
        }
    }

    /// Make every playlist build reproducible. Rebuilds the current one.
    pub fn with_shuffle_seed(mut self, seed: Option<u64>) -> Self {
        self.shuffle_seed = seed;
        let settings = self.settings.load();
        self.playlist = Playlist::build(
            self.timer.mode(),
            &self.catalog,
            &settings.disabled_tracks,
            seed,
        );
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> TimerSnapshot {
        let state = self.timer.state();
        TimerSnapshot {
            mode: state.mode,
            phase: self.timer.phase(),
            duration_secs: state.duration_secs,
            remaining_secs: state.remaining_secs,
            running: state.running,
            started_at: state.started_at,
            track: self.playlist.current().cloned(),
            track_position: self.playlist.cursor(),
            playlist_len: self.playlist.len(),
            music_enabled: self.audio.music_enabled(),
            category_id: self.category_id,
            today_count: self.recorder.today_count(),
            pending: self.timer.pending().cloned(),
        }
    }

    pub fn snapshot_event(&self) -> Event {
        Event::StateSnapshot {
            snapshot: self.snapshot(),
            at: Utc::now(),
        }
    }

    /// Whether a tick task is outstanding.
    pub fn ticking(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn audio(&self) -> &AudioController {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioController {
        &mut self.audio
    }

    // ── User commands ────────────────────────────────────────────────

    /// Start, pause or resume the current interval.
    pub fn toggle_start(&mut self) -> Vec<Event> {
        let events: Vec<Event> = self.timer.toggle(Utc::now()).into_iter().collect();
        self.settle();
        events
    }

    /// Finish the running focus interval early. `confirmed` is the user's
    /// answer to the confirmation prompt; false does nothing.
    pub fn early_finish(&mut self, confirmed: bool) -> Vec<Event> {
        if !confirmed {
            return Vec::new();
        }
        match self.timer.finish_early() {
            Some(finish) => self.on_finish(finish),
            None => Vec::new(),
        }
    }

    pub fn reset(&mut self) -> Vec<Event> {
        let events: Vec<Event> = self.timer.reset().into_iter().collect();
        self.settle();
        events
    }

    /// Save the pending session with `note` and move straight on to the
    /// break. Recording runs in the background; its outcome arrives later as
    /// [`Signal::Recorded`]. Must be called inside a tokio runtime.
    pub fn confirm_completion(&mut self, note: &str) -> Vec<Event> {
        let Some(request) = self.timer.confirm_completion(note) else {
            return Vec::new();
        };
        info!(
            minutes = request.elapsed_minutes,
            status = ?request.status,
            "focus interval confirmed"
        );
        // Detached: the break starts whether or not the call succeeds.
        drop(self.recorder.record(request, self.category_id));

        let settings = self.settings.load();
        let mut events = vec![self.timer.begin_break(settings.break_secs)];
        events.extend(self.enter_mode(&settings));
        events
    }

    pub fn toggle_music(&mut self) -> Vec<Event> {
        let enabled = self.audio.toggle_music();
        self.audio.sync(&self.playlist, self.timer.is_running());
        vec![Event::MusicToggled {
            enabled,
            at: Utc::now(),
        }]
    }

    pub fn select_category(&mut self, category_id: Option<i64>) -> Vec<Event> {
        self.category_id = category_id;
        vec![Event::CategorySelected {
            category_id,
            at: Utc::now(),
        }]
    }

    /// Re-read settings and rebuild the playlist for the current mode.
    pub fn rebuild_playlist(&mut self) -> Vec<Event> {
        let settings = self.settings.load();
        self.enter_mode(&settings)
    }

    // ── Signals ──────────────────────────────────────────────────────

    pub fn handle_signal(&mut self, signal: Signal) -> Vec<Event> {
        match signal {
            Signal::Tick => self.on_tick(),
            Signal::TrackEnded { generation } => {
                let running = self.timer.is_running();
                if self
                    .audio
                    .on_track_ended(generation, &mut self.playlist, running)
                {
                    vec![self.track_changed()]
                } else {
                    Vec::new()
                }
            }
            Signal::Recorded(RecordOutcome::Saved {
                session_id,
                duration_minutes,
                today_count,
            }) => vec![Event::SessionRecorded {
                session_id,
                duration_minutes,
                today_count,
                at: Utc::now(),
            }],
            Signal::Recorded(RecordOutcome::Failed { message }) => vec![Event::RecordingFailed {
                message,
                at: Utc::now(),
            }],
        }
    }

    /// Stop ticking and playback.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel();
        self.audio.interrupt();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn on_tick(&mut self) -> Vec<Event> {
        match self.timer.tick() {
            Tick::Ignored => {
                debug!("stale tick ignored");
                Vec::new()
            }
            Tick::Counted { .. } => Vec::new(),
            Tick::FocusExpired(finish) => self.on_finish(finish),
            Tick::BreakExpired => {
                self.audio.notify();
                let settings = self.settings.load();
                info!(focus_secs = settings.focus_secs, "break over, back to focus");
                let mut events = vec![self.timer.begin_focus(settings.focus_secs, Utc::now())];
                events.extend(self.enter_mode(&settings));
                events
            }
        }
    }

    fn on_finish(&mut self, finish: Finish) -> Vec<Event> {
        self.settle();
        match finish {
            Finish::Requested(request) => {
                self.audio.notify();
                vec![Event::CompletionRequested {
                    request,
                    at: Utc::now(),
                }]
            }
            Finish::Discarded { elapsed_secs } => {
                debug!(elapsed_secs, "focus interval finished at zero, not recorded");
                vec![Event::SessionDiscarded {
                    elapsed_secs,
                    at: Utc::now(),
                }]
            }
        }
    }

    /// Interrupt playback, rebuild the playlist for the timer's mode, then
    /// resume ticking and playback as the new state allows.
    fn enter_mode(&mut self, settings: &TimerSettings) -> Vec<Event> {
        let mode = self.timer.mode();
        self.audio.interrupt();
        self.playlist = Playlist::build(
            mode,
            &self.catalog,
            &settings.disabled_tracks,
            self.shuffle_seed,
        );
        debug!(%mode, tracks = self.playlist.len(), "playlist rebuilt");
        let events = vec![
            Event::PlaylistRebuilt {
                mode,
                tracks: self.playlist.len(),
                at: Utc::now(),
            },
            self.track_changed(),
        ];
        self.settle();
        events
    }

    /// Keep the scheduler and audio consistent with `running`.
    fn settle(&mut self) {
        let running = self.timer.is_running();
        if running && !self.scheduler.is_active() {
            self.scheduler.start();
        } else if !running && self.scheduler.is_active() {
            self.scheduler.cancel();
        }
        self.audio.sync(&self.playlist, running);
    }

    fn track_changed(&self) -> Event {
        Event::TrackChanged {
            track: self.playlist.current().cloned(),
            position: self.playlist.cursor(),
            at: Utc::now(),
        }
    }
}

impl Drop for FlowController {
    fn drop(&mut self) {
        self.scheduler.cancel();
    }
}
