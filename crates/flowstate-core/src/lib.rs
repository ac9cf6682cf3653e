//! # Flowstate Core Library
//!
//! The focus/break session engine behind the `flowstate` CLI. Any front end
//! drives the same [`FlowController`] and renders the [`Event`]s it returns.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-counting focus/break state machine; the caller
//!   delivers one tick per second through a [`Scheduler`]
//! - **Playlist**: shuffled per-mode track lists with a disabled-track filter
//! - **Audio**: playback gated on the music toggle and the timer, with stale
//!   end-of-track reports filtered by generation
//! - **Recorder / API**: completed focus intervals are saved to the REST
//!   backend in the background
//! - **Storage**: TOML configuration, re-read only at mode transitions
//!
//! ## Key Components
//!
//! - [`FlowController`]: composes everything and owns all mutable state
//! - [`FocusTimer`]: pure countdown state machine
//! - [`Playlist`]: track ordering and cursor
//! - [`Config`]: application configuration management
//! - [`SessionApi`]: seam for the backend

pub mod api;
pub mod audio;
pub mod controller;
pub mod error;
pub mod events;
pub mod playlist;
pub mod recorder;
pub mod storage;
pub mod timer;

pub use api::{ApiClient, Category, NewSession, SessionApi, SessionRecord};
pub use audio::{AudioController, AudioSink, NullSink, RodioSink};
pub use controller::{FlowController, Signal, TimerSnapshot};
pub use error::{ApiError, AudioError, ConfigError, CoreError};
pub use events::Event;
pub use playlist::{Catalog, Playlist, Track};
pub use recorder::{RecordOutcome, SessionRecorder};
pub use storage::{Config, ConfigFileSettings, SettingsSource, SharedSettings, Theme, TimerSettings};
pub use timer::{
    format_clock, CompletionRequest, FocusTimer, IntervalScheduler, ManualScheduler, Scheduler,
    SessionStatus, TimerMode, TimerPhase,
};
