//! Read-only view of the persisted timer settings.
//!
//! The engine holds a [`SettingsSource`] and calls [`SettingsSource::load`]
//! only at rebuild points (construction and mode transitions). Writes happen
//! elsewhere (the `config` CLI command, a settings screen) and are picked up at
//! the next transition.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::warn;

use super::config::{DEFAULT_BREAK_SECS, DEFAULT_FOCUS_SECS};
use super::Config;

/// Snapshot of the settings the engine consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSettings {
    pub focus_secs: u64,
    pub break_secs: u64,
    pub disabled_tracks: HashSet<String>,
    /// Opaque to the engine.
    pub theme: String,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_secs: DEFAULT_FOCUS_SECS,
            break_secs: DEFAULT_BREAK_SECS,
            disabled_tracks: HashSet::new(),
            theme: "midnight".into(),
        }
    }
}

impl TimerSettings {
    /// Build from raw TOML, falling back to defaults per field.
    ///
    /// A non-positive or non-integer duration, or a disabled-track list that
    /// isn't an array of strings, is replaced by its default instead of
    /// failing the whole read.
    pub fn from_toml_str(content: &str) -> Self {
        let mut settings = Self::default();
        let table: toml::Table = match content.parse() {
            Ok(table) => table,
            Err(e) => {
                warn!("settings unreadable, using defaults: {e}");
                return settings;
            }
        };

        let section = |name: &str| table.get(name).and_then(|v| v.as_table());

        if let Some(timer) = section("timer") {
            if let Some(secs) = positive_secs(timer.get("focus_duration"), "focus_duration") {
                settings.focus_secs = secs;
            }
            if let Some(secs) = positive_secs(timer.get("break_duration"), "break_duration") {
                settings.break_secs = secs;
            }
        }

        if let Some(disabled) = section("music").and_then(|m| m.get("disabled_tracks")) {
            match disabled.as_array() {
                Some(items) => {
                    settings.disabled_tracks = items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect();
                }
                None => warn!("music.disabled_tracks is not a list, ignoring"),
            }
        }

        if let Some(theme) = section("ui")
            .and_then(|ui| ui.get("theme"))
            .and_then(|v| v.as_str())
        {
            settings.theme = theme.to_string();
        }

        settings
    }
}

fn positive_secs(value: Option<&toml::Value>, key: &str) -> Option<u64> {
    let value = value?;
    match value.as_integer() {
        Some(n) if n > 0 => Some(n as u64),
        _ => {
            warn!("timer.{key} = {value} is not a positive integer, using default");
            None
        }
    }
}

/// Where the engine reads its settings from.
pub trait SettingsSource: Send + Sync {
    fn load(&self) -> TimerSettings;
}

/// Reads `config.toml` fresh on every call.
#[derive(Debug, Clone)]
pub struct ConfigFileSettings {
    path: PathBuf,
}

impl ConfigFileSettings {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Settings backed by the default `config.toml` location.
    pub fn open_default() -> Result<Self, crate::error::ConfigError> {
        Ok(Self::new(Config::path()?))
    }
}

impl SettingsSource for ConfigFileSettings {
    fn load(&self) -> TimerSettings {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => TimerSettings::from_toml_str(&content),
            Err(e) => {
                warn!(
                    "cannot read {}, using default settings: {e}",
                    self.path.display()
                );
                TimerSettings::default()
            }
        }
    }
}

/// In-memory settings shared with whoever edits them.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<TimerSettings>>,
}

impl SharedSettings {
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Apply an edit; visible to the engine at its next rebuild point.
    pub fn update(&self, edit: impl FnOnce(&mut TimerSettings)) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        edit(&mut guard);
    }
}

impl SettingsSource for SharedSettings {
    fn load(&self) -> TimerSettings {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
