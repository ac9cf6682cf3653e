//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Focus and break durations (seconds)
//! - The music catalog, disabled tracks, and volume
//! - Theme key
//! - Notification cue settings
//! - REST API endpoint and token
//!
//! Configuration is stored at `~/.config/flowstate/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::playlist::catalog;

pub const DEFAULT_FOCUS_SECS: u64 = 25 * 60;
pub const DEFAULT_BREAK_SECS: u64 = 5 * 60;

const FOCUS_RANGE_SECS: std::ops::RangeInclusive<u64> = 300..=7200;
const BREAK_RANGE_SECS: std::ops::RangeInclusive<u64> = 60..=1800;

/// Countdown durations, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_duration")]
    pub focus_duration: u64,
    #[serde(default = "default_break_duration")]
    pub break_duration: u64,
}

/// Background music configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicConfig {
    /// Track ids excluded from playlist builds.
    #[serde(default)]
    pub disabled_tracks: Vec<String>,
    #[serde(default = "default_focus_tracks")]
    pub focus_tracks: Vec<String>,
    #[serde(default = "default_break_tracks")]
    pub break_tracks: Vec<String>,
    /// Root directory that track ids resolve against.
    /// Defaults to `<data dir>/music`.
    #[serde(default)]
    pub music_dir: Option<PathBuf>,
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Fixed shuffle seed (None = fresh entropy per build).
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

/// UI configuration. The engine never reads the theme; it is carried for
/// the surrounding UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
}

/// Notification cue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cue file, relative to the music directory.
    #[serde(default = "default_cue")]
    pub sound: String,
}

/// REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token obtained from the login flow.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/flowstate/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub music: MusicConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

// Default functions
fn default_focus_duration() -> u64 {
    DEFAULT_FOCUS_SECS
}
fn default_break_duration() -> u64 {
    DEFAULT_BREAK_SECS
}
fn default_focus_tracks() -> Vec<String> {
    catalog::FOCUS_TRACKS.iter().map(|t| t.to_string()).collect()
}
fn default_break_tracks() -> Vec<String> {
    catalog::BREAK_TRACKS.iter().map(|t| t.to_string()).collect()
}
fn default_volume() -> f32 {
    0.5
}
fn default_theme() -> String {
    Theme::Midnight.key().into()
}
fn default_true() -> bool {
    true
}
fn default_cue() -> String {
    "notification.mp3".into()
}
fn default_base_url() -> String {
    "http://localhost:8000".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_duration: default_focus_duration(),
            break_duration: default_break_duration(),
        }
    }
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            disabled_tracks: Vec::new(),
            focus_tracks: default_focus_tracks(),
            break_tracks: default_break_tracks(),
            music_dir: None,
            volume: default_volume(),
            shuffle_seed: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: default_cue(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            music: MusicConfig::default(),
            ui: UiConfig::default(),
            notifications: NotificationsConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn leaf_by_path<'a>(
        root: &'a mut serde_json::Value,
        key: &str,
    ) -> Result<&'a mut serde_json::Value, ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        for part in key.split('.') {
            current = current
                .as_object_mut()
                .and_then(|obj| obj.get_mut(part))
                .ok_or_else(unknown)?;
        }
        Ok(current)
    }

    /// Replace the value at `key`, parsing `value` after the type it holds now.
    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let leaf = Self::leaf_by_path(root, key)?;
        let new_value = if is_null_keyword(value) {
            serde_json::Value::Null
        } else {
            match &*leaf {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => parse_number(value)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                // Optional fields serialize as null; infer the type from the input.
                serde_json::Value::Null => parse_number(value)
                    .unwrap_or_else(|| serde_json::Value::String(value.into())),
                serde_json::Value::String(_) => serde_json::Value::String(value.into()),
            }
        };

        *leaf = new_value;
        Ok(())
    }

    /// Path of `config.toml` in the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path; a missing file is created with defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result falls outside the accepted ranges.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let pristine = json.clone();
        Self::set_json_value_by_path(&mut json, key, value)?;
        let parsed_as_text = matches!(
            Self::leaf_by_path(&mut json, key)?,
            serde_json::Value::String(_)
        );

        let updated: Config = match serde_json::from_value(json) {
            Ok(cfg) => cfg,
            // "12345" for an optional string, or "none" for a plain string field.
            Err(first) if !parsed_as_text => {
                let mut json = pristine;
                *Self::leaf_by_path(&mut json, key)? = serde_json::Value::String(value.into());
                serde_json::from_value(json).map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: first.to_string(),
                })?
            }
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
            }
        };
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Range checks mirroring the settings screen sliders.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !FOCUS_RANGE_SECS.contains(&self.timer.focus_duration) {
            return Err(ConfigError::InvalidValue {
                key: "timer.focus_duration".into(),
                message: format!(
                    "{} is outside {}..={} seconds",
                    self.timer.focus_duration,
                    FOCUS_RANGE_SECS.start(),
                    FOCUS_RANGE_SECS.end()
                ),
            });
        }
        if !BREAK_RANGE_SECS.contains(&self.timer.break_duration) {
            return Err(ConfigError::InvalidValue {
                key: "timer.break_duration".into(),
                message: format!(
                    "{} is outside {}..={} seconds",
                    self.timer.break_duration,
                    BREAK_RANGE_SECS.start(),
                    BREAK_RANGE_SECS.end()
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.music.volume) {
            return Err(ConfigError::InvalidValue {
                key: "music.volume".into(),
                message: format!("{} is outside 0.0..=1.0", self.music.volume),
            });
        }
        Ok(())
    }

    /// Resolved music directory.
    pub fn music_dir(&self) -> PathBuf {
        match &self.music.music_dir {
            Some(dir) => dir.clone(),
            None => data_dir()
                .map(|dir| dir.join("music"))
                .unwrap_or_else(|_| PathBuf::from("music")),
        }
    }

    /// Flip a track between enabled and disabled. Returns true when the
    /// track is disabled afterwards.
    pub fn toggle_track(&mut self, track_id: &str) -> bool {
        let disabled = &mut self.music.disabled_tracks;
        if let Some(pos) = disabled.iter().position(|t| t == track_id) {
            disabled.remove(pos);
            false
        } else {
            disabled.push(track_id.to_string());
            true
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("falling back to default config: {e}");
                Self::default()
            }
        }
    }
}

fn is_null_keyword(value: &str) -> bool {
    matches!(value.trim(), "" | "none" | "null")
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<u64>() {
        Some(serde_json::Value::Number(n.into()))
    } else if let Ok(n) = value.parse::<f64>() {
        serde_json::Number::from_f64(n).map(serde_json::Value::Number)
    } else {
        None
    }
}

/// Theme keys known to the UI, in cycling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Midnight,
    Sunrise,
    Forest,
    Nebula,
    Ocean,
    Rose,
    Amber,
    Slate,
}

impl Theme {
    pub const ALL: [Theme; 8] = [
        Theme::Midnight,
        Theme::Sunrise,
        Theme::Forest,
        Theme::Nebula,
        Theme::Ocean,
        Theme::Rose,
        Theme::Amber,
        Theme::Slate,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Theme::Midnight => "midnight",
            Theme::Sunrise => "sunrise",
            Theme::Forest => "forest",
            Theme::Nebula => "nebula",
            Theme::Ocean => "ocean",
            Theme::Rose => "rose",
            Theme::Amber => "amber",
            Theme::Slate => "slate",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Theme::Midnight => "Midnight",
            Theme::Sunrise => "Sunrise",
            Theme::Forest => "Forest",
            Theme::Nebula => "Nebula",
            Theme::Ocean => "Ocean",
            Theme::Rose => "Rose",
            Theme::Amber => "Coffee",
            Theme::Slate => "Slate",
        }
    }

    /// Unknown keys read as the default theme.
    pub fn from_key(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.key() == key)
            .unwrap_or(Theme::Midnight)
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.focus_duration, 1500);
        assert_eq!(parsed.timer.break_duration, 300);
        assert_eq!(parsed.music.focus_tracks, cfg.music.focus_tracks);
        assert!(parsed.music.shuffle_seed.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[timer]\nfocus_duration = 600\n").unwrap();
        assert_eq!(parsed.timer.focus_duration, 600);
        assert_eq!(parsed.timer.break_duration, DEFAULT_BREAK_SECS);
        assert_eq!(parsed.ui.theme, "midnight");
        assert!(!parsed.music.break_tracks.is_empty());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.focus_duration").as_deref(), Some("1500"));
        assert_eq!(cfg.get("ui.theme").as_deref(), Some("midnight"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_value_updates_number() {
        let mut cfg = Config::default();
        cfg.set_value("timer.break_duration", "600").unwrap();
        assert_eq!(cfg.timer.break_duration, 600);
    }

    #[test]
    fn set_value_updates_optional_seed() {
        let mut cfg = Config::default();
        cfg.set_value("music.shuffle_seed", "42").unwrap();
        assert_eq!(cfg.music.shuffle_seed, Some(42));
        cfg.set_value("music.shuffle_seed", "none").unwrap();
        assert_eq!(cfg.music.shuffle_seed, None);
    }

    #[test]
    fn set_value_accepts_numeric_looking_token() {
        let mut cfg = Config::default();
        cfg.set_value("api.token", "12345").unwrap();
        assert_eq!(cfg.api.token.as_deref(), Some("12345"));
        cfg.set_value("api.token", "null").unwrap();
        assert_eq!(cfg.api.token, None);
    }

    #[test]
    fn set_value_rejects_clearing_required_number() {
        let mut cfg = Config::default();
        let result = cfg.set_value("timer.focus_duration", "none");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.timer.focus_duration, 1500);
    }

    #[test]
    fn set_value_updates_array() {
        let mut cfg = Config::default();
        cfg.set_value("music.disabled_tracks", r#"["focus/rainfall.mp3"]"#)
            .unwrap();
        assert_eq!(cfg.music.disabled_tracks, vec!["focus/rainfall.mp3"]);
    }

    #[test]
    fn set_value_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.set_value("timer.nonexistent_key", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_value_rejects_out_of_range_duration() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("timer.focus_duration", "10").is_err());
        assert!(cfg.set_value("timer.break_duration", "3600").is_err());
        // Rejected values leave the config untouched.
        assert_eq!(cfg.timer.focus_duration, DEFAULT_FOCUS_SECS);
        assert_eq!(cfg.timer.break_duration, DEFAULT_BREAK_SECS);
    }

    #[test]
    fn set_value_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("notifications.enabled", "not_a_bool").is_err());
        assert!(cfg.set_value("timer.focus_duration", "abc").is_err());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.timer.focus_duration, DEFAULT_FOCUS_SECS);
        assert!(path.exists());
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = [[[").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn toggle_track_flips_membership() {
        let mut cfg = Config::default();
        assert!(cfg.toggle_track("focus/rainfall.mp3"));
        assert_eq!(cfg.music.disabled_tracks.len(), 1);
        assert!(!cfg.toggle_track("focus/rainfall.mp3"));
        assert!(cfg.music.disabled_tracks.is_empty());
    }

    #[test]
    fn theme_cycles_and_wraps() {
        assert_eq!(Theme::Midnight.next(), Theme::Sunrise);
        assert_eq!(Theme::Slate.next(), Theme::Midnight);
        assert_eq!(Theme::from_key("amber").display_name(), "Coffee");
        assert_eq!(Theme::from_key("neon"), Theme::Midnight);
    }
}
