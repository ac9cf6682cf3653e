//! Core error types for flowstate-core.
//!
//! None of these are fatal to the countdown. The engine logs them and keeps
//! going; they surface as values so callers (the CLI, tests) can report them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for flowstate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// REST API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Audio output errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine or create the data directory
    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the session REST API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure (connect, timeout, body decode)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Base URL or path could not be joined
    #[error("invalid API url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Audio output errors.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No output device could be opened
    #[error("failed to open audio output: {0}")]
    Device(String),

    /// Track file missing or undecodable
    #[error("failed to load track {path}: {message}")]
    Track { path: PathBuf, message: String },

    /// The audio thread has gone away
    #[error("audio engine is not running")]
    EngineGone,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
