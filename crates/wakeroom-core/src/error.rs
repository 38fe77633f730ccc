//! Core error types for wakeroom-core.
//!
//! This module defines the error hierarchy shared by the scheduler, the
//! audio fader and the configuration layer, using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for wakeroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Audio loading or playback errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Errors reported by the host notification subsystem
    #[error("Notification host error: {0}")]
    Host(#[from] HostError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Audio-specific errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No audio output device could be opened
    #[error("Audio output unavailable: {0}")]
    OutputUnavailable(String),

    /// The resource could not be opened
    #[error("Failed to load audio from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// The resource was opened but could not be decoded
    #[error("Failed to decode audio from {path}: {message}")]
    DecodeFailed { path: PathBuf, message: String },
}

/// Errors surfaced by a [`crate::alarm::NotificationHost`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// The user declined notification permission
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The host rejected the trigger
    #[error("Failed to register trigger '{identifier}': {message}")]
    RegistrationFailed { identifier: String, message: String },

    /// A one-shot trigger whose moment has already passed
    #[error("Trigger '{identifier}' would fire in the past ({at})")]
    TriggerInPast { identifier: String, at: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Volume outside (0, 1]
    #[error("Volume must be in (0, 1], got {0}")]
    VolumeOutOfRange(f32),

    /// Fade duration that is not a finite value in (0, 3600]
    #[error("Fade-in duration must be between 0 and 3600 seconds, got {0}")]
    InvalidFadeDuration(f64),

    /// Wall-clock time that could not be parsed
    #[error("Invalid time '{input}': {message}")]
    InvalidTime { input: String, message: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
