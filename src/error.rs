//! Unified error type hierarchy for kpm_autoload
//!
//! Provides structured error handling with ConfigError, NativeError and AppError.

use std::io;
use thiserror::Error;

/// Configuration parsing, validation and persistence errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),

    /// The blocking worker running a store operation panicked or was cancelled
    #[error("Background config task failed: {0}")]
    TaskFailed(String),
}

impl ConfigError {
    /// True when the error describes the text itself rather than storage.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ConfigError::InvalidJson(_) | ConfigError::ValidationFailed(_)
        )
    }
}

/// Failures reported by the native capability interface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NativeError {
    #[error("Native interface unavailable: {0}")]
    Unavailable(String),

    #[error("Native call '{call}' failed: {reason}")]
    CallFailed { call: String, reason: String },
}

impl NativeError {
    pub fn call_failed<C: Into<String>, R: Into<String>>(call: C, reason: R) -> Self {
        NativeError::CallFailed {
            call: call.into(),
            reason: reason.into(),
        }
    }
}

/// Global error type for the front end.
///
/// Provides unified error categorization and user-facing messages.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Edit text does not describe a valid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Persisting the configuration failed
    #[error("Save failed: {0}")]
    SaveFailed(String),

    /// File I/O error outside the config store (input files, log dir)
    #[error("I/O error: {0}")]
    Io(String),
}

impl AppError {
    /// Get a user-facing error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidConfig(msg) => {
                format!("The configuration text is not valid, nothing was saved: {}", msg)
            }
            AppError::SaveFailed(msg) => {
                format!("Saving failed, the previous configuration is unchanged: {}", msg)
            }
            AppError::Io(msg) => format!("File operation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        if e.is_parse_error() {
            AppError::InvalidConfig(e.to_string())
        } else {
            AppError::SaveFailed(e.to_string())
        }
    }
}

impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}
