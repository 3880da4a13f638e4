//! Error handling for the camera director
//!
//! This module defines the crate error type and a Result alias for use
//! throughout the recorder, replay engine and prediction adapter.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for director operations
#[derive(Error, Debug)]
pub enum DirectorError {
    /// The requested session or label file does not exist
    #[error("Session file not found: {}", .0.display())]
    SessionNotFound(PathBuf),

    /// The session header record could not be decoded
    #[error("Malformed session header: {0}")]
    Header(#[source] serde_json::Error),

    /// The session header decoded but holds unusable values
    #[error("Invalid session header: {0}")]
    InvalidHeader(String),

    /// A tick record could not be decoded
    #[error("Malformed record at tick {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A tick record decoded but violates the header's entity counts
    #[error("Inconsistent record at tick {index}: {message}")]
    Inconsistent { index: usize, message: String },

    /// The label stream does not cover every tick
    #[error("Label stream has {labels} entries but the session has {ticks} ticks")]
    LabelMismatch { labels: usize, ticks: usize },

    /// Errors related to classifier loading or invocation
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DirectorError>,
    },
}

impl DirectorError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DirectorError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a classifier error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        DirectorError::Classifier(err.to_string())
    }

    /// Whether this error came from a corrupt or inconsistent tick record
    pub fn is_record_error(&self) -> bool {
        match self {
            DirectorError::Record { .. } | DirectorError::Inconsistent { .. } => true,
            DirectorError::WithContext { source, .. } => source.is_record_error(),
            _ => false,
        }
    }
}

/// Result type alias for director operations
pub type Result<T> = std::result::Result<T, DirectorError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, Box<rhai::EvalAltResult>> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DirectorError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| DirectorError::from_rhai_error(e).with_context(f()))
    }
}
