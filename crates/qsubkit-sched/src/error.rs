//! Error handling for job composition and submission.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur while building or submitting a job.
#[derive(Error, Debug)]
pub enum SchedError {
    /// Invalid job configuration or builder input.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required template field was empty at render time.
    #[error("Template render error: {0}")]
    TemplateRender(String),

    /// Side-script directory or file could not be created.
    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The submission binary reported a diagnostic.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// The submission binary could not be run.
    #[error("Command failed: {command} - {message}")]
    Command { command: String, message: String },

    /// Submission did not finish within the configured timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Malformed job manifest.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchedError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        SchedError::Config(message.into())
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SchedError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for SchedError {
    fn from(e: serde_json::Error) -> Self {
        SchedError::Manifest(e.to_string())
    }
}

impl From<serde_yaml_ng::Error> for SchedError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        SchedError::Manifest(e.to_string())
    }
}
