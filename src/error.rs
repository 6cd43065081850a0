//! Error types for takeout restore

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for takeout restore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for takeout restore
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{tool} not found. Install it and ensure it is in PATH (e.g. brew install exiftool)")]
    ToolNotFound { tool: String },

    #[error("Metadata tool invocation failed: {message}")]
    ToolInvocation { message: String },

    #[error("Metadata tool timed out after {}s", timeout.as_secs())]
    ToolTimeout { timeout: Duration },

    #[error("Unexpected metadata tool output for {path}: {message}")]
    ToolOutput { path: PathBuf, message: String },

    #[error("Malformed sidecar {path}: {message}")]
    MalformedSidecar { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No media files found under {0}")]
    NoMediaFound(PathBuf),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl Error {
    /// Whether the error concerns the tool process rather than the environment
    pub fn is_invocation_failure(&self) -> bool {
        matches!(
            self,
            Error::ToolInvocation { .. } | Error::ToolTimeout { .. } | Error::ToolOutput { .. }
        )
    }
}
