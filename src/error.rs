//! Error types for selector-migrate

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// selector-migrate errors
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid project configuration. Raised before any mutation.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// An external tool exited unsuccessfully or could not be spawned.
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    #[error("Type check failed. Please continue with manual review, then commit with: {commit_message}")]
    TypeCheck { commit_message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
