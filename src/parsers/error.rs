//! Error types for configuration parsers.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {reason}")]
    Json { path: PathBuf, reason: String },

    #[error("Invalid YAML in {path}: {reason}")]
    Yaml { path: PathBuf, reason: String },

    #[error("Invalid TOML in {path}: {reason}")]
    Toml { path: PathBuf, reason: String },

    #[error("No parser for {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Node.js executable not available: {reason}")]
    NodeUnavailable { reason: String },

    #[error("Node.js failed to evaluate {path}: {reason}")]
    NodeFailed { path: PathBuf, reason: String },

    #[error("Node.js timed out after {timeout_ms}ms evaluating {path}")]
    NodeTimeout { path: PathBuf, timeout_ms: u64 },
}

impl ParseError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ParseError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
