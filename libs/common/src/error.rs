use std::path::PathBuf;

use thiserror::Error;

/// Configuration and logging bootstrap errors
#[derive(Debug, Error)]
pub enum Error {
    /// File exists but could not be parsed or extracted
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Extension is missing or not one of yaml/yml/toml/json
    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid level filter or log file path
    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn logging(msg: impl Into<String>) -> Self {
        Self::Logging(msg.into())
    }
}
