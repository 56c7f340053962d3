//! Error types for Parley.

use std::time::Duration;

use thiserror::Error;

/// Core error type for all Parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ParleyError>;
