//! Error types for Anveshan
//!
//! Only configuration, persistence and thread setup can fail. Runtime
//! conditions such as missing frames or planner failures are retried by the
//! state machine and never surface as errors.

use thiserror::Error;

/// Anveshan error type
#[derive(Error, Debug)]
pub enum AnveshanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Map persistence failed: {0}")]
    Persistence(String),

    #[error("Thread error: {0}")]
    Thread(String),
}

impl From<toml::de::Error> for AnveshanError {
    fn from(e: toml::de::Error) -> Self {
        AnveshanError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnveshanError>;
