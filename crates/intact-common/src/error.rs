//! Error types shared by the IntAct export tools

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, IntactError>;

/// Main error type for the shared layer
#[derive(Error, Debug)]
pub enum IntactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Logging error: {0}")]
    Logging(String),
}
