//! Error types.
//!
//! Gesture handlers never return these: they log and fall back. Errors only
//! surface from option-file handling and command parameter parsing.

use thiserror::Error;

/// Option store loading and saving errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Option '{key}' must be a bool or a number")]
    WrongType { key: String },
}

/// Command parameter errors.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Malformed point list: {0}")]
    BadPoints(String),
    #[error("Parameter '{name}' has the wrong type")]
    BadParam { name: String },
    #[error("Invalid parameter block: {0}")]
    Params(#[from] serde_json::Error),
}

/// Result type for command parameter parsing.
pub type CommandResult<T> = Result<T, CommandError>;

/// Result type for option store operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
