//! Error types for Blink-PIN

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BlinkError>;

#[derive(Error, Debug)]
pub enum BlinkError {
    /// Frame had no usable eye landmarks; skipped without a state change
    #[error("No usable eye landmarks in frame")]
    LandmarksUnavailable,

    #[error("User already registered: {0}")]
    AlreadyExists(String),

    #[error("User not found: {0}")]
    NotFound(String),

    /// Attempt ended before the pattern was complete
    #[error("Pattern incomplete: {collected} of {expected} blinks collected")]
    IncompletePattern { collected: usize, expected: usize },

    #[error("Pattern already complete, reset before appending")]
    PatternFull,

    #[error("Not a blink pattern: {0:?}")]
    InvalidPattern(String),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Credential store is corrupt: {0}")]
    CorruptStore(String),

    #[error("Frame stream line {line}: {message}")]
    FrameParse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BlinkError {
    /// Pattern-incomplete error for a fixed-length PIN
    pub fn incomplete(collected: usize) -> Self {
        Self::IncompletePattern {
            collected,
            expected: crate::PIN_LENGTH,
        }
    }
}
