//! Stored credentials and authentication outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ReasonCode;

/// One registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique key
    pub username: String,
    /// Lowercase hex SHA-256 of the encoded pattern
    pub pin_hash: String,
    /// Number of blinks in the pattern
    pub pin_length: usize,
    /// When the record was written
    pub updated_at: DateTime<Utc>,
}

/// Why an authentication attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// No record for the claimed username
    UnknownUser,
    /// Pattern hash differs from the stored one
    HashMismatch,
}

/// Final verdict of an authentication attempt. Never partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthOutcome {
    Success,
    Failure(FailureReason),
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success)
    }

    pub fn reason(&self) -> ReasonCode {
        match self {
            AuthOutcome::Success => ReasonCode::R301_AUTH_SUCCESS,
            AuthOutcome::Failure(FailureReason::HashMismatch) => ReasonCode::R302_AUTH_HASH_MISMATCH,
            AuthOutcome::Failure(FailureReason::UnknownUser) => ReasonCode::R303_AUTH_UNKNOWN_USER,
        }
    }
}

impl std::fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthOutcome::Success => write!(f, "SUCCESS"),
            AuthOutcome::Failure(_) => write!(f, "FAILURE"),
        }
    }
}
