//! Reason codes for session updates and verdicts

use serde::{Deserialize, Serialize};

/// Reason codes for every update reported to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R1xx: Capture
    // =========================================================================
    /// Closure confirmed, blink is being timed
    R101_BLINK_STARTED,
    /// Blink classified and appended to the pattern
    R102_SYMBOL_ACCEPTED,
    /// All blinks collected
    R103_PATTERN_COMPLETE,

    // =========================================================================
    // R2xx: Control
    // =========================================================================
    /// Reset requested by the user
    R201_RESET_REQUESTED,
    /// Partial pattern dropped after inactivity
    R202_RESET_TIMEOUT,
    /// Session quit before the pattern was complete
    R203_SESSION_ABORTED,

    // =========================================================================
    // R3xx: Authentication
    // =========================================================================
    R301_AUTH_SUCCESS,
    R302_AUTH_HASH_MISMATCH,
    R303_AUTH_UNKNOWN_USER,

    // =========================================================================
    // R4xx: Registration
    // =========================================================================
    R401_REGISTERED,
    R402_ALREADY_EXISTS,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R101_BLINK_STARTED => "R101_BLINK_STARTED",
            Self::R102_SYMBOL_ACCEPTED => "R102_SYMBOL_ACCEPTED",
            Self::R103_PATTERN_COMPLETE => "R103_PATTERN_COMPLETE",
            Self::R201_RESET_REQUESTED => "R201_RESET_REQUESTED",
            Self::R202_RESET_TIMEOUT => "R202_RESET_TIMEOUT",
            Self::R203_SESSION_ABORTED => "R203_SESSION_ABORTED",
            Self::R301_AUTH_SUCCESS => "R301_AUTH_SUCCESS",
            Self::R302_AUTH_HASH_MISMATCH => "R302_AUTH_HASH_MISMATCH",
            Self::R303_AUTH_UNKNOWN_USER => "R303_AUTH_UNKNOWN_USER",
            Self::R401_REGISTERED => "R401_REGISTERED",
            Self::R402_ALREADY_EXISTS => "R402_ALREADY_EXISTS",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R101_BLINK_STARTED => "Blink detected",
            Self::R102_SYMBOL_ACCEPTED => "Blink recorded",
            Self::R103_PATTERN_COMPLETE => "Pattern complete",
            Self::R201_RESET_REQUESTED => "Pattern reset",
            Self::R202_RESET_TIMEOUT => "Pattern reset after inactivity",
            Self::R203_SESSION_ABORTED => "Session aborted",
            Self::R301_AUTH_SUCCESS => "Authentication succeeded",
            Self::R302_AUTH_HASH_MISMATCH => "Authentication failed",
            // Same wording as a mismatch so usernames cannot be probed
            Self::R303_AUTH_UNKNOWN_USER => "Authentication failed",
            Self::R401_REGISTERED => "PIN registered",
            Self::R402_ALREADY_EXISTS => "User already registered",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
