//! Blink-PIN: authenticate a user with a 4-symbol pattern of blinks
//!
//! Pipeline: landmarks → EAR → BlinkDetector → classify → PatternCollector
//! → registration (hash + store) or authentication (hash + compare)

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::BlinkConfig;
pub use error::{BlinkError, Result};

// =============================================================================
// THRESHOLDS [C] - Defaults for BlinkConfig
// =============================================================================

/// EAR below this counts as a closed eye
pub const EAR_CLOSED_THRESHOLD: f64 = 0.25;

/// EAR above this counts as an open eye
pub const EAR_OPEN_THRESHOLD: f64 = 0.25;

/// Consecutive sub-threshold frames needed to confirm a closure
pub const CLOSE_DEBOUNCE_FRAMES: u32 = 3;

/// Consecutive above-threshold frames needed to confirm the eye reopened
pub const OPEN_DEBOUNCE_FRAMES: u32 = 2;

/// Blinks of at least this many seconds are Dah (long), shorter ones Dit
pub const DAH_THRESHOLD_SECS: f64 = 0.4;

/// Minimum gap between the end of one blink and the start of the next (seconds)
pub const MIN_BLINK_INTERVAL_SECS: f64 = 0.5;

/// Moving-average window over per-frame EAR values
pub const EAR_SMOOTHING_WINDOW: usize = 5;

// =============================================================================
// PATTERN
// =============================================================================

/// Number of blinks in a PIN
pub const PIN_LENGTH: usize = 4;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
