//! Shared detection configuration
//!
//! One `BlinkConfig` is built per process and handed by reference to both
//! registration and authentication, so the two flows can never disagree on
//! thresholds or debouncing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BlinkError, Result};
use crate::{
    CLOSE_DEBOUNCE_FRAMES, DAH_THRESHOLD_SECS, EAR_CLOSED_THRESHOLD, EAR_OPEN_THRESHOLD,
    EAR_SMOOTHING_WINDOW, MIN_BLINK_INTERVAL_SECS, OPEN_DEBOUNCE_FRAMES,
};

/// Store file name
const STORE_FILE_NAME: &str = "users.json";

/// Data directory name under the platform data dir
const DATA_DIR_NAME: &str = "blinkpin";

/// Thresholds and timing policy for the blink pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// EAR below this is a closed-eye frame
    pub closed_threshold: f64,
    /// EAR above this is an open-eye frame
    pub open_threshold: f64,
    /// Frames below `closed_threshold` before Open → Closed
    pub close_debounce_frames: u32,
    /// Frames above `open_threshold` before Closed → Open
    pub open_debounce_frames: u32,
    /// Dit/Dah boundary in seconds (inclusive toward Dah)
    pub dah_threshold: f64,
    /// Refractory gap after a blink, in seconds (0 disables)
    pub min_blink_interval: f64,
    /// Moving-average window over EAR values (1 disables smoothing)
    pub smoothing_window: usize,
    /// Reset a partial pattern after this many idle seconds (None = wait forever)
    pub inactivity_timeout: Option<f64>,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            closed_threshold: EAR_CLOSED_THRESHOLD,
            open_threshold: EAR_OPEN_THRESHOLD,
            close_debounce_frames: CLOSE_DEBOUNCE_FRAMES,
            open_debounce_frames: OPEN_DEBOUNCE_FRAMES,
            dah_threshold: DAH_THRESHOLD_SECS,
            min_blink_interval: MIN_BLINK_INTERVAL_SECS,
            smoothing_window: EAR_SMOOTHING_WINDOW,
            inactivity_timeout: None,
        }
    }
}

impl BlinkConfig {
    /// Load from a TOML file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(BlinkError::InvalidConfig(msg));

        if !(self.closed_threshold.is_finite() && self.closed_threshold > 0.0) {
            return invalid(format!("closed_threshold must be positive, got {}", self.closed_threshold));
        }
        if !self.open_threshold.is_finite() || self.open_threshold < self.closed_threshold {
            return invalid(format!(
                "open_threshold ({}) must be >= closed_threshold ({})",
                self.open_threshold, self.closed_threshold
            ));
        }
        if self.close_debounce_frames == 0 || self.open_debounce_frames == 0 {
            return invalid("debounce frame counts must be at least 1".to_string());
        }
        if !(self.dah_threshold.is_finite() && self.dah_threshold > 0.0) {
            return invalid(format!("dah_threshold must be positive, got {}", self.dah_threshold));
        }
        if !(self.min_blink_interval.is_finite() && self.min_blink_interval >= 0.0) {
            return invalid(format!(
                "min_blink_interval must be non-negative, got {}",
                self.min_blink_interval
            ));
        }
        if self.smoothing_window == 0 {
            return invalid("smoothing_window must be at least 1".to_string());
        }
        if let Some(timeout) = self.inactivity_timeout {
            if !(timeout.is_finite() && timeout > 0.0) {
                return invalid(format!("inactivity_timeout must be positive, got {}", timeout));
            }
        }
        Ok(())
    }

    /// Default credential store location
    pub fn default_store_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DATA_DIR_NAME)
            .join(STORE_FILE_NAME)
    }
}

// =============================================================================
// TESTS
// =============================================================================
