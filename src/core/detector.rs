//! Blink Detector: two-state machine over the EAR stream
//!
//! State transitions:
//! - OPEN → CLOSED: EAR < closed_threshold for close_debounce_frames in a row
//! - CLOSED → OPEN: EAR > open_threshold for open_debounce_frames in a row,
//!   emitting one BlinkEvent
//!
//! Blink start is the first frame of the confirmed closed run and blink end
//! is the first frame of the confirmed open run, so debouncing delays the
//! report but not the measured duration.
//!
//! A closure that begins less than `min_blink_interval` after the previous
//! blink ended is only timed from the first frame past that interval, so a
//! long blink started early still counts.

use tracing::debug;

use crate::config::BlinkConfig;
use crate::types::{BlinkEvent, EyeState};

/// Result of feeding one EAR value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// No state change
    None,
    /// Closure confirmed; blink started at `start`
    Closed { start: f64 },
    /// Eye reopened; blink finished
    Opened(BlinkEvent),
}

/// Debounced blink detector
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    /// Current state
    state: EyeState,
    closed_threshold: f64,
    open_threshold: f64,
    close_debounce_frames: u32,
    open_debounce_frames: u32,
    min_blink_interval: f64,
    /// Consecutive sub-threshold frames seen while OPEN
    closed_run: u32,
    /// First frame of the current closed run that lies past the refractory
    /// interval; the blink is timed from here
    eligible_start: Option<f64>,
    /// Consecutive above-threshold frames seen while CLOSED
    open_run: u32,
    /// Timestamp of the first frame in the current open run
    open_run_start: f64,
    /// Start of the blink being timed
    blink_start: f64,
    /// End of the last emitted blink
    last_blink_end: Option<f64>,
}

impl BlinkDetector {
    /// Create a detector using the shared thresholds
    pub fn new(config: &BlinkConfig) -> Self {
        Self {
            state: EyeState::Open,
            closed_threshold: config.closed_threshold,
            open_threshold: config.open_threshold,
            close_debounce_frames: config.close_debounce_frames.max(1),
            open_debounce_frames: config.open_debounce_frames.max(1),
            min_blink_interval: config.min_blink_interval,
            closed_run: 0,
            eligible_start: None,
            open_run: 0,
            open_run_start: 0.0,
            blink_start: 0.0,
            last_blink_end: None,
        }
    }

    /// Feed one EAR value observed at `timestamp` (seconds)
    pub fn update(&mut self, ear: f64, timestamp: f64) -> Transition {
        match self.state {
            EyeState::Open => self.update_open(ear, timestamp),
            EyeState::Closed => self.update_closed(ear, timestamp),
        }
    }

    fn update_open(&mut self, ear: f64, timestamp: f64) -> Transition {
        if ear >= self.closed_threshold {
            // Run too short to count, or never started
            self.closed_run = 0;
            self.eligible_start = None;
            return Transition::None;
        }

        self.closed_run += 1;
        if self.eligible_start.is_none() {
            if self.in_refractory(timestamp) {
                if self.closed_run == 1 {
                    debug!("Closure at {:.3}s inside refractory interval", timestamp);
                }
            } else {
                self.eligible_start = Some(timestamp);
            }
        }

        if self.closed_run < self.close_debounce_frames {
            return Transition::None;
        }
        let Some(start) = self.eligible_start else {
            // Keep waiting; timing starts once the interval has passed
            return Transition::None;
        };

        self.state = EyeState::Closed;
        self.blink_start = start;
        self.open_run = 0;
        debug!("Blink start at {:.3}s (EAR {:.3})", self.blink_start, ear);
        Transition::Closed {
            start: self.blink_start,
        }
    }

    /// Too soon after the previous blink ended
    fn in_refractory(&self, timestamp: f64) -> bool {
        self.last_blink_end
            .is_some_and(|end| timestamp - end < self.min_blink_interval)
    }

    fn update_closed(&mut self, ear: f64, timestamp: f64) -> Transition {
        if ear <= self.open_threshold {
            self.open_run = 0;
            return Transition::None;
        }

        if self.open_run == 0 {
            self.open_run_start = timestamp;
        }
        self.open_run += 1;

        if self.open_run < self.open_debounce_frames {
            return Transition::None;
        }

        let event = BlinkEvent::new(self.blink_start, self.open_run_start);
        self.state = EyeState::Open;
        self.closed_run = 0;
        self.eligible_start = None;
        self.last_blink_end = Some(event.end);
        debug!("Blink end at {:.3}s, duration {:.3}s", event.end, event.duration);
        Transition::Opened(event)
    }

    /// Get current state
    pub fn state(&self) -> EyeState {
        self.state
    }

    /// Drop any blink in progress and return to OPEN
    pub fn reset(&mut self) {
        self.state = EyeState::Open;
        self.closed_run = 0;
        self.eligible_start = None;
        self.open_run = 0;
        self.last_blink_end = None;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: f64 = 0.32;
    const SHUT: f64 = 0.10;
    const DT: f64 = 0.05;

    fn config() -> BlinkConfig {
        BlinkConfig {
            close_debounce_frames: 3,
            open_debounce_frames: 2,
            min_blink_interval: 0.0,
            ..Default::default()
        }
    }

    /// Feed values at 20 fps starting from `t0`, collecting transitions
    fn feed(detector: &mut BlinkDetector, t0: f64, values: &[f64]) -> Vec<Transition> {
        values
            .iter()
            .enumerate()
            .map(|(i, &ear)| detector.update(ear, t0 + i as f64 * DT))
            .filter(|t| *t != Transition::None)
            .collect()
    }

    fn events(transitions: &[Transition]) -> Vec<BlinkEvent> {
        transitions
            .iter()
            .filter_map(|t| match t {
                Transition::Opened(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_initial_state_is_open() {
        let detector = BlinkDetector::new(&config());
        assert_eq!(detector.state(), EyeState::Open);
    }

    #[test]
    fn test_debounced_closure() {
        let mut detector = BlinkDetector::new(&config());
        detector.update(SHUT, 0.0);
        detector.update(SHUT, 0.05);
        assert_eq!(detector.state(), EyeState::Open);

        let t = detector.update(SHUT, 0.10);
        assert_eq!(t, Transition::Closed { start: 0.0 });
        assert_eq!(detector.state(), EyeState::Closed);
    }

    #[test]
    fn test_full_blink_duration() {
        let mut detector = BlinkDetector::new(&config());
        // frames 0-1 open, 2-9 shut, 10+ open
        let mut values = vec![OPEN; 2];
        values.extend([SHUT; 8]);
        values.extend([OPEN; 4]);

        let out = events(&feed(&mut detector, 0.0, &values));
        assert_eq!(out.len(), 1);
        assert!((out[0].start - 0.10).abs() < 1e-9);
        assert!((out[0].end - 0.50).abs() < 1e-9);
        assert!((out[0].duration - 0.40).abs() < 1e-9);
    }

    #[test]
    fn test_short_closed_run_is_noise() {
        let mut detector = BlinkDetector::new(&config());
        let values = [OPEN, SHUT, SHUT, OPEN, OPEN, SHUT, OPEN, OPEN, OPEN];

        let out = feed(&mut detector, 0.0, &values);
        assert!(out.is_empty());
        assert_eq!(detector.state(), EyeState::Open);
    }

    #[test]
    fn test_single_open_frame_does_not_split_blink() {
        let mut detector = BlinkDetector::new(&config());
        let values = [SHUT, SHUT, SHUT, SHUT, OPEN, SHUT, SHUT, OPEN, OPEN, OPEN];

        let out = events(&feed(&mut detector, 0.0, &values));
        assert_eq!(out.len(), 1);
        assert!((out[0].duration - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_hysteresis_band() {
        let config = BlinkConfig {
            closed_threshold: 0.20,
            open_threshold: 0.28,
            ..config()
        };
        let mut detector = BlinkDetector::new(&config);
        // 0.24 sits between thresholds: never closes from OPEN, never opens from CLOSED
        feed(&mut detector, 0.0, &[0.24; 5]);
        assert_eq!(detector.state(), EyeState::Open);

        feed(&mut detector, 1.0, &[0.1; 3]);
        assert_eq!(detector.state(), EyeState::Closed);
        feed(&mut detector, 2.0, &[0.24; 5]);
        assert_eq!(detector.state(), EyeState::Closed);
    }

    #[test]
    fn test_refractory_interval_suppresses_blink() {
        let config = BlinkConfig {
            min_blink_interval: 0.5,
            ..config()
        };
        let mut detector = BlinkDetector::new(&config);

        let mut values = vec![SHUT; 3];
        values.extend([OPEN; 2]); // ends at 0.15
        values.extend([SHUT; 4]); // 0.25-0.40, all inside 0.5s
        values.extend([OPEN; 2]);
        assert_eq!(events(&feed(&mut detector, 0.0, &values)).len(), 1);

        // Well after the interval a new blink counts again
        let mut later = vec![SHUT; 3];
        later.extend([OPEN; 2]);
        assert_eq!(events(&feed(&mut detector, 2.0, &later)).len(), 1);
    }

    #[test]
    fn test_closure_outlasting_refractory_interval_counts() {
        let config = BlinkConfig {
            min_blink_interval: 0.5,
            ..config()
        };
        let mut detector = BlinkDetector::new(&config);

        let mut values = vec![SHUT; 3];
        values.extend([OPEN; 2]); // ends at 0.15
        values.extend([SHUT; 20]); // 0.25-1.20, interval passes at 0.65
        values.extend([OPEN; 2]);

        let out = events(&feed(&mut detector, 0.0, &values));
        assert_eq!(out.len(), 2);
        assert!((out[1].start - 0.65).abs() < DT + 1e-9);
        assert!((out[1].end - 1.25).abs() < 1e-9);
        assert!(out[1].duration > 0.5);
    }

    #[test]
    fn test_reset_drops_blink_in_progress() {
        let mut detector = BlinkDetector::new(&config());
        feed(&mut detector, 0.0, &[SHUT; 4]);
        assert_eq!(detector.state(), EyeState::Closed);

        detector.reset();
        assert_eq!(detector.state(), EyeState::Open);
        assert!(feed(&mut detector, 1.0, &[OPEN; 3]).is_empty());
    }
}
