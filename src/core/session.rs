//! Capture session: one registration or authentication attempt
//!
//! Owns its smoother, detector and collector, so nothing leaks between
//! attempts. Frames and control signals are consumed one at a time; each
//! call returns the updates the presentation layer should show.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::BlinkConfig;
use crate::core::classifier::classify_event;
use crate::core::collector::PatternCollector;
use crate::core::detector::{BlinkDetector, Transition};
use crate::core::ear::{calculate_ear, EarSmoother, EyeLandmarks};
use crate::error::{BlinkError, Result};
use crate::types::{EyeState, PatternSequence, SessionUpdate};
use crate::PIN_LENGTH;

/// Log the current EAR every this many frames
const EAR_TRACE_INTERVAL: u64 = 60;

/// Control signals from the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlSignal {
    /// Discard the current attempt and start over
    Reset,
    /// End the session without a result
    Quit,
}

/// What the landmark extractor produced for a frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    Landmarks(EyeLandmarks),
    /// EAR already computed upstream
    Ear(f64),
    /// No face or no usable eyes
    NoFace,
}

/// One camera frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Capture time in seconds
    pub timestamp: f64,
    pub input: FrameInput,
}

impl Frame {
    pub fn ear(timestamp: f64, ear: f64) -> Self {
        Self {
            timestamp,
            input: FrameInput::Ear(ear),
        }
    }

    pub fn no_face(timestamp: f64) -> Self {
        Self {
            timestamp,
            input: FrameInput::NoFace,
        }
    }
}

/// Anything the session can consume
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Frame(Frame),
    Control(ControlSignal),
}

/// Where the attempt stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Capturing,
    Complete(PatternSequence),
    /// Quit with this many blinks collected
    Aborted(usize),
}

/// Per-attempt capture state
#[derive(Debug)]
pub struct CaptureSession<'a> {
    config: &'a BlinkConfig,
    smoother: EarSmoother,
    detector: BlinkDetector,
    collector: PatternCollector,
    status: SessionStatus,
    /// Time of the last accepted symbol, for the inactivity timeout
    last_symbol_at: Option<f64>,
    frame_count: u64,
    skipped_frames: u64,
}

impl<'a> CaptureSession<'a> {
    pub fn new(config: &'a BlinkConfig) -> Self {
        Self {
            config,
            smoother: EarSmoother::new(config.smoothing_window),
            detector: BlinkDetector::new(config),
            collector: PatternCollector::new(),
            status: SessionStatus::Capturing,
            last_symbol_at: None,
            frame_count: 0,
            skipped_frames: 0,
        }
    }

    /// Consume a frame or control signal
    pub fn handle(&mut self, input: &SessionInput) -> Vec<SessionUpdate> {
        match input {
            SessionInput::Frame(frame) => self.process_frame(frame),
            SessionInput::Control(signal) => self.control(*signal),
        }
    }

    /// Consume one frame. Frames after completion or abort are ignored.
    pub fn process_frame(&mut self, frame: &Frame) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        if self.is_finished() {
            return updates;
        }
        self.frame_count += 1;

        if let Some(update) = self.check_inactivity(frame.timestamp) {
            updates.push(update);
        }

        let raw = match frame_ear(&frame.input) {
            Ok(ear) => ear,
            Err(_) => {
                // LandmarksUnavailable: skip, no transition
                self.skipped_frames += 1;
                trace!("Frame at {:.3}s has no usable landmarks", frame.timestamp);
                return updates;
            }
        };

        let ear = self.smoother.push(raw);
        if self.frame_count % EAR_TRACE_INTERVAL == 0 {
            debug!(
                "Current EAR: {:.3} (threshold {}, eye {})",
                ear,
                self.config.closed_threshold,
                self.eye_state()
            );
        }

        match self.detector.update(ear, frame.timestamp) {
            Transition::None => {}
            Transition::Closed { start } => {
                updates.push(SessionUpdate::BlinkStarted { at: start });
            }
            Transition::Opened(event) => {
                let symbol = classify_event(&event, self.config.dah_threshold);
                // The collector is never full while capturing
                let completed = match self.collector.append(symbol) {
                    Ok(completed) => completed,
                    Err(e) => {
                        warn!("Dropped {} blink at {:.3}s: {}", symbol.label(), event.end, e);
                        return updates;
                    }
                };
                self.last_symbol_at = Some(event.end);
                debug!(
                    "{} blink ({:.2}s) -> {}",
                    symbol.label(),
                    event.duration,
                    symbol.bit()
                );
                updates.push(SessionUpdate::SymbolAccepted {
                    symbol,
                    duration: event.duration,
                    collected: self.collector.len(),
                    total: PIN_LENGTH,
                });

                if let Some(pattern) = completed {
                    self.status = SessionStatus::Complete(pattern);
                    updates.push(SessionUpdate::PatternComplete { total: PIN_LENGTH });
                }
            }
        }

        updates
    }

    /// Apply a control signal
    pub fn control(&mut self, signal: ControlSignal) -> Vec<SessionUpdate> {
        if self.is_finished() {
            return Vec::new();
        }

        match signal {
            ControlSignal::Reset => {
                let discarded = self.reset();
                debug!("Reset requested, {} blinks discarded", discarded);
                vec![SessionUpdate::Reset { discarded }]
            }
            ControlSignal::Quit => {
                let collected = self.collector.len();
                self.abort(collected);
                debug!("Quit requested with {} blinks collected", collected);
                vec![SessionUpdate::Aborted { collected }]
            }
        }
    }

    /// Drop the partial pattern and any blink in progress
    fn reset(&mut self) -> usize {
        self.detector.reset();
        self.smoother.reset();
        self.last_symbol_at = None;
        self.collector.reset()
    }

    /// Discard all state; the attempt ends without a pattern
    fn abort(&mut self, collected: usize) {
        self.reset();
        self.status = SessionStatus::Aborted(collected);
    }

    /// Reset a stale partial pattern when an inactivity timeout is configured
    fn check_inactivity(&mut self, now: f64) -> Option<SessionUpdate> {
        let timeout = self.config.inactivity_timeout?;
        let last = self.last_symbol_at?;
        // Never cut a blink that is being timed
        if self.collector.is_empty() || self.eye_state() == EyeState::Closed {
            return None;
        }

        let idle = now - last;
        if idle <= timeout {
            return None;
        }

        let discarded = self.collector.reset();
        self.last_symbol_at = None;
        debug!("No blink for {:.1}s, {} blinks discarded", idle, discarded);
        Some(SessionUpdate::TimeoutReset { discarded, idle })
    }

    /// Consume the session, yielding the pattern if it was completed
    pub fn finish(mut self) -> Result<PatternSequence> {
        match self.status {
            SessionStatus::Complete(pattern) => Ok(pattern),
            SessionStatus::Aborted(collected) => Err(BlinkError::incomplete(collected)),
            SessionStatus::Capturing => Err(self.collector.abort()),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status != SessionStatus::Capturing
    }

    /// Symbols collected so far
    pub fn collected(&self) -> usize {
        self.collector.len()
    }

    pub fn eye_state(&self) -> EyeState {
        self.detector.state()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }
}

/// EAR for a frame, or `LandmarksUnavailable`
fn frame_ear(input: &FrameInput) -> Result<f64> {
    match input {
        FrameInput::Landmarks(landmarks) => calculate_ear(landmarks),
        FrameInput::Ear(ear) if ear.is_finite() && *ear >= 0.0 => Ok(*ear),
        FrameInput::Ear(_) | FrameInput::NoFace => Err(BlinkError::LandmarksUnavailable),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Symbol;

    const FPS: f64 = 20.0;
    const OPEN: f64 = 0.32;
    const SHUT: f64 = 0.10;

    fn config() -> BlinkConfig {
        BlinkConfig {
            smoothing_window: 1,
            ..Default::default()
        }
    }

    /// Frames for a sequence of blinks of the given durations, 1s apart
    fn blink_frames(durations: &[f64]) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut t = 0.0;
        let dt = 1.0 / FPS;
        let mut push = |ear: f64, secs: f64, t: &mut f64| {
            let n = (secs * FPS).round() as usize;
            for _ in 0..n {
                frames.push(Frame::ear(*t, ear));
                *t += dt;
            }
        };
        for &d in durations {
            push(OPEN, 1.0, &mut t);
            push(SHUT, d, &mut t);
        }
        push(OPEN, 1.0, &mut t);
        frames
    }

    fn run(session: &mut CaptureSession, frames: &[Frame]) -> Vec<SessionUpdate> {
        frames.iter().flat_map(|f| session.process_frame(f)).collect()
    }

    #[test]
    fn test_captures_pattern() {
        let config = config();
        let mut session = CaptureSession::new(&config);
        let updates = run(&mut session, &blink_frames(&[0.2, 0.15, 0.2, 0.6]));

        assert!(updates.contains(&SessionUpdate::PatternComplete { total: 4 }));
        assert_eq!(session.finish().unwrap().encode(), "0001");
    }

    #[test]
    fn test_progress_counts() {
        let config = config();
        let mut session = CaptureSession::new(&config);
        let counts: Vec<usize> = run(&mut session, &blink_frames(&[0.6, 0.6]))
            .into_iter()
            .filter_map(|u| match u {
                SessionUpdate::SymbolAccepted { collected, symbol, .. } => {
                    assert_eq!(symbol, Symbol::Dah);
                    Some(collected)
                }
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn test_no_face_frames_are_skipped() {
        let config = config();
        let mut session = CaptureSession::new(&config);
        let updates = session.process_frame(&Frame::no_face(0.0));
        assert!(updates.is_empty());
        assert_eq!(session.skipped_frames(), 1);
        assert_eq!(session.eye_state(), EyeState::Open);

        session.process_frame(&Frame::ear(0.05, -1.0));
        assert_eq!(session.skipped_frames(), 2);
    }

    #[test]
    fn test_reset_discards_prefix() {
        let config = config();
        let mut session = CaptureSession::new(&config);
        run(&mut session, &blink_frames(&[0.6, 0.6]));
        assert_eq!(session.collected(), 2);

        let updates = session.control(ControlSignal::Reset);
        assert_eq!(updates, vec![SessionUpdate::Reset { discarded: 2 }]);
        assert_eq!(session.collected(), 0);

        let later: Vec<Frame> = blink_frames(&[0.2, 0.2, 0.2, 0.2])
            .into_iter()
            .map(|f| Frame { timestamp: f.timestamp + 100.0, ..f })
            .collect();
        run(&mut session, &later);
        assert_eq!(session.finish().unwrap().encode(), "0000");
    }

    #[test]
    fn test_quit_aborts() {
        let config = config();
        let mut session = CaptureSession::new(&config);
        run(&mut session, &blink_frames(&[0.2]));

        let updates = session.control(ControlSignal::Quit);
        assert_eq!(updates, vec![SessionUpdate::Aborted { collected: 1 }]);
        assert_eq!(session.status(), SessionStatus::Aborted(1));

        // Later frames are ignored
        assert!(run(&mut session, &blink_frames(&[0.2; 4])).is_empty());
        assert!(matches!(
            session.finish(),
            Err(BlinkError::IncompletePattern { collected: 1, expected: 4 })
        ));
    }

    #[test]
    fn test_blinks_after_completion_are_ignored() {
        let config = config();
        let mut session = CaptureSession::new(&config);
        run(&mut session, &blink_frames(&[0.2, 0.2, 0.2, 0.6]));
        assert!(matches!(session.status(), SessionStatus::Complete(_)));

        let extra: Vec<Frame> = blink_frames(&[0.6])
            .into_iter()
            .map(|f| Frame { timestamp: f.timestamp + 100.0, ..f })
            .collect();
        assert!(run(&mut session, &extra).is_empty());
        assert_eq!(session.collected(), 4);
        assert_eq!(session.finish().unwrap().encode(), "0001");
    }

    #[test]
    fn test_unfinished_session_is_incomplete() {
        let config = config();
        let mut session = CaptureSession::new(&config);
        run(&mut session, &blink_frames(&[0.2, 0.6, 0.2]));
        assert!(matches!(
            session.finish(),
            Err(BlinkError::IncompletePattern { collected: 3, expected: 4 })
        ));
    }

    #[test]
    fn test_inactivity_timeout_resets() {
        let config = BlinkConfig {
            inactivity_timeout: Some(3.0),
            ..config()
        };
        let mut session = CaptureSession::new(&config);
        let mut frames = blink_frames(&[0.2, 0.2]);
        let t_end = frames.last().unwrap().timestamp;
        // 5 idle seconds of open eyes
        for i in 1..=100 {
            frames.push(Frame::ear(t_end + i as f64 * 0.05, OPEN));
        }

        let updates = run(&mut session, &frames);
        assert!(updates
            .iter()
            .any(|u| matches!(u, SessionUpdate::TimeoutReset { discarded: 2, .. })));
        assert_eq!(session.collected(), 0);
    }

    #[test]
    fn test_no_timeout_by_default() {
        let config = config();
        let mut session = CaptureSession::new(&config);
        let mut frames = blink_frames(&[0.2]);
        let t_end = frames.last().unwrap().timestamp;
        frames.push(Frame::ear(t_end + 3600.0, OPEN));

        run(&mut session, &frames);
        assert_eq!(session.collected(), 1);
    }

    #[test]
    fn test_default_smoothing_keeps_classification() {
        let config = BlinkConfig::default();
        let mut session = CaptureSession::new(&config);
        run(&mut session, &blink_frames(&[0.2, 0.6, 0.15, 0.8]));
        assert_eq!(session.finish().unwrap().encode(), "0101");
    }
}
