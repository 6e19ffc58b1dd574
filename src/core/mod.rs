//! Core modules for Blink-PIN

pub mod ear;
pub mod detector;
pub mod classifier;
pub mod collector;
pub mod store;
pub mod session;
pub mod frames;
pub mod flow;

pub use ear::{calculate_ear, EarSmoother, EyeLandmarks, Point};
pub use detector::{BlinkDetector, Transition};
pub use classifier::{classify, classify_all, classify_event};
pub use collector::PatternCollector;
pub use store::{hash_pattern, validate_username, CredentialStore};
pub use session::{CaptureSession, ControlSignal, Frame, FrameInput, SessionInput, SessionStatus};
pub use frames::{parse_line, read_inputs};
pub use flow::{capture_pattern, AuthenticationFlow, RegistrationFlow};
