//! Registration and authentication flows
//!
//! Both flows capture a pattern through a fresh `CaptureSession` built from
//! the same `BlinkConfig`, and hash it with the same function.

use tracing::{debug, info, warn};

use crate::config::BlinkConfig;
use crate::core::session::{CaptureSession, SessionInput, SessionStatus};
use crate::core::store::{validate_username, CredentialStore};
use crate::error::{BlinkError, Result};
use crate::types::{AuthOutcome, PatternSequence, SessionUpdate, UserRecord};

/// Run a capture session over `inputs` until the pattern is complete,
/// the user quits, or the input runs out.
pub fn capture_pattern<I>(
    config: &BlinkConfig,
    inputs: I,
    mut on_update: impl FnMut(&SessionUpdate),
) -> Result<PatternSequence>
where
    I: IntoIterator<Item = Result<SessionInput>>,
{
    let mut session = CaptureSession::new(config);

    for input in inputs {
        for update in session.handle(&input?) {
            on_update(&update);
        }
        if session.is_finished() {
            break;
        }
    }

    debug!(
        "Capture ended after {} frames ({} skipped)",
        session.frame_count(),
        session.skipped_frames()
    );
    match session.status() {
        SessionStatus::Complete(_) => info!("Pattern captured"),
        SessionStatus::Aborted(collected) => info!("Capture quit with {} blinks", collected),
        SessionStatus::Capturing => {
            info!("Input ended with {} blinks collected", session.collected())
        }
    }
    session.finish()
}

/// Capture a pattern and store it under a new username
#[derive(Debug)]
pub struct RegistrationFlow<'a> {
    config: &'a BlinkConfig,
    store: &'a mut CredentialStore,
}

impl<'a> RegistrationFlow<'a> {
    pub fn new(config: &'a BlinkConfig, store: &'a mut CredentialStore) -> Self {
        Self { config, store }
    }

    /// Refuses taken or invalid usernames before any capture; a quit
    /// or short input leaves the store untouched.
    pub fn run<I>(
        &mut self,
        username: &str,
        inputs: I,
        on_update: impl FnMut(&SessionUpdate),
    ) -> Result<UserRecord>
    where
        I: IntoIterator<Item = Result<SessionInput>>,
    {
        let username = validate_username(username)?;
        if self.store.contains(username) {
            warn!("{} is already registered", username);
            return Err(BlinkError::AlreadyExists(username.to_string()));
        }

        let pattern = capture_pattern(self.config, inputs, on_update)?;
        self.store.register(username, &pattern)
    }
}

/// Capture a pattern and compare it with the stored one
#[derive(Debug)]
pub struct AuthenticationFlow<'a> {
    config: &'a BlinkConfig,
    store: &'a CredentialStore,
}

impl<'a> AuthenticationFlow<'a> {
    pub fn new(config: &'a BlinkConfig, store: &'a CredentialStore) -> Self {
        Self { config, store }
    }

    /// The username is looked up only after capture, so an unknown user
    /// goes through the same interaction as a wrong pattern.
    pub fn run<I>(
        &self,
        username: &str,
        inputs: I,
        on_update: impl FnMut(&SessionUpdate),
    ) -> Result<AuthOutcome>
    where
        I: IntoIterator<Item = Result<SessionInput>>,
    {
        let pattern = capture_pattern(self.config, inputs, on_update)?;
        Ok(self.store.verify(username, &pattern))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::{ControlSignal, Frame};
    use crate::types::FailureReason;
    use tempfile::TempDir;

    fn config() -> BlinkConfig {
        BlinkConfig {
            smoothing_window: 1,
            ..Default::default()
        }
    }

    const FPS: f64 = 60.0;

    /// 60 fps EAR frames: one second open before each blink and at the end
    fn inputs(durations: &[f64]) -> Vec<Result<SessionInput>> {
        let mut out = Vec::new();
        let mut frame = 0u32;
        let mut push = |ear: f64, n: u32| {
            for _ in 0..n {
                out.push(Ok(SessionInput::Frame(Frame::ear(frame as f64 / FPS, ear))));
                frame += 1;
            }
        };
        for &d in durations {
            push(0.3, FPS as u32);
            push(0.1, (d * FPS).round() as u32);
        }
        push(0.3, FPS as u32);
        out
    }

    #[test]
    fn test_register_then_authenticate() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let mut store = CredentialStore::open(dir.path().join("users.json")).unwrap();

        let record = RegistrationFlow::new(&config, &mut store)
            .run("alice", inputs(&[0.2, 0.1, 0.2, 0.6]), |_| {})
            .unwrap();
        assert_eq!(record.username, "alice");

        let auth = AuthenticationFlow::new(&config, &store);
        let ok = auth.run("alice", inputs(&[0.2, 0.1, 0.2, 0.6]), |_| {}).unwrap();
        assert_eq!(ok, AuthOutcome::Success);

        let bad = auth.run("alice", inputs(&[0.2, 0.1, 0.2, 0.2]), |_| {}).unwrap();
        assert_eq!(bad, AuthOutcome::Failure(FailureReason::HashMismatch));
    }

    #[test]
    fn test_registration_rejects_taken_name_before_capture() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let mut store = CredentialStore::open(dir.path().join("users.json")).unwrap();
        store
            .register("alice", &PatternSequence::from_bits("0001").unwrap())
            .unwrap();

        let mut updates = 0;
        let err = RegistrationFlow::new(&config, &mut store)
            .run("alice", inputs(&[0.6; 4]), |_| updates += 1)
            .unwrap_err();
        assert!(matches!(err, BlinkError::AlreadyExists(_)));
        assert_eq!(updates, 0);
    }

    #[test]
    fn test_quit_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let mut store = CredentialStore::open(dir.path().join("users.json")).unwrap();

        let mut input = inputs(&[0.2, 0.6]);
        input.push(Ok(SessionInput::Control(ControlSignal::Quit)));
        input.extend(inputs(&[0.2, 0.2, 0.2, 0.2]));

        let err = RegistrationFlow::new(&config, &mut store)
            .run("bob", input, |_| {})
            .unwrap_err();
        assert!(matches!(
            err,
            BlinkError::IncompletePattern { collected: 2, expected: 4 }
        ));
        assert!(store.is_empty());
        assert!(!dir.path().join("users.json").exists());
    }

    #[test]
    fn test_stream_error_propagates() {
        let config = config();
        let input: Vec<Result<SessionInput>> = vec![Err(BlinkError::FrameParse {
            line: 3,
            message: "bad".to_string(),
        })];
        let err = capture_pattern(&config, input, |_| {}).unwrap_err();
        assert!(matches!(err, BlinkError::FrameParse { line: 3, .. }));
    }
}
