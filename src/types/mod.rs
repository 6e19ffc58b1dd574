//! Core types for Blink-PIN

mod state;
mod symbol;
mod pattern;
mod record;
mod output;
mod reason;

pub use state::EyeState;
pub use symbol::{Symbol, BlinkEvent};
pub use pattern::PatternSequence;
pub use record::{UserRecord, AuthOutcome, FailureReason};
pub use output::{SessionUpdate, UpdateOutput};
pub use reason::ReasonCode;
