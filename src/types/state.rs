//! Eye state definitions

use serde::{Deserialize, Serialize};

/// The two states of the blink detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EyeState {
    /// Eyes open, waiting for a closure
    #[default]
    Open,
    /// Closure confirmed, timing the blink
    Closed,
}

impl std::fmt::Display for EyeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EyeState::Open => "OPEN",
            EyeState::Closed => "CLOSED",
        };
        write!(f, "{}", name)
    }
}
