//! Blink symbols and events

use serde::{Deserialize, Serialize};

/// One blink, classified by duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Symbol {
    /// Short blink, bit 0
    Dit,
    /// Long blink, bit 1
    Dah,
}

impl Symbol {
    /// Bit character used in the canonical encoding
    pub fn bit(&self) -> char {
        match self {
            Symbol::Dit => '0',
            Symbol::Dah => '1',
        }
    }

    /// Parse a bit character back into a symbol
    pub fn from_bit(bit: char) -> Option<Self> {
        match bit {
            '0' => Some(Symbol::Dit),
            '1' => Some(Symbol::Dah),
            _ => None,
        }
    }

    /// Human-readable blink kind
    pub fn label(&self) -> &'static str {
        match self {
            Symbol::Dit => "QUICK",
            Symbol::Dah => "LONG",
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Symbol::Dit => "DIT",
            Symbol::Dah => "DAH",
        };
        write!(f, "{}", name)
    }
}

/// A completed blink, emitted on a confirmed closed → open transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkEvent {
    /// Timestamp of the first closed frame (seconds)
    pub start: f64,
    /// Timestamp of the first reopened frame (seconds)
    pub end: f64,
    /// `end - start`
    pub duration: f64,
}

impl BlinkEvent {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            duration: end - start,
        }
    }
}
