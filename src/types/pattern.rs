//! Completed blink patterns
//!
//! A `PatternSequence` always holds exactly `PIN_LENGTH` symbols; partial
//! input lives in the `PatternCollector` until it is complete.

use serde::{Deserialize, Serialize};

use crate::error::{BlinkError, Result};
use crate::types::Symbol;
use crate::PIN_LENGTH;

/// A complete blink PIN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSequence {
    symbols: [Symbol; PIN_LENGTH],
}

impl PatternSequence {
    /// Build from exactly `PIN_LENGTH` symbols
    pub fn new(symbols: &[Symbol]) -> Result<Self> {
        let symbols: [Symbol; PIN_LENGTH] = symbols
            .try_into()
            .map_err(|_| BlinkError::incomplete(symbols.len()))?;
        Ok(Self { symbols })
    }

    /// Parse a bit string such as `"0001"`
    pub fn from_bits(bits: &str) -> Result<Self> {
        let symbols = bits
            .chars()
            .map(Symbol::from_bit)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| BlinkError::InvalidPattern(bits.to_string()))?;
        Self::new(&symbols)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Canonical encoding: one bit character per symbol, in order
    pub fn encode(&self) -> String {
        self.symbols.iter().map(Symbol::bit).collect()
    }
}

impl std::fmt::Display for PatternSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}
