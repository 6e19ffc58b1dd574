//! Pattern collector: accumulates symbols into a PIN

use crate::error::{BlinkError, Result};
use crate::types::{PatternSequence, Symbol};
use crate::PIN_LENGTH;

/// Holds the symbols of one attempt, never more than `PIN_LENGTH`
#[derive(Debug, Clone, Default)]
pub struct PatternCollector {
    symbols: Vec<Symbol>,
}

impl PatternCollector {
    pub fn new() -> Self {
        Self {
            symbols: Vec::with_capacity(PIN_LENGTH),
        }
    }

    /// Append a symbol. Returns the sequence once it is complete;
    /// appending to a complete sequence fails until `reset`.
    pub fn append(&mut self, symbol: Symbol) -> Result<Option<PatternSequence>> {
        if self.is_complete() {
            return Err(BlinkError::PatternFull);
        }
        self.symbols.push(symbol);
        Ok(self.completed())
    }

    /// Discard everything collected, returning how many symbols were dropped
    pub fn reset(&mut self) -> usize {
        let discarded = self.symbols.len();
        self.symbols.clear();
        discarded
    }

    /// Discard everything and report the cancellation
    pub fn abort(&mut self) -> BlinkError {
        BlinkError::incomplete(self.reset())
    }

    /// The sequence, if complete
    pub fn completed(&self) -> Option<PatternSequence> {
        PatternSequence::new(&self.symbols).ok()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.symbols.len() == PIN_LENGTH
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use Symbol::{Dah, Dit};

    #[test]
    fn test_completes_on_fourth_symbol() {
        let mut collector = PatternCollector::new();
        assert_eq!(collector.append(Dit).unwrap(), None);
        assert_eq!(collector.append(Dah).unwrap(), None);
        assert_eq!(collector.append(Dit).unwrap(), None);

        let seq = collector.append(Dah).unwrap().expect("complete");
        assert_eq!(seq.encode(), "0101");
        assert!(collector.is_complete());
    }

    #[test]
    fn test_append_after_complete_rejected() {
        let mut collector = PatternCollector::new();
        for _ in 0..4 {
            collector.append(Dit).unwrap();
        }
        assert!(matches!(collector.append(Dah), Err(BlinkError::PatternFull)));
        assert_eq!(collector.len(), 4);
    }

    #[test]
    fn test_reset_mid_sequence() {
        let mut collector = PatternCollector::new();
        collector.append(Dah).unwrap();
        collector.append(Dah).unwrap();
        assert_eq!(collector.reset(), 2);
        assert!(collector.is_empty());

        let mut last = None;
        for s in [Dit, Dit, Dit, Dah] {
            last = collector.append(s).unwrap();
        }
        assert_eq!(last.unwrap().encode(), "0001");
    }

    #[test]
    fn test_abort_reports_progress() {
        let mut collector = PatternCollector::new();
        collector.append(Dit).unwrap();

        let err = collector.abort();
        assert!(matches!(err, BlinkError::IncompletePattern { collected: 1, .. }));
        assert!(collector.is_empty());
        assert!(collector.completed().is_none());
    }
}
