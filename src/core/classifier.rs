//! Symbol classifier: blink duration → Dit / Dah

use crate::types::{BlinkEvent, Symbol};

/// Classify a blink duration in seconds. The boundary itself is a Dah.
pub fn classify(duration: f64, dah_threshold: f64) -> Symbol {
    if duration >= dah_threshold {
        Symbol::Dah
    } else {
        Symbol::Dit
    }
}

/// Classify a detected blink
pub fn classify_event(event: &BlinkEvent, dah_threshold: f64) -> Symbol {
    classify(event.duration, dah_threshold)
}

/// Classify a run of durations in order
pub fn classify_all(durations: &[f64], dah_threshold: f64) -> Vec<Symbol> {
    durations
        .iter()
        .map(|&d| classify(d, dah_threshold))
        .collect()
}
