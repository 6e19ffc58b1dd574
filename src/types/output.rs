//! Output structures for the presentation layer

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::types::{ReasonCode, Symbol};

/// Something the presentation layer should show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// Closure confirmed at frame time `at`
    BlinkStarted { at: f64 },
    /// Blink classified and appended
    SymbolAccepted {
        symbol: Symbol,
        duration: f64,
        collected: usize,
        total: usize,
    },
    /// Pattern has all its symbols
    PatternComplete { total: usize },
    /// Acknowledges a reset control signal
    Reset { discarded: usize },
    /// Partial pattern dropped after `idle` seconds without a blink
    TimeoutReset { discarded: usize, idle: f64 },
    /// Acknowledges a quit control signal
    Aborted { collected: usize },
}

impl SessionUpdate {
    pub fn reason(&self) -> ReasonCode {
        match self {
            Self::BlinkStarted { .. } => ReasonCode::R101_BLINK_STARTED,
            Self::SymbolAccepted { .. } => ReasonCode::R102_SYMBOL_ACCEPTED,
            Self::PatternComplete { .. } => ReasonCode::R103_PATTERN_COMPLETE,
            Self::Reset { .. } => ReasonCode::R201_RESET_REQUESTED,
            Self::TimeoutReset { .. } => ReasonCode::R202_RESET_TIMEOUT,
            Self::Aborted { .. } => ReasonCode::R203_SESSION_ABORTED,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let text = self.to_parseable_string();
        match self {
            Self::BlinkStarted { .. } => text.dimmed().to_string(),
            Self::SymbolAccepted { symbol: Symbol::Dit, .. } => text.green().to_string(),
            Self::SymbolAccepted { symbol: Symbol::Dah, .. } => text.red().to_string(),
            Self::PatternComplete { .. } => text.cyan().bold().to_string(),
            Self::Reset { .. } | Self::TimeoutReset { .. } => text.yellow().to_string(),
            Self::Aborted { .. } => text.bright_black().to_string(),
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        match self {
            Self::BlinkStarted { at } => format!("blink started at {:.3}s", at),
            Self::SymbolAccepted { symbol, duration, collected, total } => format!(
                "{} blink ({:.2}s) -> {} | PIN: {}/{}",
                symbol.label(),
                duration,
                symbol.bit(),
                collected,
                total
            ),
            Self::PatternComplete { total } => format!("PIN capture complete ({} blinks)", total),
            Self::Reset { discarded } => format!("reset, {} blinks discarded", discarded),
            Self::TimeoutReset { discarded, idle } => format!(
                "reset after {:.1}s idle, {} blinks discarded",
                idle, discarded
            ),
            Self::Aborted { collected } => format!("aborted with {} blinks collected", collected),
        }
    }
}

/// Timestamped update, for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOutput {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub update: SessionUpdate,
    pub reason: ReasonCode,
}

impl UpdateOutput {
    pub fn new(update: SessionUpdate) -> Self {
        Self {
            timestamp: Utc::now(),
            reason: update.reason(),
            update,
        }
    }
}
