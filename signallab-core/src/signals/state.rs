//! Signal state — the discrete position a rule asks for at each bar.

use serde::{Deserialize, Serialize};

/// Desired market exposure at the close of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalState {
    Long,
    #[default]
    Flat,
    Short,
}

impl SignalState {
    /// Numeric position held while in this state.
    pub fn position(&self, policy: ShortPolicy) -> f64 {
        match self {
            SignalState::Long => 1.0,
            SignalState::Flat => 0.0,
            SignalState::Short => match policy {
                ShortPolicy::Flat => 0.0,
                ShortPolicy::Inverse => -1.0,
            },
        }
    }
}

/// How a SHORT state contributes to strategy returns.
///
/// `Flat` reads SHORT as "sell / exit" (position 0); `Inverse` holds a true
/// short position (-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortPolicy {
    #[default]
    Flat,
    Inverse,
}
