//! Signal generation — discrete position states from indicator values.
//!
//! Rules look only at indicator values and closes at the same bar, plus the
//! state carried forward from the previous bar. They never see returns or
//! any later bar.

pub mod rules;
pub mod state;

pub use rules::{SignalConfig, SignalEngine, SignalRule};
pub use state::{ShortPolicy, SignalState};

use serde::Serialize;

/// Signal states aligned index-for-index with a `PriceSeries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SignalSeries {
    states: Vec<SignalState>,
}

impl SignalSeries {
    pub fn states(&self) -> &[SignalState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<SignalState> {
        self.states.get(index).copied()
    }

    /// Number of bars spent in `state`.
    pub fn count(&self, state: SignalState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }
}

/// Forward-fill per-bar decisions into a state series.
///
/// `Some(state)` switches to `state`; `None` keeps the previous state. The
/// series starts `Flat`. This is a fold carrying one state variable: a bar
/// back in the neutral zone never resets the position.
pub fn forward_fill<I>(decisions: I) -> SignalSeries
where
    I: IntoIterator<Item = Option<SignalState>>,
{
    let states = decisions
        .into_iter()
        .scan(SignalState::Flat, |state, decision| {
            if let Some(next) = decision {
                *state = next;
            }
            Some(*state)
        })
        .collect();
    SignalSeries { states }
}
