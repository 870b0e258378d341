//! Strategy backtest — pure functions from closes and signal states to returns.
//!
//! strategy_return[t] = price_return[t] * position(state[t-1])
//!
//! The position used at bar t is the one decided at the previous close, so a
//! signal never trades on the bar that produced it.

use crate::domain::PriceSeries;
use crate::indicators::closes_of;
use crate::signals::{ShortPolicy, SignalSeries, SignalState};
use serde::Serialize;

/// Outcome of one backtest run. Recomputed on every run, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    /// Π(1 + r) - 1 over defined strategy returns.
    pub total_return: f64,
    /// Π(1 + r) - 1 over defined price returns (holding the whole span).
    pub buy_and_hold_return: f64,
    /// Per-bar strategy returns, aligned with the price series.
    pub returns: Vec<Option<f64>>,
    pub periods_long: usize,
    pub periods_flat: usize,
    pub periods_short: usize,
}

/// Period-over-period close change: close[t] / close[t-1] - 1.
///
/// Undefined at index 0 and wherever either close is undefined or the
/// previous close is zero.
pub fn price_returns(series: &PriceSeries) -> Vec<Option<f64>> {
    let closes = closes_of(series);
    std::iter::once(None)
        .chain(closes.windows(2).map(|w| match (w[0], w[1]) {
            (Some(prev), Some(curr)) if prev != 0.0 => Some(curr / prev - 1.0),
            _ => None,
        }))
        .collect()
}

/// Strategy returns using the previous bar's state.
///
/// # Panics
/// If the two inputs are not aligned.
pub fn strategy_returns(
    price_returns: &[Option<f64>],
    signals: &SignalSeries,
    policy: ShortPolicy,
) -> Vec<Option<f64>> {
    assert_eq!(
        price_returns.len(),
        signals.len(),
        "price returns and signals must be aligned"
    );
    std::iter::once(None)
        .chain(
            price_returns
                .iter()
                .skip(1)
                .zip(signals.states())
                .map(|(ret, prev_state)| ret.map(|r| r * prev_state.position(policy))),
        )
        .take(price_returns.len())
        .collect()
}

/// Compounded total return. Undefined entries contribute a factor of 1.
pub fn compound(returns: &[Option<f64>]) -> f64 {
    returns.iter().flatten().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Run the full backtest for one series and its signals.
pub fn run_backtest(
    series: &PriceSeries,
    signals: &SignalSeries,
    policy: ShortPolicy,
) -> BacktestResult {
    let price = price_returns(series);
    let returns = strategy_returns(&price, signals, policy);
    BacktestResult {
        total_return: compound(&returns),
        buy_and_hold_return: compound(&price),
        returns,
        periods_long: signals.count(SignalState::Long),
        periods_flat: signals.count(SignalState::Flat),
        periods_short: signals.count(SignalState::Short),
    }
}
