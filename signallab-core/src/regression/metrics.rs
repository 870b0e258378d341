//! Goodness-of-fit metrics over actual/predicted pairs.

use ndarray::Array1;
use serde::Serialize;

const CONSTANT_TARGET_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitMetrics {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
}

impl FitMetrics {
    pub fn calculate(actual: &Array1<f64>, predicted: &Array1<f64>) -> Self {
        Self {
            r2: r_squared(actual, predicted),
            rmse: root_mean_squared_error(actual, predicted),
            mae: mean_absolute_error(actual, predicted),
        }
    }
}

/// R² = 1 - SS_res / SS_tot.
///
/// With a constant target SS_tot is zero; the score is 1.0 when every
/// prediction is exact and 0.0 otherwise.
pub fn r_squared(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    let mean = actual.mean().unwrap_or(0.0);
    let ss_res = sum_sq(actual, predicted);
    let ss_tot: f64 = actual.iter().map(|&a| (a - mean).powi(2)).sum();

    if ss_tot < CONSTANT_TARGET_EPS {
        return if ss_res < CONSTANT_TARGET_EPS { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn root_mean_squared_error(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    (sum_sq(actual, predicted) / actual.len() as f64).sqrt()
}

pub fn mean_absolute_error(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

fn sum_sq(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum()
}
