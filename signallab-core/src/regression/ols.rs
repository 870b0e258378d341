//! Ordinary least squares with an intercept.
//!
//! Features and target are centered, the normal equations `XcᵀXc β = Xcᵀyc`
//! are solved by Gauss-Jordan elimination with partial pivoting, and the
//! intercept is recovered as `ȳ - β·x̄`. A column that is constant or a
//! linear combination of earlier columns gets a zero coefficient and is
//! reported as dropped instead of failing the fit.

use crate::error::ComputationError;
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Pivots smaller than this fraction of the largest diagonal entry are
/// treated as zero.
const RELATIVE_PIVOT_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    coefficients: Array1<f64>,
    intercept: f64,
    dropped: Vec<usize>,
}

impl LinearRegression {
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>) -> Result<Self, ComputationError> {
        let rows = x.nrows();
        if rows == 0 || rows != y.len() {
            return Err(ComputationError::InsufficientRows { rows });
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(ComputationError::SingularMatrix);
        }

        let x_mean = x.mean_axis(Axis(0)).ok_or(ComputationError::SingularMatrix)?;
        let y_mean = y.mean().ok_or(ComputationError::SingularMatrix)?;
        let xc = x - &x_mean;
        let yc = y - y_mean;

        let xtx = xc.t().dot(&xc);
        let xty = xc.t().dot(&yc);
        let (coefficients, dropped) = solve_normal_equations(xtx, xty)?;

        let intercept = y_mean - coefficients.dot(&x_mean);
        if !intercept.is_finite() {
            return Err(ComputationError::SingularMatrix);
        }

        Ok(Self {
            coefficients,
            intercept,
            dropped,
        })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }

    pub fn predict_one(&self, row: ArrayView1<f64>) -> f64 {
        row.dot(&self.coefficients) + self.intercept
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Column indices that carried no independent information.
    pub fn dropped(&self) -> &[usize] {
        &self.dropped
    }
}

/// Reduce `[a | b]` to reduced row echelon form. Columns without a usable
/// pivot are free; their coefficient is fixed at zero.
fn solve_normal_equations(
    mut a: Array2<f64>,
    mut b: Array1<f64>,
) -> Result<(Array1<f64>, Vec<usize>), ComputationError> {
    let n = a.ncols();
    let scale = a.diag().iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let tolerance = scale * RELATIVE_PIVOT_TOLERANCE;

    let mut pivot_row_of = vec![None; n];
    let mut row = 0;
    for col in 0..n {
        if row == n {
            break;
        }
        let Some(pivot) = (row..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
        else {
            continue;
        };
        if a[[pivot, col]].abs() <= tolerance {
            continue;
        }
        if pivot != row {
            for k in 0..n {
                a.swap([pivot, k], [row, k]);
            }
            b.swap(pivot, row);
        }

        let p = a[[row, col]];
        a.row_mut(row).mapv_inplace(|v| v / p);
        b[row] /= p;

        for other in 0..n {
            if other == row {
                continue;
            }
            let factor = a[[other, col]];
            if factor == 0.0 {
                continue;
            }
            let pivot_row = a.row(row).to_owned();
            a.row_mut(other).scaled_add(-factor, &pivot_row);
            b[other] -= factor * b[row];
        }
        pivot_row_of[col] = Some(row);
        row += 1;
    }

    let mut beta = Array1::zeros(n);
    let mut dropped = Vec::new();
    for (col, pivot) in pivot_row_of.into_iter().enumerate() {
        match pivot {
            Some(r) => beta[col] = b[r],
            None => dropped.push(col),
        }
    }
    if beta.iter().any(|v: &f64| !v.is_finite()) {
        return Err(ComputationError::SingularMatrix);
    }
    Ok((beta, dropped))
}
