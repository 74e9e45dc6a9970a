//! Design-matrix construction for one regression window.

use crate::error::{RegressionError, Result};
use loadings_data::Observation;
use ndarray::{Array1, Array2};

/// Regressors and response for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    /// W x (K + 1) regressors; column 0 is the intercept
    pub x: Array2<f64>,
    /// Length-W excess returns in window order
    pub y: Array1<f64>,
}

impl DesignMatrix {
    /// Number of rows (observations).
    pub fn observations(&self) -> usize {
        self.x.nrows()
    }

    /// Number of columns (intercept plus factors).
    pub fn parameters(&self) -> usize {
        self.x.ncols()
    }
}

/// Build the intercept-augmented design matrix from the first `window_size`
/// observations of `window`.
///
/// # Errors
///
/// Returns [`RegressionError::InsufficientData`] if `window` is shorter than
/// `window_size`, and [`RegressionError::DimensionMismatch`] if an observation
/// does not carry exactly `factor_count` factor returns.
pub fn build_design(
    window: &[Observation],
    window_size: usize,
    factor_count: usize,
) -> Result<DesignMatrix> {
    if window.len() < window_size {
        return Err(RegressionError::InsufficientData {
            required: window_size,
            actual: window.len(),
        });
    }
    let rows = &window[..window_size];

    if let Some(bad) = rows.iter().find(|o| o.factor_returns.len() != factor_count) {
        return Err(RegressionError::DimensionMismatch {
            expected: factor_count,
            actual: bad.factor_returns.len(),
        });
    }

    let x = Array2::from_shape_fn((window_size, factor_count + 1), |(i, j)| {
        if j == 0 {
            1.0
        } else {
            rows[i].factor_returns[j - 1]
        }
    });
    let y = rows.iter().map(|o| o.excess_return).collect();

    Ok(DesignMatrix { x, y })
}
