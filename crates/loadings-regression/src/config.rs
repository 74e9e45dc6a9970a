//! Estimation configuration.

use crate::error::{RegressionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default window length: three years of monthly returns.
pub const DEFAULT_WINDOW_SIZE: usize = 36;

/// Fama-French five-factor column names.
pub const DEFAULT_FACTOR_NAMES: &[&str] = &["Mkt-RF", "SMB", "HML", "RMW", "CMA"];

/// Default relative tolerance for rank detection in the QR solver.
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-10;

/// Settings shared by every fund in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Periods per regression window (default: 36)
    pub window_size: usize,

    /// Ordered factor list; betas are reported in this order
    pub factor_names: Vec<String>,

    /// A column is treated as dependent when its remaining norm after
    /// orthogonalisation falls below this fraction of its original norm
    /// (default: 1e-10)
    pub rank_tolerance: f64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            factor_names: DEFAULT_FACTOR_NAMES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        }
    }
}

impl EstimationConfig {
    /// Create a configuration with the default rank tolerance.
    pub fn new(window_size: usize, factor_names: Vec<String>) -> Self {
        Self {
            window_size,
            factor_names,
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        }
    }

    /// Number of factors (K).
    pub fn factor_count(&self) -> usize {
        self.factor_names.len()
    }

    /// Number of regression coefficients, intercept included (K + 1).
    pub fn parameter_count(&self) -> usize {
        self.factor_names.len() + 1
    }

    /// Smallest window that leaves at least one residual degree of freedom.
    pub fn min_window_size(&self) -> usize {
        self.factor_names.len() + 2
    }

    /// Check the configuration before any fund is processed.
    ///
    /// # Errors
    ///
    /// Returns [`RegressionError::Configuration`] if the factor list is empty or
    /// has duplicates, if the window is shorter than K + 2, or if the rank
    /// tolerance is not a finite positive number.
    pub fn validate(&self) -> Result<()> {
        if self.factor_names.is_empty() {
            return Err(RegressionError::Configuration(
                "factor list is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.factor_names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(RegressionError::Configuration(format!(
                "factor '{dup}' is listed more than once"
            )));
        }

        if self.window_size < self.min_window_size() {
            return Err(RegressionError::Configuration(format!(
                "window size {} is smaller than factor count + 2 = {}",
                self.window_size,
                self.min_window_size()
            )));
        }

        if !self.rank_tolerance.is_finite() || self.rank_tolerance <= 0.0 {
            return Err(RegressionError::Configuration(format!(
                "rank tolerance {} must be a finite positive number",
                self.rank_tolerance
            )));
        }

        Ok(())
    }
}
