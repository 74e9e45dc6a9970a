//! Rolling-window driver.
//!
//! Visits every window start `i` in `0..=n - W` with step one (fully
//! overlapping windows), builds the design matrix, and fits it. A singular
//! window is recorded as skipped and the driver moves on; any other error ends
//! the fund.

use crate::config::EstimationConfig;
use crate::design::build_design;
use crate::error::{RegressionError, Result, SingularReason};
use crate::ols::{OlsFit, solve_ols};
use chrono::NaiveDate;
use loadings_data::FundSeries;
use serde::{Deserialize, Serialize};

/// Coefficients and standard errors for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Intercept (alpha)
    pub intercept: f64,
    /// Factor betas in factor-list order
    pub betas: Vec<f64>,
    /// Standard error of the intercept
    pub intercept_se: f64,
    /// Standard errors parallel to `betas`
    pub beta_ses: Vec<f64>,
    /// Centred R-squared of the window fit
    pub r_squared: f64,
    /// Residual variance σ²
    pub residual_variance: f64,
    /// Observations in the window
    pub observations: usize,
}

impl From<OlsFit> for RegressionResult {
    fn from(fit: OlsFit) -> Self {
        let coefficients = fit.coefficients.to_vec();
        let standard_errors = fit.standard_errors.to_vec();
        Self {
            intercept: coefficients[0],
            betas: coefficients[1..].to_vec(),
            intercept_se: standard_errors[0],
            beta_ses: standard_errors[1..].to_vec(),
            r_squared: fit.r_squared,
            residual_variance: fit.residual_variance,
            observations: fit.observations,
        }
    }
}

/// A successful window fit, tagged with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFit {
    /// Index of the first observation in the window
    pub start: usize,
    /// Index of the last observation in the window
    pub end_index: usize,
    /// Fit output
    pub result: RegressionResult,
}

/// A window that could not be fitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedWindow {
    /// Index of the first observation in the window
    pub start: usize,
    /// Index of the last observation in the window
    pub end_index: usize,
    /// Date of the last observation in the window
    pub end_date: NaiveDate,
    /// Why the fit failed
    #[serde(serialize_with = "serialize_reason")]
    pub reason: SingularReason,
}

fn serialize_reason<S: serde::Serializer>(
    reason: &SingularReason,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

/// Every window outcome for one fund.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RollingFit {
    /// Successful fits in increasing start order
    pub fits: Vec<WindowFit>,
    /// Skipped windows in increasing start order
    pub skipped: Vec<SkippedWindow>,
}

impl RollingFit {
    /// Number of windows visited.
    pub fn windows(&self) -> usize {
        self.fits.len() + self.skipped.len()
    }
}

/// Run the rolling regression over one fund.
///
/// # Errors
///
/// Returns [`RegressionError::Configuration`] if `config` fails
/// [`EstimationConfig::validate`],
/// [`RegressionError::InsufficientData`] if the series is shorter than
/// one window, and [`RegressionError::DimensionMismatch`] if the series was
/// aligned for a different number of factors than `config` lists. Singular
/// windows are not errors; they are reported in [`RollingFit::skipped`].
pub fn rolling_regression(series: &FundSeries, config: &EstimationConfig) -> Result<RollingFit> {
    config.validate()?;

    let n = series.len();
    let w = config.window_size;
    let k = config.factor_count();

    if n < w {
        return Err(RegressionError::InsufficientData {
            required: w,
            actual: n,
        });
    }
    if series.factor_count() != k {
        return Err(RegressionError::DimensionMismatch {
            expected: k,
            actual: series.factor_count(),
        });
    }

    let observations = series.observations();
    let mut rolling = RollingFit::default();

    for start in 0..=n - w {
        let end_index = start + w - 1;
        let design = build_design(&observations[start..=end_index], w, k)?;

        match solve_ols(&design.x, &design.y, config.rank_tolerance) {
            Ok(fit) => rolling.fits.push(WindowFit {
                start,
                end_index,
                result: fit.into(),
            }),
            Err(RegressionError::SingularDesignMatrix(reason)) => {
                let end_date = observations[end_index].date;
                tracing::warn!(
                    fund = %series.fund(),
                    start,
                    %end_date,
                    %reason,
                    "skipping singular window"
                );
                rolling.skipped.push(SkippedWindow {
                    start,
                    end_index,
                    end_date,
                    reason,
                });
            }
            Err(err) => return Err(err),
        }
    }

    Ok(rolling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use loadings_data::Observation;
    use rstest::rstest;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 5, d).unwrap()
    }

    fn series(points: &[(f64, f64)]) -> FundSeries {
        let obs = points
            .iter()
            .enumerate()
            .map(|(i, &(y, f))| Observation::new(day(i as u32 + 1), y, vec![f]))
            .collect();
        FundSeries::new("Fund".into(), 1, obs).unwrap()
    }

    fn config(window: usize) -> EstimationConfig {
        EstimationConfig::new(window, vec!["F1".to_string()])
    }

    #[test]
    fn test_window_positions() {
        let s = series(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0), (5.0, 5.0)]);
        let rolling = rolling_regression(&s, &config(3)).unwrap();

        assert_eq!(rolling.windows(), 3);
        assert!(rolling.skipped.is_empty());
        let ends: Vec<usize> = rolling.fits.iter().map(|f| f.end_index).collect();
        assert_eq!(ends, vec![2, 3, 4]);
        for fit in &rolling.fits {
            assert_abs_diff_eq!(fit.result.intercept, 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(fit.result.betas[0], 1.0, epsilon = 1e-9);
            assert_eq!(fit.result.observations, 3);
        }
    }

    #[test]
    fn test_short_series() {
        let s = series(&[(1.0, 1.0), (2.0, 2.0)]);
        let err = rolling_regression(&s, &config(3)).unwrap_err();
        assert_eq!(
            err,
            RegressionError::InsufficientData {
                required: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_exact_length_gives_one_window() {
        let s = series(&[(1.0, 1.0), (2.5, 2.0), (2.0, 3.0)]);
        let rolling = rolling_regression(&s, &config(3)).unwrap();
        assert_eq!(rolling.fits.len(), 1);
        assert_eq!(rolling.fits[0].start, 0);
    }

    #[test]
    fn test_singular_window_is_skipped() {
        // Factor is flat over observations 0..=2, so only window 0 is singular.
        let s = series(&[(1.0, 0.5), (2.0, 0.5), (3.0, 0.5), (4.0, 1.0), (5.0, 2.0)]);
        let rolling = rolling_regression(&s, &config(3)).unwrap();

        assert_eq!(rolling.windows(), 3);
        assert_eq!(rolling.skipped.len(), 1);
        assert_eq!(rolling.skipped[0].start, 0);
        assert_eq!(rolling.skipped[0].end_date, day(3));
        assert_eq!(
            rolling.skipped[0].reason,
            SingularReason::RankDeficient { column: 1 }
        );
        let starts: Vec<usize> = rolling.fits.iter().map(|f| f.start).collect();
        assert_eq!(starts, vec![1, 2]);
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    fn test_invalid_window_is_configuration_error(#[case] window: usize) {
        let s = FundSeries::empty("Fund".into(), 1);
        assert!(matches!(
            rolling_regression(&s, &config(window)),
            Err(RegressionError::Configuration(_))
        ));
    }

    #[test]
    fn test_factor_width_mismatch() {
        let s = series(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);
        let cfg = EstimationConfig::new(4, vec!["F1".to_string(), "F2".to_string()]);
        assert!(matches!(
            rolling_regression(&s, &cfg),
            Err(RegressionError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
}
