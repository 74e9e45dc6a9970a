//! Per-fund packaging of window results.

use crate::config::EstimationConfig;
use crate::dates::map_window_dates;
use crate::error::RegressionError;
use crate::rolling::{RegressionResult, SkippedWindow, WindowFit, rolling_regression};
use chrono::NaiveDate;
use loadings_data::{FundId, FundSeries};
use serde::{Deserialize, Serialize};

/// One window's loadings for one fund, stamped with the window end date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorLoadingRecord {
    /// Date of the window's last observation
    pub date: NaiveDate,
    /// Fund identifier
    pub fund: FundId,
    /// Intercept (alpha)
    pub intercept: f64,
    /// Betas in factor-list order
    pub betas: Vec<f64>,
    /// Standard error of the intercept
    pub intercept_se: f64,
    /// Standard errors parallel to `betas`
    pub beta_ses: Vec<f64>,
    /// Centred R-squared of the window fit
    pub r_squared: f64,
    /// Residual variance σ²
    pub residual_variance: f64,
}

impl FactorLoadingRecord {
    /// Attach a date and fund to a window result.
    pub fn new(date: NaiveDate, fund: FundId, result: RegressionResult) -> Self {
        Self {
            date,
            fund,
            intercept: result.intercept,
            betas: result.betas,
            intercept_se: result.intercept_se,
            beta_ses: result.beta_ses,
            r_squared: result.r_squared,
            residual_variance: result.residual_variance,
        }
    }
}

/// Date-ordered loadings for one fund.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundLoadings {
    fund: FundId,
    records: Vec<FactorLoadingRecord>,
}

impl FundLoadings {
    /// Loadings with no records.
    pub const fn empty(fund: FundId) -> Self {
        Self {
            fund,
            records: Vec::new(),
        }
    }

    /// Fund identifier.
    pub const fn fund(&self) -> &FundId {
        &self.fund
    }

    /// Records in increasing date order.
    pub fn records(&self) -> &[FactorLoadingRecord] {
        &self.records
    }

    /// Take ownership of the records.
    pub fn into_records(self) -> Vec<FactorLoadingRecord> {
        self.records
    }

    /// Number of records.
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<&FactorLoadingRecord> {
        self.records.last()
    }
}

/// Zip window dates with window results into a fund's loadings.
///
/// `dates` and `fits` must be parallel, as produced by
/// [`map_window_dates`]; extra elements on either side are ignored.
pub fn assemble_loadings(fund: FundId, dates: Vec<NaiveDate>, fits: Vec<WindowFit>) -> FundLoadings {
    let records = dates
        .into_iter()
        .zip(fits)
        .map(|(date, fit)| FactorLoadingRecord::new(date, fund.clone(), fit.result))
        .collect();
    FundLoadings { fund, records }
}

/// How a fund's estimation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FundStatus {
    /// Windows were visited; some may have been skipped.
    Estimated {
        /// Windows visited
        windows: usize,
        /// Windows that produced a record
        fitted: usize,
    },
    /// Fewer usable observations than one window.
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },
    /// The fund could not be processed.
    Failed {
        /// Error description
        reason: String,
    },
}

/// Loadings plus the audit trail for one fund.
#[derive(Debug, Clone, PartialEq)]
pub struct FundRun {
    /// Records produced (possibly empty)
    pub loadings: FundLoadings,
    /// Outcome
    pub status: FundStatus,
    /// Windows skipped as singular
    pub skipped: Vec<SkippedWindow>,
}

impl FundRun {
    /// Fund identifier.
    pub const fn fund(&self) -> &FundId {
        self.loadings.fund()
    }

    /// Whether the fund produced at least one record.
    pub const fn has_output(&self) -> bool {
        !self.loadings.is_empty()
    }

    /// Run for a fund that never reached estimation because its data was
    /// rejected during alignment.
    pub(crate) fn rejected(fund: FundId, reason: String) -> Self {
        Self::without_output(fund, FundStatus::Failed { reason })
    }

    fn without_output(fund: FundId, status: FundStatus) -> Self {
        Self {
            loadings: FundLoadings::empty(fund),
            status,
            skipped: Vec::new(),
        }
    }
}

/// Estimate one fund's loadings.
///
/// Fund-level problems never escape as errors: a short series becomes
/// [`FundStatus::InsufficientData`] and anything unexpected becomes
/// [`FundStatus::Failed`], each with empty loadings.
pub fn estimate_fund(series: &FundSeries, config: &EstimationConfig) -> FundRun {
    let fund = series.fund().clone();

    let rolling = match rolling_regression(series, config) {
        Ok(rolling) => rolling,
        Err(RegressionError::InsufficientData { required, actual }) => {
            tracing::info!(%fund, required, actual, "not enough observations for one window");
            return FundRun::without_output(fund, FundStatus::InsufficientData { required, actual });
        }
        Err(err) => {
            tracing::warn!(%fund, error = %err, "fund estimation failed");
            return FundRun::without_output(
                fund,
                FundStatus::Failed {
                    reason: err.to_string(),
                },
            );
        }
    };

    let dates = match map_window_dates(series, &rolling.fits) {
        Ok(dates) => dates,
        Err(err) => {
            tracing::warn!(%fund, error = %err, "window date mapping failed");
            return FundRun::without_output(
                fund,
                FundStatus::Failed {
                    reason: err.to_string(),
                },
            );
        }
    };

    let status = FundStatus::Estimated {
        windows: rolling.windows(),
        fitted: rolling.fits.len(),
    };
    tracing::debug!(
        %fund,
        windows = rolling.windows(),
        skipped = rolling.skipped.len(),
        "estimated fund loadings"
    );

    FundRun {
        loadings: assemble_loadings(fund, dates, rolling.fits),
        status,
        skipped: rolling.skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadings_data::Observation;

    fn series(n: usize) -> FundSeries {
        let obs = (0..n)
            .map(|i| {
                let f = i as f64;
                Observation::new(
                    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Days::new(i as u64),
                    0.5 + 2.0 * f + if i % 2 == 0 { 0.1 } else { -0.1 },
                    vec![f],
                )
            })
            .collect();
        FundSeries::new("Fund".into(), 1, obs).unwrap()
    }

    fn config() -> EstimationConfig {
        EstimationConfig::new(4, vec!["F1".to_string()])
    }

    #[test]
    fn test_estimate_fund_records() {
        let s = series(6);
        let run = estimate_fund(&s, &config());

        assert_eq!(run.status, FundStatus::Estimated { windows: 3, fitted: 3 });
        assert_eq!(run.loadings.len(), 3);
        assert!(run.has_output());
        assert_eq!(run.fund().as_str(), "Fund");

        let dates: Vec<NaiveDate> = run.loadings.records().iter().map(|r| r.date).collect();
        let expected: Vec<NaiveDate> = (3..6).map(|i| s.get(i).unwrap().date).collect();
        assert_eq!(dates, expected);

        for record in run.loadings.records() {
            assert_eq!(record.betas.len(), 1);
            assert_eq!(record.beta_ses.len(), 1);
            assert!(record.intercept_se > 0.0);
            assert!(record.beta_ses[0] > 0.0);
        }
    }

    #[test]
    fn test_estimate_fund_insufficient() {
        let run = estimate_fund(&series(3), &config());
        assert!(run.loadings.is_empty());
        assert_eq!(
            run.status,
            FundStatus::InsufficientData {
                required: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_estimate_fund_width_mismatch_is_failed() {
        let cfg = EstimationConfig::new(4, vec!["F1".to_string(), "F2".to_string()]);
        let run = estimate_fund(&series(6), &cfg);
        assert!(matches!(run.status, FundStatus::Failed { .. }));
        assert!(!run.has_output());
    }

    #[test]
    fn test_assemble_zips_in_order() {
        let result = RegressionResult {
            intercept: 0.1,
            betas: vec![1.2],
            intercept_se: 0.01,
            beta_ses: vec![0.02],
            r_squared: 0.9,
            residual_variance: 0.001,
            observations: 4,
        };
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let fits = vec![
            WindowFit {
                start: 0,
                end_index: 3,
                result: result.clone(),
            },
            WindowFit {
                start: 1,
                end_index: 4,
                result,
            },
        ];
        let loadings = assemble_loadings("Fund".into(), vec![d1, d2], fits);
        assert_eq!(loadings.len(), 2);
        assert_eq!(loadings.records()[0].date, d1);
        assert_eq!(loadings.latest().unwrap().date, d2);
        assert_eq!(loadings.records()[1].fund.as_str(), "Fund");
        assert_eq!(loadings.records()[1].betas, vec![1.2]);
    }
}
