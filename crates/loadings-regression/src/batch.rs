//! Estimation over a whole fund universe.
//!
//! Funds are independent: each task reads its own [`FundSeries`] plus the
//! shared, immutable [`EstimationConfig`], so the universe is processed with a
//! plain parallel map and no locking. Results come back in universe order.

use crate::assemble::{FactorLoadingRecord, FundRun, FundStatus, estimate_fund};
use crate::config::EstimationConfig;
use crate::error::{RegressionError, Result};
use loadings_data::{FundId, FundSeries, FundUniverse};
use rayon::prelude::*;

/// Validated entry point for loading estimation.
#[derive(Debug, Clone)]
pub struct Estimator {
    config: EstimationConfig,
}

impl Estimator {
    /// Create an estimator, validating the configuration up front.
    ///
    /// # Errors
    ///
    /// Returns [`RegressionError::Configuration`] if the configuration is
    /// invalid.
    pub fn new(config: EstimationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub const fn config(&self) -> &EstimationConfig {
        &self.config
    }

    /// Estimate one fund.
    pub fn estimate_fund(&self, series: &FundSeries) -> FundRun {
        estimate_fund(series, &self.config)
    }

    /// Estimate every fund in the universe in parallel.
    ///
    /// Funds the universe rejected during alignment follow the estimated funds
    /// as [`FundStatus::Failed`] runs, so every fund in the source appears in
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns [`RegressionError::Configuration`] if the universe was aligned
    /// against a different factor list than the estimator's. Fund- and
    /// window-level problems are reported in the returned runs instead.
    pub fn estimate_universe(&self, universe: &FundUniverse) -> Result<UniverseRun> {
        self.estimate_universe_with_progress(universe, |_| {})
    }

    /// Like [`estimate_universe`](Self::estimate_universe), calling `progress`
    /// once per completed fund (from worker threads, in completion order).
    ///
    /// # Errors
    ///
    /// See [`estimate_universe`](Self::estimate_universe).
    pub fn estimate_universe_with_progress<F>(
        &self,
        universe: &FundUniverse,
        progress: F,
    ) -> Result<UniverseRun>
    where
        F: Fn(&FundRun) + Sync,
    {
        if universe.factor_names() != self.config.factor_names.as_slice() {
            return Err(RegressionError::Configuration(format!(
                "universe factors {:?} do not match configured factors {:?}",
                universe.factor_names(),
                self.config.factor_names
            )));
        }

        let mut runs: Vec<FundRun> = universe
            .funds()
            .par_iter()
            .map(|series| {
                let run = estimate_fund(series, &self.config);
                progress(&run);
                run
            })
            .collect();
        for rejected in universe.rejected() {
            let run = FundRun::rejected(rejected.fund.clone(), rejected.reason.clone());
            progress(&run);
            runs.push(run);
        }

        let summary = UniverseRun {
            factor_names: self.config.factor_names.clone(),
            runs,
        };
        tracing::info!(
            funds = summary.runs.len(),
            records = summary.record_count(),
            funds_without_output = summary.funds_without_output().len(),
            skipped_windows = summary.skipped_window_count(),
            "estimated fund universe"
        );
        Ok(summary)
    }
}

/// Outcome of a universe run, one [`FundRun`] per fund in universe order.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseRun {
    factor_names: Vec<String>,
    runs: Vec<FundRun>,
}

impl UniverseRun {
    /// Factor names, in beta order.
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// Per-fund runs.
    pub fn runs(&self) -> &[FundRun] {
        &self.runs
    }

    /// Total number of records across funds.
    pub fn record_count(&self) -> usize {
        self.runs.iter().map(|r| r.loadings.len()).sum()
    }

    /// Total number of skipped windows across funds.
    pub fn skipped_window_count(&self) -> usize {
        self.runs.iter().map(|r| r.skipped.len()).sum()
    }

    /// Funds that produced no records.
    pub fn funds_without_output(&self) -> Vec<&FundId> {
        self.runs
            .iter()
            .filter(|r| !r.has_output())
            .map(FundRun::fund)
            .collect()
    }

    /// Funds that failed outright.
    pub fn failed_funds(&self) -> Vec<(&FundId, &str)> {
        self.runs
            .iter()
            .filter_map(|r| match &r.status {
                FundStatus::Failed { reason } => Some((r.fund(), reason.as_str())),
                _ => None,
            })
            .collect()
    }

    /// All records concatenated: fund order, then date order within a fund.
    pub fn concatenated(&self) -> Vec<FactorLoadingRecord> {
        self.runs
            .iter()
            .flat_map(|r| r.loadings.records().iter().cloned())
            .collect()
    }

    /// Consume the run, returning the concatenated records.
    pub fn into_records(self) -> Vec<FactorLoadingRecord> {
        self.runs
            .into_iter()
            .flat_map(|r| r.loadings.into_records())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use loadings_data::{Observation, RejectedFund};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn series(fund: &str, n: usize) -> FundSeries {
        let obs = (0..n)
            .map(|i| {
                let f = (i as f64).sin();
                Observation::new(
                    NaiveDate::from_ymd_opt(2010 + i as i32 / 12, i as u32 % 12 + 1, 1).unwrap(),
                    0.2 + 0.9 * f + 0.01 * (i % 3) as f64,
                    vec![f],
                )
            })
            .collect();
        FundSeries::new(fund.into(), 1, obs).unwrap()
    }

    fn universe() -> FundUniverse {
        FundUniverse::new(
            vec!["F1".to_string()],
            vec![series("A", 8), series("B", 3), series("C", 5)],
        )
        .unwrap()
    }

    fn estimator() -> Estimator {
        Estimator::new(EstimationConfig::new(4, vec!["F1".to_string()])).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let err = Estimator::new(EstimationConfig::new(2, vec!["F1".to_string()])).unwrap_err();
        assert!(matches!(err, RegressionError::Configuration(_)));
    }

    #[test]
    fn test_universe_run_preserves_order_and_counts() {
        let counter = AtomicUsize::new(0);
        let run = estimator()
            .estimate_universe_with_progress(&universe(), |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();

        assert_eq!(counter.load(Ordering::Relaxed), 3);
        let ids: Vec<&str> = run.runs().iter().map(|r| r.fund().as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(run.record_count(), 5 + 2);
        assert_eq!(run.funds_without_output(), vec![&FundId::from("B")]);
        assert!(run.failed_funds().is_empty());

        let records = run.concatenated();
        assert_eq!(records.len(), 7);
        assert!(records[..5].iter().all(|r| r.fund.as_str() == "A"));
        assert!(records[5..].iter().all(|r| r.fund.as_str() == "C"));
        assert_eq!(run.into_records(), records);
    }

    #[test]
    fn test_rejected_funds_reported_as_failed() {
        let universe = universe().with_rejected(vec![RejectedFund::new(
            "D".into(),
            "Duplicate date 2010-01-01 for D".to_string(),
        )]);
        let counter = AtomicUsize::new(0);
        let run = estimator()
            .estimate_universe_with_progress(&universe, |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();

        assert_eq!(counter.load(Ordering::Relaxed), 4);
        assert_eq!(run.runs().len(), 4);
        assert_eq!(run.record_count(), 7);
        assert_eq!(
            run.failed_funds(),
            vec![(&FundId::from("D"), "Duplicate date 2010-01-01 for D")]
        );
        assert_eq!(
            run.runs()[3].status,
            FundStatus::Failed {
                reason: "Duplicate date 2010-01-01 for D".to_string()
            }
        );
    }

    #[test]
    fn test_factor_list_mismatch() {
        let est = Estimator::new(EstimationConfig::new(4, vec!["F2".to_string()])).unwrap();
        assert!(matches!(
            est.estimate_universe(&universe()),
            Err(RegressionError::Configuration(_))
        ));
    }
}
