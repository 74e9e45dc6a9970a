//! Per-fund summaries of a universe run.
//!
//! Reports how many windows each fund produced or skipped, and condenses its
//! loadings into mean and latest betas. This is the audit view of a run: funds
//! with no output and skipped windows are listed rather than silently dropped.

use chrono::NaiveDate;
use loadings_data::FundId;
use loadings_regression::{FundRun, FundStatus, UniverseRun};
use serde::Serialize;
use std::fmt;

/// Summary of one fund's loadings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundSummary {
    /// Fund identifier.
    pub fund: FundId,

    /// How estimation ended.
    pub status: FundStatus,

    /// Date of the first record, if any.
    pub first_date: Option<NaiveDate>,

    /// Date of the last record, if any.
    pub last_date: Option<NaiveDate>,

    /// Windows that produced a record.
    pub windows_fitted: usize,

    /// Windows skipped as singular.
    pub windows_skipped: usize,

    /// Mean intercept across records.
    pub mean_intercept: Option<f64>,

    /// Mean beta per factor across records (empty when there are none).
    pub mean_betas: Vec<f64>,

    /// Betas of the most recent record (empty when there are none).
    pub latest_betas: Vec<f64>,
}

impl FundSummary {
    /// Summarise one fund run.
    pub fn from_run(run: &FundRun) -> Self {
        let records = run.loadings.records();
        let n = records.len();

        let (mean_intercept, mean_betas) = if n == 0 {
            (None, Vec::new())
        } else {
            let k = records[0].betas.len();
            let mut sums = vec![0.0; k];
            for record in records {
                for (sum, beta) in sums.iter_mut().zip(&record.betas) {
                    *sum += beta;
                }
            }
            let intercept = records.iter().map(|r| r.intercept).sum::<f64>() / n as f64;
            (
                Some(intercept),
                sums.into_iter().map(|s| s / n as f64).collect(),
            )
        };

        Self {
            fund: run.fund().clone(),
            status: run.status.clone(),
            first_date: records.first().map(|r| r.date),
            last_date: records.last().map(|r| r.date),
            windows_fitted: n,
            windows_skipped: run.skipped.len(),
            mean_intercept,
            mean_betas,
            latest_betas: records.last().map(|r| r.betas.clone()).unwrap_or_default(),
        }
    }

    fn status_label(&self) -> String {
        match &self.status {
            FundStatus::Estimated { .. } => "ok".to_string(),
            FundStatus::InsufficientData { actual, .. } => format!("short ({actual} obs)"),
            FundStatus::Failed { .. } => "failed".to_string(),
        }
    }
}

/// Summaries for every fund in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniverseSummary {
    /// Factor names, in beta order.
    pub factor_names: Vec<String>,

    /// One summary per fund, in run order.
    pub funds: Vec<FundSummary>,
}

impl UniverseSummary {
    /// Summarise a universe run.
    pub fn from_run(run: &UniverseRun) -> Self {
        Self {
            factor_names: run.factor_names().to_vec(),
            funds: run.runs().iter().map(FundSummary::from_run).collect(),
        }
    }

    /// Total records across funds.
    pub fn total_records(&self) -> usize {
        self.funds.iter().map(|f| f.windows_fitted).sum()
    }

    /// Total skipped windows across funds.
    pub fn total_skipped(&self) -> usize {
        self.funds.iter().map(|f| f.windows_skipped).sum()
    }

    /// Funds that produced no records.
    pub fn funds_without_output(&self) -> usize {
        self.funds.iter().filter(|f| f.windows_fitted == 0).count()
    }

    /// Render as a plain-text table with the latest betas per fund.
    pub fn to_ascii_table(&self) -> String {
        let width = 30 + 8 + 8 + 12 + 12 + 16 + 10 * self.factor_names.len();
        let mut output = String::new();

        output.push_str("\nRolling Factor Loadings\n");
        output.push_str(&format!(
            "Funds: {}  Records: {}  Skipped windows: {}  Funds without output: {}\n",
            self.funds.len(),
            self.total_records(),
            self.total_skipped(),
            self.funds_without_output()
        ));
        output.push_str(&"=".repeat(width));
        output.push('\n');

        output.push_str(&format!(
            "{:<30} {:>7} {:>7} {:>11} {:>11} {:>15}",
            "Fund", "Windows", "Skipped", "First", "Last", "Status"
        ));
        for name in &self.factor_names {
            output.push_str(&format!(" {:>9}", truncate(name, 9)));
        }
        output.push('\n');
        output.push_str(&"-".repeat(width));
        output.push('\n');

        for fund in &self.funds {
            output.push_str(&format!(
                "{:<30} {:>7} {:>7} {:>11} {:>11} {:>15}",
                truncate(fund.fund.as_str(), 30),
                fund.windows_fitted,
                fund.windows_skipped,
                fund.first_date.map(|d| d.to_string()).unwrap_or_default(),
                fund.last_date.map(|d| d.to_string()).unwrap_or_default(),
                fund.status_label()
            ));
            for beta in &fund.latest_betas {
                output.push_str(&format!(" {beta:>9.3}"));
            }
            output.push('\n');
        }

        output.push_str(&"=".repeat(width));
        output.push('\n');
        output
    }
}

impl fmt::Display for UniverseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ascii_table())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('~');
        out
    }
}
