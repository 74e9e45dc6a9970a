//! Aligned per-fund observation series.
//!
//! A [`FundSeries`] is the only input the rolling regression needs: one
//! [`Observation`] per period, already joined with the factor table, with the
//! risk-free rate subtracted and every incomplete period removed.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Identifier of a fund as it appears in the source return table.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FundId(String);

impl FundId {
    /// Create a fund identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FundId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for FundId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One period of one fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar date of the period.
    pub date: NaiveDate,

    /// Fund return minus the contemporaneous risk-free rate.
    pub excess_return: f64,

    /// Factor returns, ordered like the configured factor list.
    pub factor_returns: Vec<f64>,
}

impl Observation {
    /// Create a new observation.
    pub const fn new(date: NaiveDate, excess_return: f64, factor_returns: Vec<f64>) -> Self {
        Self {
            date,
            excess_return,
            factor_returns,
        }
    }

    fn is_finite(&self) -> bool {
        self.excess_return.is_finite() && self.factor_returns.iter().all(|v| v.is_finite())
    }
}

/// Date-ordered observations for exactly one fund.
///
/// Immutable once built. Construction checks ascending unique dates, a uniform
/// factor width and finite values, so downstream code can index freely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundSeries {
    fund: FundId,
    factor_count: usize,
    observations: Vec<Observation>,
}

impl FundSeries {
    /// Build a series, validating ordering and shape.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnsortedSeries`] or [`DataError::DuplicateDate`] if
    /// dates are not strictly increasing, [`DataError::FactorWidth`] if an
    /// observation has a different number of factor values than `factor_count`,
    /// and [`DataError::NonFinite`] for NaN or infinite values.
    pub fn new(
        fund: FundId,
        factor_count: usize,
        observations: Vec<Observation>,
    ) -> Result<Self> {
        for (i, obs) in observations.iter().enumerate() {
            if obs.factor_returns.len() != factor_count {
                return Err(DataError::FactorWidth {
                    fund: fund.to_string(),
                    date: obs.date,
                    expected: factor_count,
                    actual: obs.factor_returns.len(),
                });
            }
            if !obs.is_finite() {
                return Err(DataError::NonFinite {
                    fund: fund.to_string(),
                    date: obs.date,
                });
            }
            if i > 0 {
                let prev = observations[i - 1].date;
                if obs.date == prev {
                    return Err(DataError::DuplicateDate {
                        fund: fund.to_string(),
                        date: obs.date,
                    });
                }
                if obs.date < prev {
                    return Err(DataError::UnsortedSeries {
                        fund: fund.to_string(),
                        date: obs.date,
                    });
                }
            }
        }

        Ok(Self {
            fund,
            factor_count,
            observations,
        })
    }

    /// An empty series, used for funds with no usable periods.
    pub const fn empty(fund: FundId, factor_count: usize) -> Self {
        Self {
            fund,
            factor_count,
            observations: Vec::new(),
        }
    }

    /// Fund identifier.
    pub const fn fund(&self) -> &FundId {
        &self.fund
    }

    /// Number of factor values carried by each observation.
    pub const fn factor_count(&self) -> usize {
        self.factor_count
    }

    /// All observations in date order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of observations.
    pub const fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series has no observations.
    pub const fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observation at `index`.
    pub fn get(&self, index: usize) -> Option<&Observation> {
        self.observations.get(index)
    }

    /// The `size` observations starting at `start`, if they all exist.
    pub fn window(&self, start: usize, size: usize) -> Option<&[Observation]> {
        let end = start.checked_add(size)?;
        self.observations.get(start..end)
    }

    /// Number of full windows of `size` periods the series admits.
    pub const fn window_count(&self, size: usize) -> usize {
        if size == 0 || self.observations.len() < size {
            0
        } else {
            self.observations.len() - size + 1
        }
    }

    /// Date of the first observation.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    /// Date of the last observation.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }
}

/// A fund whose aligned rows failed series validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedFund {
    /// Fund identifier.
    pub fund: FundId,

    /// Why the series could not be built.
    pub reason: String,
}

impl RejectedFund {
    /// Record a rejected fund.
    pub const fn new(fund: FundId, reason: String) -> Self {
        Self { fund, reason }
    }
}

/// Every fund's aligned series plus the factor list they share.
///
/// Funds keep the order in which they first appeared in the return table.
/// Funds that could not be aligned are listed separately so a single bad fund
/// never hides the rest.
#[derive(Debug, Clone, Default)]
pub struct FundUniverse {
    factor_names: Vec<String>,
    funds: Vec<FundSeries>,
    rejected: Vec<RejectedFund>,
}

impl FundUniverse {
    /// Create a universe from already-aligned series.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::FactorWidth`] if a series was built for a different
    /// number of factors than `factor_names` lists.
    pub fn new(factor_names: Vec<String>, funds: Vec<FundSeries>) -> Result<Self> {
        for series in &funds {
            if series.factor_count() != factor_names.len() {
                return Err(DataError::FactorWidth {
                    fund: series.fund().to_string(),
                    date: series.first_date().unwrap_or_default(),
                    expected: factor_names.len(),
                    actual: series.factor_count(),
                });
            }
        }
        Ok(Self {
            factor_names,
            funds,
            rejected: Vec::new(),
        })
    }

    /// Attach funds that were set aside during alignment.
    pub fn with_rejected(mut self, rejected: Vec<RejectedFund>) -> Self {
        self.rejected = rejected;
        self
    }

    /// Funds set aside during alignment, in first-appearance order.
    pub fn rejected(&self) -> &[RejectedFund] {
        &self.rejected
    }

    /// Factor names shared by every series.
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// All fund series.
    pub fn funds(&self) -> &[FundSeries] {
        &self.funds
    }

    /// Look up one fund.
    pub fn get(&self, fund: &FundId) -> Option<&FundSeries> {
        self.funds.iter().find(|s| s.fund() == fund)
    }

    /// Number of aligned funds (rejected funds excluded).
    pub const fn len(&self) -> usize {
        self.funds.len()
    }

    /// Whether the universe has no funds.
    pub const fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }
}
