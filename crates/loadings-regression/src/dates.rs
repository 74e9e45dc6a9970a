//! Result date mapping.
//!
//! Each window result takes the recorded date of the window's last
//! observation. Dates are read from the series, never generated from a start
//! date and a fixed frequency, so gaps in a fund's history (a missing month, a
//! change of reporting cadence) cannot shift the labels.

use crate::error::{RegressionError, Result};
use crate::rolling::WindowFit;
use chrono::NaiveDate;
use loadings_data::FundSeries;

/// Dates for `fits`, in the same order.
///
/// # Errors
///
/// Returns [`RegressionError::DimensionMismatch`] if a fit refers to an
/// observation the series does not have.
pub fn map_window_dates(series: &FundSeries, fits: &[WindowFit]) -> Result<Vec<NaiveDate>> {
    fits.iter()
        .map(|fit| {
            series
                .get(fit.end_index)
                .map(|obs| obs.date)
                .ok_or(RegressionError::DimensionMismatch {
                    expected: fit.end_index + 1,
                    actual: series.len(),
                })
        })
        .collect()
}
