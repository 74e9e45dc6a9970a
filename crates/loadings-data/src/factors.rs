//! Factor-return table reader.
//!
//! The factor table is shared reference data: every fund joins against the
//! same rows. It is read once and then only borrowed.

use crate::config::IngestConfig;
use crate::error::{DataError, Result};
use crate::frame::{RISK_FREE, date_column, parse_dates, parse_numbers, read_text_frame, text_column};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Date-keyed factor returns for a fixed, ordered factor list, plus the
/// risk-free rate.
#[derive(Debug, Clone)]
pub struct FactorTable {
    factor_names: Vec<String>,
    frame: DataFrame,
    date_range: Option<(NaiveDate, NaiveDate)>,
}

impl FactorTable {
    /// Factor names, in column order.
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// The typed frame: date, one column per factor, risk-free rate.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of dated rows.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// First and last date covered.
    pub const fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_range
    }
}

/// Read the factor table, selecting `factor_names` in the given order.
///
/// # Errors
///
/// Returns an error if the date, risk-free or any requested factor column is
/// missing, if a cell cannot be parsed, or if a date repeats.
pub fn read_factors<R: Read>(
    source: R,
    factor_names: &[String],
    config: &IngestConfig,
) -> Result<FactorTable> {
    let raw = read_text_frame(source)?;
    let dates = parse_dates(text_column(&raw, &config.date_column, "factor")?)?;

    let mut seen = BTreeSet::new();
    if let Some(date) = dates.iter().find(|d| !seen.insert(**d)) {
        return Err(DataError::DuplicateFactorDate(*date));
    }

    let mut columns = vec![date_column(&dates)?];
    for name in factor_names {
        let values = parse_numbers(text_column(&raw, name, "factor")?, name)?;
        columns.push(Column::new(name.as_str().into(), values));
    }
    let risk_free = parse_numbers(
        text_column(&raw, &config.risk_free_column, "factor")?,
        &config.risk_free_column,
    )?;
    columns.push(Column::new(RISK_FREE.into(), risk_free));

    let table = FactorTable {
        factor_names: factor_names.to_vec(),
        frame: DataFrame::new(columns)?,
        date_range: seen.first().copied().zip(seen.last().copied()),
    };
    tracing::debug!(rows = table.len(), factors = factor_names.len(), "read factor table");
    Ok(table)
}

/// Read the factor table from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn read_factors_path(
    path: &Path,
    factor_names: &[String],
    config: &IngestConfig,
) -> Result<FactorTable> {
    read_factors(File::open(path)?, factor_names, config)
}
