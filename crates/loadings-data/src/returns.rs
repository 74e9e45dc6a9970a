//! Fund return history reader.
//!
//! The return table is long format: one row per (date, fund) with a total
//! return that may be missing. Columns are addressed by header name, so a
//! leading unnamed index column is simply ignored.

use crate::config::IngestConfig;
use crate::error::Result;
use crate::frame::{FUND, RETURN, date_column, parse_dates, parse_numbers, read_text_frame, text_column};
use polars::prelude::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// The return table as a typed frame with columns date, fund, return.
///
/// Rows with a blank fund identifier are kept here and dropped by the aligner
/// together with the excluded identifiers.
#[derive(Debug, Clone)]
pub struct ReturnTable {
    frame: DataFrame,
}

impl ReturnTable {
    /// Number of rows read.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// The typed frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }
}

/// Read the return table from any reader.
///
/// # Errors
///
/// Returns an error if a configured column is missing, or a date or number
/// cannot be parsed.
pub fn read_returns<R: Read>(source: R, config: &IngestConfig) -> Result<ReturnTable> {
    let raw = read_text_frame(source)?;
    let dates = parse_dates(text_column(&raw, &config.date_column, "returns")?)?;
    let funds: Vec<Option<String>> = text_column(&raw, &config.fund_column, "returns")?
        .into_iter()
        .map(|fund| fund.map(str::trim).filter(|f| !f.is_empty()).map(str::to_string))
        .collect();
    let values = parse_numbers(
        text_column(&raw, &config.return_column, "returns")?,
        &config.return_column,
    )?;

    let frame = DataFrame::new(vec![
        date_column(&dates)?,
        Column::new(FUND.into(), funds),
        Column::new(RETURN.into(), values),
    ])?;

    tracing::debug!(rows = frame.height(), "read return table");
    Ok(ReturnTable { frame })
}

/// Read the return table from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn read_returns_path(path: &Path, config: &IngestConfig) -> Result<ReturnTable> {
    read_returns(File::open(path)?, config)
}
