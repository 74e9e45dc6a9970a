//! Shared polars helpers for the source tables.
//!
//! Both tables are read with every column as text so that date and number
//! cells can be parsed with line-accurate errors. The parsed values are then
//! rebuilt into typed frames under fixed internal column names, so the join
//! never depends on how a particular file labels its columns.

use crate::dates::parse_date;
use crate::error::{DataError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::io::{Cursor, Read};

/// Date key shared by both typed frames (polars `Date`).
pub(crate) const DATE: &str = "_date";
/// Fund identifier in the return frame.
pub(crate) const FUND: &str = "_fund";
/// Total return in the return frame.
pub(crate) const RETURN: &str = "_return";
/// Risk-free rate in the factor frame.
pub(crate) const RISK_FREE: &str = "_rf";
/// Return minus risk-free rate, added by the aligner.
pub(crate) const EXCESS: &str = "_excess";

/// Cells read as null in either table.
const NULL_VALUES: &[&str] = &["NaN", "nan", "NA", "N/A", "n/a", "null", "None", "-"];

/// Days from 0001-01-01 to the Unix epoch; polars stores dates relative to the latter.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Read a CSV source with every column as nullable text.
pub(crate) fn read_text_frame<R: Read>(mut source: R) -> Result<DataFrame> {
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes)?;

    let null_values = NullValues::AllColumns(NULL_VALUES.iter().map(|v| (*v).into()).collect());
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_null_values(Some(null_values.clone())))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

/// Text column by header name.
pub(crate) fn text_column<'a>(
    df: &'a DataFrame,
    column: &str,
    table: &'static str,
) -> Result<&'a StringChunked> {
    let found = df.column(column).map_err(|_| DataError::MissingColumn {
        column: column.to_string(),
        table,
    })?;
    Ok(found.str()?)
}

/// 1-based file line of a data row (the header is line 1).
const fn line_of(row: usize) -> u64 {
    row as u64 + 2
}

/// Parse every cell of a date column. Null dates are errors.
pub(crate) fn parse_dates(cells: &StringChunked) -> Result<Vec<NaiveDate>> {
    cells
        .into_iter()
        .enumerate()
        .map(|(row, cell)| {
            let raw = cell.unwrap_or_default();
            parse_date(raw).ok_or_else(|| DataError::InvalidDate {
                value: raw.to_string(),
                line: line_of(row),
            })
        })
        .collect()
}

/// Parse every cell of a numeric column. Null cells and non-finite values
/// become `None`.
pub(crate) fn parse_numbers(cells: &StringChunked, column: &str) -> Result<Vec<Option<f64>>> {
    cells
        .into_iter()
        .enumerate()
        .map(|(row, cell)| {
            let Some(raw) = cell.map(str::trim).filter(|raw| !raw.is_empty()) else {
                return Ok(None);
            };
            let value: f64 = raw.parse().map_err(|_| DataError::InvalidNumber {
                value: raw.to_string(),
                column: column.to_string(),
                line: line_of(row),
            })?;
            Ok(value.is_finite().then_some(value))
        })
        .collect()
}

/// Build a polars `Date` column from parsed dates.
pub(crate) fn date_column(dates: &[NaiveDate]) -> Result<Column> {
    let days: Vec<i32> = dates
        .iter()
        .map(|d| d.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
        .collect();
    Ok(Column::new(DATE.into(), days).cast(&DataType::Date)?)
}

/// Read a polars `Date` column back into calendar dates.
pub(crate) fn dates_of(df: &DataFrame) -> Result<Vec<NaiveDate>> {
    let days = df.column(DATE)?.cast(&DataType::Int32)?;
    days.i32()?
        .into_iter()
        .map(|day| {
            day.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + EPOCH_DAYS_FROM_CE))
                .ok_or_else(|| DataError::InvalidDate {
                    value: format!("{day:?}"),
                    line: 0,
                })
        })
        .collect()
}
