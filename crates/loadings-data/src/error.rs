//! Error types for data operations.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while reading or aligning source tables.
#[derive(Debug, Error)]
pub enum DataError {
    /// Polars error while reading or joining a table
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is absent from a table header
    #[error("Missing column '{column}' in {table} table")]
    MissingColumn {
        /// Column that was looked up
        column: String,
        /// Which table was being read
        table: &'static str,
    },

    /// A date cell could not be parsed
    #[error("Invalid date '{value}' on line {line}")]
    InvalidDate {
        /// Raw cell contents
        value: String,
        /// 1-based line number in the source file
        line: u64,
    },

    /// A numeric cell could not be parsed
    #[error("Invalid number '{value}' in column '{column}' on line {line}")]
    InvalidNumber {
        /// Raw cell contents
        value: String,
        /// Column name
        column: String,
        /// 1-based line number in the source file
        line: u64,
    },

    /// Observations are not in ascending date order
    #[error("Observations for {fund} are not sorted by date (at {date})")]
    UnsortedSeries {
        /// Fund identifier
        fund: String,
        /// First out-of-order date
        date: NaiveDate,
    },

    /// The same date appears twice for one fund
    #[error("Duplicate date {date} for {fund}")]
    DuplicateDate {
        /// Fund identifier
        fund: String,
        /// Repeated date
        date: NaiveDate,
    },

    /// The same date appears twice in the factor table
    #[error("Duplicate date {0} in factor table")]
    DuplicateFactorDate(NaiveDate),

    /// An observation carries the wrong number of factor returns
    #[error("Observation on {date} for {fund} has {actual} factor values, expected {expected}")]
    FactorWidth {
        /// Fund identifier
        fund: String,
        /// Observation date
        date: NaiveDate,
        /// Expected factor count
        expected: usize,
        /// Actual factor count
        actual: usize,
    },

    /// An observation contains NaN or infinity
    #[error("Non-finite value on {date} for {fund}")]
    NonFinite {
        /// Fund identifier
        fund: String,
        /// Observation date
        date: NaiveDate,
    },
}
