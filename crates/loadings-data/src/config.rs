//! Ingestion configuration.

use serde::{Deserialize, Serialize};

/// Non-fund rows that appear in peer-group return exports.
///
/// These carry index or aggregate series rather than fund returns and are
/// dropped before grouping by fund.
pub const DEFAULT_EXCLUDED_FUNDS: &[&str] = &[
    "Benchmark 1: S&P 500 TR USD",
    "Benchmark 2: MSCI EAFE PR USD",
    "Peer Group: Display Group",
    "Number of investments ranked",
    "Median",
];

/// Column names and row filters for the two source tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Date column in both tables (default: "Date")
    pub date_column: String,

    /// Fund identifier column in the return table (default: "Fund")
    pub fund_column: String,

    /// Total return column in the return table (default: "Returns")
    pub return_column: String,

    /// Risk-free rate column in the factor table (default: "RF")
    pub risk_free_column: String,

    /// Fund identifiers to drop before grouping
    pub excluded_funds: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            date_column: "Date".to_string(),
            fund_column: "Fund".to_string(),
            return_column: "Returns".to_string(),
            risk_free_column: "RF".to_string(),
            excluded_funds: DEFAULT_EXCLUDED_FUNDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}
