//! CSV and JSON export of estimated loadings.
//!
//! The CSV layout is one row per (fund, window end date):
//!
//! ```text
//! Date, Fund, const, <factor>..., const_se, <factor>_se..., r_squared
//! ```

use loadings_regression::{FactorLoadingRecord, UniverseRun};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Failure while writing loadings.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failed.
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown format name, or a record that does not fit the table layout.
    #[error("Invalid export: {0}")]
    InvalidFormat(String),
}

/// Output encodings for a loadings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Wide CSV, one row per record.
    Csv,

    /// Single-line JSON.
    Json,

    /// Indented JSON.
    PrettyJson,
}

impl ExportFormat {
    /// File extension conventionally used for this encoding.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" | "pretty" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Something that can be rendered in any [`ExportFormat`].
pub trait Exporter {
    /// Render to an in-memory string.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Render straight to a file, creating or truncating it.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the file cannot be written.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Concatenated loadings across funds, with the factor names that label the
/// beta columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadingsTable {
    /// Factor names, in beta order.
    pub factor_names: Vec<String>,

    /// Records in fund order, then date order.
    pub records: Vec<FactorLoadingRecord>,
}

impl LoadingsTable {
    /// Create a table from records.
    pub const fn new(factor_names: Vec<String>, records: Vec<FactorLoadingRecord>) -> Self {
        Self {
            factor_names,
            records,
        }
    }

    /// Concatenate every fund's records from a universe run.
    pub fn from_run(run: &UniverseRun) -> Self {
        Self::new(run.factor_names().to_vec(), run.concatenated())
    }

    /// Column headers of the CSV layout.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec!["Date".to_string(), "Fund".to_string(), "const".to_string()];
        headers.extend(self.factor_names.iter().cloned());
        headers.push("const_se".to_string());
        headers.extend(self.factor_names.iter().map(|f| format!("{f}_se")));
        headers.push("r_squared".to_string());
        headers
    }

    /// Write the CSV layout to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if a record's beta count disagrees with the factor
    /// list, or if writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.headers())?;

        let k = self.factor_names.len();
        for record in &self.records {
            if record.betas.len() != k || record.beta_ses.len() != k {
                return Err(ExportError::InvalidFormat(format!(
                    "record for {} on {} has {} betas, expected {k}",
                    record.fund,
                    record.date,
                    record.betas.len()
                )));
            }

            let mut row = Vec::with_capacity(2 * k + 4);
            row.push(record.date.to_string());
            row.push(record.fund.to_string());
            row.push(record.intercept.to_string());
            row.extend(record.betas.iter().map(f64::to_string));
            row.push(record.intercept_se.to_string());
            row.extend(record.beta_ses.iter().map(f64::to_string));
            row.push(record.r_squared.to_string());
            wtr.write_record(&row)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Exporter for LoadingsTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut buf = Vec::new();
                self.write_csv(&mut buf)?;
                String::from_utf8(buf).map_err(|e| ExportError::InvalidFormat(e.to_string()))
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let file = File::create(path)?;
        match format {
            ExportFormat::Csv => self.write_csv(file),
            ExportFormat::Json => Ok(serde_json::to_writer(file, self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_writer_pretty(file, self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn record(fund: &str, day: u32) -> FactorLoadingRecord {
        FactorLoadingRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            fund: fund.into(),
            intercept: 0.001,
            betas: vec![1.05, -0.2],
            intercept_se: 0.0005,
            beta_ses: vec![0.04, 0.06],
            r_squared: 0.93,
            residual_variance: 0.0001,
        }
    }

    fn table() -> LoadingsTable {
        LoadingsTable::new(
            vec!["Mkt-RF".to_string(), "SMB".to_string()],
            vec![record("Alpha", 30), record("Alpha", 31)],
        )
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            table().headers(),
            vec![
                "Date", "Fund", "const", "Mkt-RF", "SMB", "const_se", "Mkt-RF_se", "SMB_se",
                "r_squared"
            ]
        );
    }

    #[test]
    fn test_csv_rows() {
        let csv = table().export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "2024-01-30,Alpha,0.001,1.05,-0.2,0.0005,0.04,0.06,0.93"
        );
    }

    #[test]
    fn test_json_export() {
        let json = table().export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"factor_names\":[\"Mkt-RF\",\"SMB\"]"));
        assert!(json.contains("\"fund\":\"Alpha\""));
        assert!(json.contains("\"date\":\"2024-01-31\""));

        let pretty = table().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(pretty.contains("  "));
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let mut t = table();
        t.records[0].betas.pop();
        assert!(matches!(
            t.export_to_string(ExportFormat::Csv),
            Err(ExportError::InvalidFormat(_))
        ));
    }

    #[rstest]
    #[case("csv", ExportFormat::Csv)]
    #[case("CSV", ExportFormat::Csv)]
    #[case("json", ExportFormat::Json)]
    #[case("pretty-json", ExportFormat::PrettyJson)]
    #[case("pretty_json", ExportFormat::PrettyJson)]
    #[case("pretty", ExportFormat::PrettyJson)]
    fn test_format_parsing(#[case] raw: &str, #[case] expected: ExportFormat) {
        assert_eq!(raw.parse::<ExportFormat>().unwrap(), expected);
    }

    #[rstest]
    #[case("xml")]
    #[case("")]
    fn test_unknown_format_rejected(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<ExportFormat>(),
            Err(ExportError::InvalidFormat(_))
        ));
    }

    #[rstest]
    #[case(ExportFormat::Csv, "csv")]
    #[case(ExportFormat::Json, "json")]
    #[case(ExportFormat::PrettyJson, "json")]
    fn test_extension(#[case] format: ExportFormat, #[case] expected: &str) {
        assert_eq!(format.extension(), expected);
    }
}
