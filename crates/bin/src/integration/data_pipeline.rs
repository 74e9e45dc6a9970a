//! Data pipeline for loading fund returns and factor tables from disk.
//!
//! Reads the optional JSON run configuration, applies command-line overrides,
//! and aligns the return table with the factor table into a [`FundUniverse`].

use loadings::data::factors::read_factors_path;
use loadings::data::returns::read_returns_path;
use loadings::data::{DataError, FundUniverse, IngestConfig, build_universe};
use loadings::regression::{EstimationConfig, RegressionError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Error type for data pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DataPipelineError {
    /// Source table could not be read or aligned.
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    /// Configuration file could not be read.
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration file is not valid JSON for a run configuration.
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Estimation settings were rejected.
    #[error("Invalid configuration: {0}")]
    Config(#[from] RegressionError),
}

/// Everything a run needs besides the two input paths.
///
/// Both sections are optional in the JSON file; missing fields take their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct RunConfig {
    /// Window size, factor list and rank tolerance.
    pub estimation: EstimationConfig,
    /// Column names and excluded rows.
    pub ingest: IngestConfig,
}

impl RunConfig {
    /// Load from a JSON file, or fall back to defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, DataPipelineError> {
        match path {
            Some(path) => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides, then validate the estimation settings.
    pub(crate) fn with_overrides(
        mut self,
        window: Option<usize>,
        factor_names: Option<&str>,
    ) -> Result<Self, DataPipelineError> {
        if let Some(window) = window {
            self.estimation.window_size = window;
        }
        if let Some(list) = factor_names {
            self.estimation.factor_names = parse_factor_names(list);
        }
        self.estimation.validate()?;
        Ok(self)
    }
}

/// Split a comma-separated factor list, dropping blanks.
pub(crate) fn parse_factor_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read both tables and align them into a fund universe.
pub(crate) fn load_universe(
    returns: &Path,
    factors: &Path,
    config: &RunConfig,
) -> Result<FundUniverse, DataPipelineError> {
    let rows = read_returns_path(returns, &config.ingest)?;
    let table = read_factors_path(factors, &config.estimation.factor_names, &config.ingest)?;
    if let Some((first, last)) = table.date_range() {
        tracing::info!(
            periods = table.len(),
            %first,
            %last,
            "loaded factor table"
        );
    }
    Ok(build_universe(&rows, &table, &config.ingest)?)
}
