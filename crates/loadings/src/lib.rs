#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/loadings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export main types from sub-crates
pub use loadings_data as data;
pub use loadings_output as output;
pub use loadings_regression as regression;

pub use loadings_data::{FundId, FundSeries, FundUniverse, IngestConfig, Observation};
pub use loadings_regression::{
    EstimationConfig, Estimator, FactorLoadingRecord, FundLoadings, UniverseRun,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
