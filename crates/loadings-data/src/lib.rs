#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/loadings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod config;
pub mod dates;
pub mod error;
pub mod factors;
pub mod returns;
pub mod series;

mod frame;

pub use align::build_universe;
pub use config::{DEFAULT_EXCLUDED_FUNDS, IngestConfig};
pub use error::{DataError, Result};
pub use factors::FactorTable;
pub use returns::ReturnTable;
pub use series::{FundId, FundSeries, FundUniverse, Observation, RejectedFund};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
