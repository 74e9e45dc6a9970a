#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/loadings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod assemble;
pub mod batch;
pub mod config;
pub mod dates;
pub mod design;
pub mod error;
pub mod ols;
pub mod rolling;

pub use assemble::{FactorLoadingRecord, FundLoadings, FundRun, FundStatus, assemble_loadings};
pub use batch::{Estimator, UniverseRun};
pub use config::EstimationConfig;
pub use dates::map_window_dates;
pub use design::{DesignMatrix, build_design};
pub use error::{RegressionError, Result, SingularReason};
pub use ols::{OlsFit, solve_ols};
pub use rolling::{RegressionResult, RollingFit, SkippedWindow, WindowFit, rolling_regression};
