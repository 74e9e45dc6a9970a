//! Integration module for the command-line pipeline.
//!
//! Loads the run configuration and both source tables, and aligns them into a
//! fund universe the estimator can consume.

pub(crate) mod data_pipeline;
