//! Evaluation session and result records.
//!
//! This module provides the core evaluation infrastructure:
//!
//! - [`session::BenchmarkSession`]: drives the model over every configured dataset
//! - [`session::BenchmarkConfig`]: configuration for a run
//! - [`composite`]: side-by-side comparison artifacts
//! - [`report`]: per-image, per-dataset, and per-run records

pub mod composite;
pub mod report;
pub mod session;

pub use composite::{GridLayout, artifact_file_name, make_grid};
pub use report::{DatasetRecord, ImageResult, RunReport, RunResults};
pub use session::{BenchmarkConfig, BenchmarkConfigBuilder, BenchmarkSession, DEFAULT_DATASETS};
