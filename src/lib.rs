//! # sr-bench
//!
//! Super-resolution benchmark evaluation library.
//!
//! The library scores a super-resolution model against standard benchmark
//! datasets (Set5, Set14, BSD100, ...). The model is supplied by the caller
//! through the [`SuperResolution`] trait; this library handles dataset
//! loading, PSNR/SSIM computation, comparison artifacts, and summary reports.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sr_bench::{BenchmarkConfig, BenchmarkSession, Device, DeviceMode, ResampleModel, UpscaleFactor};
//!
//! let config = BenchmarkConfig::builder()
//!     .upscale_factor(UpscaleFactor::X4)
//!     .test_root("data/test")
//!     .build();
//!
//! let device = Device::resolve(DeviceMode::Auto)?;
//! let model = ResampleModel::load("epochs/upscale_4.json".as_ref(), device)?;
//! let session = BenchmarkSession::new(config, Box::new(model))?;
//!
//! let results = session.run()?;
//! let summary = session.write_reports(&results)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`tensor`]: Channel-planar float images
//! - [`metrics`]: Quality metrics (PSNR, SSIM, luma restriction)
//! - [`model`]: Model interface, device selection, reference model
//! - [`dataset`]: Benchmark dataset discovery and decoding
//! - [`eval`]: Evaluation session, composites, run records
//! - [`stats`]: Summary tables and descriptive statistics

pub mod dataset;
pub mod error;
pub mod eval;
pub mod metrics;
pub mod model;
pub mod stats;
pub mod tensor;

// Re-export commonly used types
pub use dataset::{BenchmarkDataset, DatasetLayout, Sample};
pub use error::{Error, Result};
pub use eval::{
    composite::GridLayout,
    report::{DatasetRecord, ImageResult, RunResults},
    session::{BenchmarkConfig, BenchmarkSession},
};
pub use metrics::{MetricMode, MetricPair};
pub use model::{Device, DeviceMode, ResampleModel, SuperResolution, UpscaleFactor};
pub use stats::{Summary, SummaryRow, SummaryTable, SummaryValue};
pub use tensor::ImageTensor;
