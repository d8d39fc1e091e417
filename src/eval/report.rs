//! Per-run result records.
//!
//! [`RunResults`] is the aggregation object for one benchmark run: it is
//! created with the configured dataset names, appended to while images are
//! evaluated, and handed to the reporter at the end.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::eval::session::BenchmarkConfig;
use crate::metrics::MetricPair;
use crate::model::{Device, SuperResolution};
use crate::stats::{Summary, SummaryTable};

/// Result of evaluating one image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageResult {
    /// Source image identifier (file name).
    pub image_id: String,
    /// Computed metrics.
    pub metrics: MetricPair,
    /// Path of the written composite.
    pub artifact: PathBuf,
}

/// Metric sequences collected for one dataset, in processing order.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetRecord {
    /// Dataset name.
    pub name: String,
    /// PSNR of each image.
    pub psnr: Vec<f64>,
    /// SSIM of each image.
    pub ssim: Vec<f64>,
    /// Per-image results.
    pub images: Vec<ImageResult>,
}

impl DatasetRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            psnr: Vec::new(),
            ssim: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Append one image's result.
    pub fn push(&mut self, result: ImageResult) {
        self.psnr.push(result.metrics.psnr);
        self.ssim.push(result.metrics.ssim);
        self.images.push(result);
    }

    /// Number of evaluated images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.psnr.len()
    }

    /// Whether no image has been evaluated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.psnr.is_empty()
    }
}

/// All dataset records of one run, in configured dataset order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResults {
    datasets: Vec<DatasetRecord>,
}

impl RunResults {
    /// Create empty records for the given dataset names.
    #[must_use]
    pub fn new(names: &[String]) -> Self {
        Self {
            datasets: names.iter().map(DatasetRecord::new).collect(),
        }
    }

    /// Mutable record for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetMismatch`] if `name` was not configured.
    pub fn record_mut(&mut self, name: &str) -> Result<&mut DatasetRecord> {
        let expected = self.names();
        self.datasets
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| Error::DatasetMismatch {
                expected,
                found: name.to_string(),
            })
    }

    /// Record for `name`, if configured.
    #[must_use]
    pub fn record(&self, name: &str) -> Option<&DatasetRecord> {
        self.datasets.iter().find(|d| d.name == name)
    }

    /// Records in configured order.
    #[must_use]
    pub fn datasets(&self) -> &[DatasetRecord] {
        &self.datasets
    }

    /// Configured dataset names in order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.datasets.iter().map(|d| d.name.clone()).collect()
    }

    /// Total number of evaluated images across datasets.
    #[must_use]
    pub fn total_images(&self) -> usize {
        self.datasets.iter().map(DatasetRecord::len).sum()
    }
}

/// Serializable record of a finished run, written as JSON next to the summary CSV.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    /// Model identifier.
    pub model: &'a str,
    /// Device the model ran on.
    pub device: Device,
    /// When this report was generated.
    pub timestamp: DateTime<Utc>,
    /// Configuration used for this run.
    pub config: &'a BenchmarkConfig,
    /// Dataset means as written to the CSV.
    pub summary: &'a SummaryTable,
    /// Per-dataset details.
    pub datasets: Vec<DatasetReport<'a>>,
}

/// Per-dataset section of a [`RunReport`].
#[derive(Debug, Serialize)]
pub struct DatasetReport<'a> {
    /// Dataset name.
    pub name: &'a str,
    /// Descriptive statistics of the finite PSNR values.
    pub psnr: Option<Summary>,
    /// Descriptive statistics of the SSIM values.
    pub ssim: Option<Summary>,
    /// Per-image results in processing order.
    pub images: &'a [ImageResult],
}

impl<'a> RunReport<'a> {
    /// Assemble a report for a finished run.
    #[must_use]
    pub fn new(
        config: &'a BenchmarkConfig,
        model: &'a dyn SuperResolution,
        results: &'a RunResults,
        summary: &'a SummaryTable,
    ) -> Self {
        let datasets = results
            .datasets()
            .iter()
            .map(|d| DatasetReport {
                name: &d.name,
                psnr: Summary::compute(&d.psnr),
                ssim: Summary::compute(&d.ssim),
                images: &d.images,
            })
            .collect();

        Self {
            model: model.name(),
            device: model.device(),
            timestamp: Utc::now(),
            config,
            summary,
            datasets,
        }
    }
}
