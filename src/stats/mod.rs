//! Per-dataset aggregation and summary reporting.
//!
//! - [`SummaryTable`]: one mean PSNR/SSIM row per dataset, written as CSV
//! - [`SummaryValue`]: a mean or the `No data` sentinel for empty datasets
//! - [`Summary`]: descriptive statistics (mean, median, std_dev, min, max)
//! - [`mean`], [`median`], [`std_dev`]: basic statistical functions
//!
//! ## CSV format
//!
//! ```text
//! DataSet,psnr,ssim
//! Set5,31.4021,0.8873
//! Set14,No data,No data
//! ```

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::eval::report::{DatasetRecord, RunResults};
use crate::model::UpscaleFactor;

/// Sentinel written for datasets without any evaluated image.
pub const NO_DATA: &str = "No data";

/// Header of the summary CSV.
pub const CSV_HEADER: [&str; 3] = ["DataSet", "psnr", "ssim"];

/// Default summary CSV path, `<dir>/srf_<factor>_test_results.csv`.
#[must_use]
pub fn summary_csv_path(statistics_dir: &Path, factor: UpscaleFactor) -> PathBuf {
    statistics_dir.join(format!("srf_{}_test_results.csv", factor.get()))
}

/// A dataset-level mean, or the sentinel for an empty dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SummaryValue {
    /// Arithmetic mean of the dataset's values.
    Mean(f64),
    /// The dataset had no values.
    NoData,
}

impl fmt::Display for SummaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean(v) => write!(f, "{v:.4}"),
            Self::NoData => f.write_str(NO_DATA),
        }
    }
}

impl Serialize for SummaryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Mean(v) => serializer.serialize_f64(*v),
            Self::NoData => serializer.serialize_str(NO_DATA),
        }
    }
}

/// Mean of PSNR values, excluding non-finite entries.
///
/// If every value is non-finite (all perfect reconstructions) the plain mean
/// is returned, which is `+inf`.
#[must_use]
pub fn psnr_mean(values: &[f64]) -> SummaryValue {
    if values.is_empty() {
        return SummaryValue::NoData;
    }
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return SummaryValue::Mean(values.iter().sum::<f64>() / values.len() as f64);
    }
    let excluded = values.len() - finite.len();
    if excluded > 0 {
        tracing::debug!(excluded, "excluding non-finite PSNR values from the mean");
    }
    SummaryValue::Mean(mean(&finite))
}

/// Mean of SSIM values.
#[must_use]
pub fn ssim_mean(values: &[f64]) -> SummaryValue {
    if values.is_empty() {
        SummaryValue::NoData
    } else {
        SummaryValue::Mean(mean(values))
    }
}

/// One dataset's summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Dataset name.
    pub dataset: String,
    /// Number of evaluated images.
    pub images: usize,
    /// Mean PSNR.
    pub psnr: SummaryValue,
    /// Mean SSIM.
    pub ssim: SummaryValue,
}

impl SummaryRow {
    /// Summarize one dataset record.
    #[must_use]
    pub fn from_record(record: &DatasetRecord) -> Self {
        // Both sequences grow together; an empty one blanks the whole row.
        let (psnr, ssim) = if record.psnr.is_empty() || record.ssim.is_empty() {
            (SummaryValue::NoData, SummaryValue::NoData)
        } else {
            (psnr_mean(&record.psnr), ssim_mean(&record.ssim))
        };
        Self {
            dataset: record.name.clone(),
            images: record.len(),
            psnr,
            ssim,
        }
    }
}

/// Summary rows for a run, in configured dataset order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Summarize every dataset of a run.
    #[must_use]
    pub fn from_results(results: &RunResults) -> Self {
        Self {
            rows: results.datasets().iter().map(SummaryRow::from_record).collect(),
        }
    }

    /// Rows in configured order.
    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Write the table as CSV to any writer.
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(CSV_HEADER)?;
        for row in &self.rows {
            wtr.write_record([
                row.dataset.as_str(),
                &row.psnr.to_string(),
                &row.ssim.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the table as CSV to `path`, creating parent directories.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.write_csv_to(file)
    }
}

/// Descriptive statistics for a set of measurements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Number of values.
    pub count: usize,
    /// Mean value.
    pub mean: f64,
    /// Median value.
    pub median: f64,
    /// Standard deviation.
    pub std_dev: f64,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

impl Summary {
    /// Compute summary statistics over the finite values of a slice.
    ///
    /// Returns `None` if there are no finite values.
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        Some(Self {
            count,
            mean: mean(&sorted),
            median: median(&sorted),
            std_dev: std_dev(&sorted),
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

/// Compute arithmetic mean.
///
/// # Example
///
/// ```
/// use sr_bench::stats::mean;
///
/// assert!((mean(&[1.0, 2.0, 3.0, 4.0, 5.0]) - 3.0).abs() < 0.001);
/// ```
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compute median of a slice.
///
/// For even-length slices, returns the average of the two middle values.
///
/// ```
/// use sr_bench::stats::median;
///
/// assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
/// assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
/// ```
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
