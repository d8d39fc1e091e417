//! Benchmark session driving a model over the configured datasets.
//!
//! [`BenchmarkSession`] owns the run configuration and the model under test.
//! It evaluates one image at a time: inference, metrics, composite artifact.
//! Results are collected into an explicit [`RunResults`] and summarized by
//! [`SummaryTable`].

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::dataset::{BenchmarkDataset, DatasetLayout, Sample, discover_datasets};
use crate::error::{Error, Result};
use crate::eval::composite::{GridLayout, artifact_file_name, make_grid, write_composite};
use crate::eval::report::{ImageResult, RunReport, RunResults};
use crate::metrics::{MetricMode, calculate_metrics};
use crate::model::{SuperResolution, UpscaleFactor};
use crate::stats::{SummaryTable, summary_csv_path};

/// Datasets evaluated when none are configured.
pub const DEFAULT_DATASETS: &[&str] = &["Set5", "Set14", "BSD100", "Urban100", "SunHays80"];

/// Configuration for a benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkConfig {
    /// Magnification under test.
    pub upscale_factor: UpscaleFactor,

    /// Root directory of the benchmark datasets.
    pub test_root: PathBuf,

    /// Root directory for composite artifacts.
    pub results_dir: PathBuf,

    /// Directory for summary tables.
    pub statistics_dir: PathBuf,

    /// Dataset names in report order.
    pub datasets: Vec<String>,

    /// On-disk dataset arrangement.
    pub layout: DatasetLayout,

    /// Color representation metrics are computed in.
    pub metric_mode: MetricMode,

    /// Composite grid arrangement.
    pub grid: GridLayout,

    /// Number of samples decoded ahead of evaluation.
    pub prefetch: usize,
}

impl BenchmarkConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> BenchmarkConfigBuilder {
        BenchmarkConfigBuilder::default()
    }

    /// `results/SRF_<f>`.
    #[must_use]
    pub fn artifact_root(&self) -> PathBuf {
        self.results_dir.join(self.upscale_factor.dir_name())
    }

    /// Directory receiving the composites of `dataset`.
    #[must_use]
    pub fn artifact_dir(&self, dataset: &str) -> PathBuf {
        match self.layout {
            DatasetLayout::PerDataset => self.artifact_root().join(dataset),
            DatasetLayout::Flat => self.artifact_root(),
        }
    }

    /// `statistics/srf_<f>_test_results.csv`.
    #[must_use]
    pub fn summary_csv_path(&self) -> PathBuf {
        summary_csv_path(&self.statistics_dir, self.upscale_factor)
    }

    /// JSON run report path next to the summary CSV.
    #[must_use]
    pub fn report_json_path(&self) -> PathBuf {
        self.summary_csv_path().with_extension("json")
    }

    /// Check the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty or duplicated dataset list, a
    /// dataset name that is not a single plain path component, a flat-layout
    /// dataset name containing `_`, or a zero-width grid.
    pub fn validate(&self) -> Result<()> {
        if self.datasets.is_empty() {
            return Err(Error::Config("no datasets configured".to_string()));
        }
        for (i, name) in self.datasets.iter().enumerate() {
            if name.is_empty() {
                return Err(Error::Config("empty dataset name".to_string()));
            }
            if !is_plain_component(name) {
                return Err(Error::Config(format!(
                    "dataset name {name:?} must be a single directory name"
                )));
            }
            if self.datasets[..i].contains(name) {
                return Err(Error::Config(format!("dataset {name} configured twice")));
            }
            if self.layout == DatasetLayout::Flat && name.contains('_') {
                return Err(Error::Config(format!(
                    "dataset {name} cannot be used with the flat layout: names are split on '_'"
                )));
            }
        }
        if self.grid.images_per_row == 0 {
            return Err(Error::Config("images_per_row must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Builder for [`BenchmarkConfig`].
#[derive(Debug, Default)]
pub struct BenchmarkConfigBuilder {
    upscale_factor: Option<UpscaleFactor>,
    test_root: Option<PathBuf>,
    results_dir: Option<PathBuf>,
    statistics_dir: Option<PathBuf>,
    datasets: Option<Vec<String>>,
    layout: Option<DatasetLayout>,
    metric_mode: Option<MetricMode>,
    grid: Option<GridLayout>,
    prefetch: Option<usize>,
}

impl BenchmarkConfigBuilder {
    /// Set the upscale factor.
    #[must_use]
    pub fn upscale_factor(mut self, factor: UpscaleFactor) -> Self {
        self.upscale_factor = Some(factor);
        self
    }

    /// Set the dataset root directory.
    #[must_use]
    pub fn test_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.test_root = Some(path.into());
        self
    }

    /// Set the artifact output directory.
    #[must_use]
    pub fn results_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_dir = Some(path.into());
        self
    }

    /// Set the summary output directory.
    #[must_use]
    pub fn statistics_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.statistics_dir = Some(path.into());
        self
    }

    /// Set the dataset names, in report order.
    #[must_use]
    pub fn datasets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.datasets = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set the dataset layout.
    #[must_use]
    pub fn layout(mut self, layout: DatasetLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Set the metric color mode.
    #[must_use]
    pub fn metric_mode(mut self, mode: MetricMode) -> Self {
        self.metric_mode = Some(mode);
        self
    }

    /// Set the composite grid layout.
    #[must_use]
    pub fn grid(mut self, grid: GridLayout) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Set the prefetch window.
    #[must_use]
    pub fn prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = Some(prefetch);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> BenchmarkConfig {
        BenchmarkConfig {
            upscale_factor: self.upscale_factor.unwrap_or_default(),
            test_root: self.test_root.unwrap_or_else(|| PathBuf::from("data/test")),
            results_dir: self.results_dir.unwrap_or_else(|| PathBuf::from("results")),
            statistics_dir: self.statistics_dir.unwrap_or_else(|| PathBuf::from("statistics")),
            datasets: self.datasets.unwrap_or_else(|| {
                DEFAULT_DATASETS.iter().map(|s| (*s).to_string()).collect()
            }),
            layout: self.layout.unwrap_or_default(),
            metric_mode: self.metric_mode.unwrap_or_default(),
            grid: self.grid.unwrap_or_default(),
            prefetch: self.prefetch.unwrap_or(4).max(1),
        }
    }
}

/// Evaluation session for one model over the configured datasets.
///
/// # Example
///
/// ```rust,ignore
/// use sr_bench::{BenchmarkConfig, BenchmarkSession, Device, ResampleModel, UpscaleFactor};
///
/// let config = BenchmarkConfig::builder()
///     .upscale_factor(UpscaleFactor::X4)
///     .test_root("data/test")
///     .build();
///
/// let model = ResampleModel::load("epochs/upscale_4.json".as_ref(), Device::Cpu)?;
/// let session = BenchmarkSession::new(config, Box::new(model))?;
///
/// let results = session.run()?;
/// let table = session.write_reports(&results)?;
/// ```
pub struct BenchmarkSession {
    config: BenchmarkConfig,
    model: Box<dyn SuperResolution>,
}

impl BenchmarkSession {
    /// Create a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the model was
    /// trained for a different upscale factor.
    pub fn new(config: BenchmarkConfig, model: Box<dyn SuperResolution>) -> Result<Self> {
        config.validate()?;
        if model.upscale_factor() != config.upscale_factor {
            return Err(Error::Config(format!(
                "model {} upscales x{}, run is configured for x{}",
                model.name(),
                model.upscale_factor(),
                config.upscale_factor
            )));
        }
        Ok(Self { config, model })
    }

    /// Run configuration.
    #[must_use]
    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Model under test.
    #[must_use]
    pub fn model(&self) -> &dyn SuperResolution {
        self.model.as_ref()
    }

    /// Discover the configured datasets on disk.
    pub fn discover(&self) -> Result<Vec<BenchmarkDataset>> {
        discover_datasets(
            &self.config.test_root,
            &self.config.datasets,
            self.config.upscale_factor,
            self.config.layout,
        )
    }

    /// Discover and evaluate every configured dataset.
    pub fn run(&self) -> Result<RunResults> {
        let datasets = self.discover()?;
        self.run_datasets(&datasets, |_, _| {})
    }

    /// Evaluate already discovered datasets, calling `on_image` after each image.
    pub fn run_datasets<F>(&self, datasets: &[BenchmarkDataset], mut on_image: F) -> Result<RunResults>
    where
        F: FnMut(&str, &ImageResult),
    {
        let mut results = RunResults::new(&self.config.datasets);

        if self.config.layout == DatasetLayout::Flat {
            reset_dir(&self.config.artifact_root())?;
        }

        for dataset in datasets {
            self.evaluate_dataset(dataset, &mut results, &mut on_image)?;
        }

        Ok(results)
    }

    /// Evaluate every sample of one dataset, appending to its record.
    ///
    /// In the per-dataset layout the artifact directory is cleared first.
    pub fn evaluate_dataset<F>(
        &self,
        dataset: &BenchmarkDataset,
        results: &mut RunResults,
        on_image: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&str, &ImageResult),
    {
        let name = dataset.name();
        let record = results.record_mut(name)?;
        let out_dir = self.config.artifact_dir(name);
        match self.config.layout {
            DatasetLayout::PerDataset => reset_dir(&out_dir)?,
            DatasetLayout::Flat => std::fs::create_dir_all(&out_dir)?,
        }

        tracing::info!(dataset = name, images = dataset.len(), "evaluating dataset");

        for sample in dataset.samples(self.config.prefetch) {
            let sample = sample?;
            let result = self.evaluate_sample(&sample, &out_dir)?;
            tracing::debug!(
                dataset = name,
                image = %result.image_id,
                psnr = result.metrics.psnr,
                ssim = result.metrics.ssim,
                "evaluated image"
            );
            on_image(name, &result);
            record.push(result);
        }

        let row = crate::stats::SummaryRow::from_record(record);
        tracing::info!(
            dataset = name,
            psnr = %row.psnr,
            ssim = %row.ssim,
            "dataset finished"
        );
        Ok(())
    }

    /// Evaluate one sample and write its composite into `out_dir`.
    pub fn evaluate_sample(&self, sample: &Sample, out_dir: &Path) -> Result<ImageResult> {
        let sr = self.model.infer(&sample.low_res)?;
        if sr.shape() != sample.high_res.shape() {
            return Err(Error::Model {
                model: self.model.name().to_string(),
                message: format!(
                    "output shape {:?} does not match ground truth {:?} for {}",
                    sr.shape(),
                    sample.high_res.shape(),
                    sample.image_id
                ),
            });
        }

        let metrics = calculate_metrics(&sr, &sample.high_res, self.config.metric_mode)?;

        let grid = make_grid(&[&sample.bicubic, &sample.high_res, &sr], self.config.grid)?;
        let artifact = out_dir.join(artifact_file_name(&sample.image_id, &metrics));
        write_composite(&grid, &artifact)?;

        Ok(ImageResult {
            image_id: sample.image_id.clone(),
            metrics,
            artifact,
        })
    }

    /// Write the summary CSV and JSON run report.
    pub fn write_reports(&self, results: &RunResults) -> Result<SummaryTable> {
        let table = SummaryTable::from_results(results);
        let csv_path = self.config.summary_csv_path();
        table.write_csv(&csv_path)?;

        let report = RunReport::new(&self.config, self.model.as_ref(), results, &table);
        let json_path = self.config.report_json_path();
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&json_path, json).map_err(|e| {
            Error::Report(format!("Failed to write {}: {}", json_path.display(), e))
        })?;

        tracing::info!(csv = %csv_path.display(), json = %json_path.display(), "wrote reports");
        Ok(table)
    }
}

/// Whether `name` joins onto a directory as exactly one child entry.
fn is_plain_component(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Remove `dir` if present and recreate it empty.
fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}
