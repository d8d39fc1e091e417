//! sr-bench CLI - test a super-resolution model on benchmark datasets

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use sr_bench::{
    BenchmarkConfig, BenchmarkDataset, BenchmarkSession, DatasetLayout, Device, DeviceMode,
    GridLayout, MetricMode, ResampleModel, UpscaleFactor,
};
use tracing_subscriber::EnvFilter;

mod progress;
mod summary;

#[derive(Clone, Copy, ValueEnum)]
enum DeviceArg {
    Auto,
    Cpu,
    Accelerated,
}

impl From<DeviceArg> for DeviceMode {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Auto => Self::Auto,
            DeviceArg::Cpu => Self::Cpu,
            DeviceArg::Accelerated => Self::Accelerated,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    PerDataset,
    Flat,
}

impl From<LayoutArg> for DatasetLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::PerDataset => Self::PerDataset,
            LayoutArg::Flat => Self::Flat,
        }
    }
}

/// Test benchmark datasets against a super-resolution model.
#[derive(Parser)]
#[command(name = "sr-bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Super resolution upscale factor (2, 3, 4 or 8)
    #[arg(long, default_value = "4", value_parser = parse_factor)]
    upscale_factor: UpscaleFactor,

    /// Model checkpoint file name [default: upscale_<factor>.json]
    #[arg(long)]
    model_name: Option<String>,

    /// Directory holding model checkpoints
    #[arg(long, env = "SR_BENCH_EPOCHS_DIR", default_value = "epochs")]
    epochs_dir: PathBuf,

    /// Test image data path
    #[arg(long, env = "SR_BENCH_TEST_PATH", default_value = "data/test")]
    test_path: PathBuf,

    /// Device placement for inference
    #[arg(long, value_enum, default_value = "auto")]
    device: DeviceArg,

    /// Dataset directory layout
    #[arg(long, value_enum, default_value = "per-dataset")]
    layout: LayoutArg,

    /// Datasets to evaluate, in report order [default: Set5,Set14,BSD100,Urban100,SunHays80]
    #[arg(long, value_delimiter = ',')]
    datasets: Option<Vec<String>>,

    /// Score only the BT.601 luma channel
    #[arg(long)]
    luma: bool,

    /// Images per composite row (1 stacks vertically, 3 side by side)
    #[arg(long, default_value_t = 1)]
    images_per_row: usize,

    /// Composite border width in pixels
    #[arg(long, default_value_t = 5)]
    padding: u32,

    /// Images decoded ahead of evaluation
    #[arg(long, default_value_t = 4)]
    prefetch: usize,

    /// Output directory for comparison images
    #[arg(long, env = "SR_BENCH_RESULTS_DIR", default_value = "results")]
    results_dir: PathBuf,

    /// Output directory for summary tables
    #[arg(long, env = "SR_BENCH_STATISTICS_DIR", default_value = "statistics")]
    statistics_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_factor(s: &str) -> std::result::Result<UpscaleFactor, String> {
    let value: u32 = s.parse().map_err(|_| format!("not a number: {s}"))?;
    UpscaleFactor::try_from(value).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("[testing benchmark datasets]");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    let log_pb = pb.clone();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(move || progress::SuspendWriter::new(log_pb.clone()))
        .init();

    let factor = cli.upscale_factor;
    let device = Device::resolve(cli.device.into())?;

    let model_name = cli
        .model_name
        .clone()
        .unwrap_or_else(|| format!("upscale_{factor}.json"));
    let model_path = cli.epochs_dir.join(model_name);
    let model = ResampleModel::load(&model_path, device)
        .with_context(|| format!("Failed to load model {}", model_path.display()))?;

    let mut builder = BenchmarkConfig::builder();
    if let Some(datasets) = cli.datasets.clone() {
        builder = builder.datasets(datasets);
    }
    let config = builder
        .upscale_factor(factor)
        .test_root(&cli.test_path)
        .results_dir(&cli.results_dir)
        .statistics_dir(&cli.statistics_dir)
        .layout(cli.layout.into())
        .metric_mode(if cli.luma { MetricMode::Luma } else { MetricMode::Rgb })
        .grid(GridLayout {
            images_per_row: cli.images_per_row,
            padding: cli.padding,
        })
        .prefetch(cli.prefetch)
        .build();

    let session = BenchmarkSession::new(config, Box::new(model))?;
    tracing::info!(
        model = session.model().name(),
        %device,
        factor = %factor,
        "starting benchmark"
    );

    let datasets = session
        .discover()
        .with_context(|| format!("Failed to discover datasets in {}", cli.test_path.display()))?;
    let total: usize = datasets.iter().map(BenchmarkDataset::len).sum();
    pb.set_length(total as u64);

    let results = session.run_datasets(&datasets, |dataset, image| {
        pb.set_message(format!(
            "{dataset} psnr {:.4} ssim {:.4}",
            image.metrics.psnr, image.metrics.ssim
        ));
        pb.inc(1);
    })?;
    pb.finish_with_message("[testing benchmark datasets]");
    tracing::info!(images = results.total_images(), "benchmark finished");

    let table = session.write_reports(&results)?;
    summary::print(&table);
    println!();
    println!("Summary written to {}", session.config().summary_csv_path().display());

    Ok(())
}
