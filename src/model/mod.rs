//! Super-resolution model interface.
//!
//! The benchmark treats the model as a black box: anything implementing
//! [`SuperResolution`] can be evaluated. Models are loaded once per run for a
//! fixed [`Device`] and then only borrowed immutably.
//!
//! [`ResampleModel`] is the bundled reference model. It upsamples with a
//! classical resampling filter and is loaded from a small JSON checkpoint, which
//! makes it useful as a baseline and for exercising the pipeline end to end.

mod resample;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tensor::ImageTensor;

pub use resample::{ResampleCheckpoint, ResampleFilter, ResampleModel};

/// Supported linear magnification ratios.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum UpscaleFactor {
    /// 2× upscaling.
    X2,
    /// 3× upscaling.
    X3,
    /// 4× upscaling.
    #[default]
    X4,
    /// 8× upscaling.
    X8,
}

impl UpscaleFactor {
    /// The factor as an integer.
    #[must_use]
    pub fn get(self) -> u32 {
        match self {
            Self::X2 => 2,
            Self::X3 => 3,
            Self::X4 => 4,
            Self::X8 => 8,
        }
    }

    /// Directory name used by the benchmark layout, e.g. `SRF_4`.
    #[must_use]
    pub fn dir_name(self) -> String {
        format!("SRF_{}", self.get())
    }
}

impl TryFrom<u32> for UpscaleFactor {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            2 => Ok(Self::X2),
            3 => Ok(Self::X3),
            4 => Ok(Self::X4),
            8 => Ok(Self::X8),
            other => Err(Error::InvalidUpscaleFactor(other)),
        }
    }
}

impl From<UpscaleFactor> for u32 {
    fn from(factor: UpscaleFactor) -> Self {
        factor.get()
    }
}

impl std::fmt::Display for UpscaleFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Requested device placement, as given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    /// Use the accelerated device when available.
    #[default]
    Auto,
    /// Always run on the default device.
    Cpu,
    /// Require the accelerated device.
    Accelerated,
}

/// Device a model runs on, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Single-threaded inference on the calling thread.
    Cpu,
    /// Inference spread over the rayon worker pool.
    Accelerated,
}

impl Device {
    /// Whether the accelerated device can be used in this process.
    #[must_use]
    pub fn accelerated_available() -> bool {
        rayon::current_num_threads() > 1
    }

    /// Resolve a requested mode to a concrete device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if [`DeviceMode::Accelerated`] is requested
    /// but unavailable.
    pub fn resolve(mode: DeviceMode) -> Result<Self> {
        match mode {
            DeviceMode::Cpu => Ok(Self::Cpu),
            DeviceMode::Auto if Self::accelerated_available() => Ok(Self::Accelerated),
            DeviceMode::Auto => Ok(Self::Cpu),
            DeviceMode::Accelerated if Self::accelerated_available() => Ok(Self::Accelerated),
            DeviceMode::Accelerated => Err(Error::Config(
                "accelerated device requested but the worker pool has a single thread".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Accelerated => write!(f, "accelerated"),
        }
    }
}

/// A super-resolution model under evaluation.
///
/// Implementations must be deterministic for a given input so repeated runs
/// produce identical metrics.
pub trait SuperResolution: Send + Sync {
    /// Model identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Magnification the model was trained for.
    fn upscale_factor(&self) -> UpscaleFactor;

    /// Device the model was loaded on.
    fn device(&self) -> Device;

    /// Super-resolve a low-resolution tensor.
    ///
    /// The output must be `upscale_factor` times larger in both spatial
    /// dimensions with the same channel count.
    fn infer(&self, low_res: &ImageTensor) -> Result<ImageTensor>;
}
