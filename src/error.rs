//! Error types for sr-bench operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sr-bench operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a benchmark run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Failed to load an image file.
    #[error("Image load failed: {path}: {reason}")]
    ImageLoad {
        /// Path to the image that failed to load.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to write an output artifact.
    #[error("Image write failed: {path}: {reason}")]
    ImageWrite {
        /// Destination path of the artifact.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Error from the super-resolution model during inference.
    #[error("Model error ({model}): {message}")]
    Model {
        /// Model identifier.
        model: String,
        /// Error message from the model.
        message: String,
    },

    /// Model checkpoint is missing, unreadable, or incompatible with the run.
    #[error("Checkpoint error: {path}: {reason}")]
    Checkpoint {
        /// Path of the checkpoint file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Tensor shapes don't match where they must.
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Expected shape (channels, height, width).
        expected: (usize, usize, usize),
        /// Actual shape (channels, height, width).
        actual: (usize, usize, usize),
    },

    /// Failed to calculate a quality metric.
    #[error("Metric calculation failed: {metric}: {reason}")]
    MetricCalculation {
        /// Name of the metric that failed.
        metric: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Error while discovering or pairing dataset images.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// A discovered dataset does not match the configured dataset names.
    #[error("Dataset mismatch: {found:?} is not one of the configured datasets {expected:?}")]
    DatasetMismatch {
        /// Configured dataset names.
        expected: Vec<String>,
        /// Name found on disk.
        found: String,
    },

    /// Upscale factor outside the supported set.
    #[error("Invalid upscale factor: {0} (expected one of 2, 3, 4, 8)")]
    InvalidUpscaleFactor(u32),

    /// Invalid run configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error writing report files.
    #[error("Report error: {0}")]
    Report(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
