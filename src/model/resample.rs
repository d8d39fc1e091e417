//! Resampling reference model.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use imgref::ImgVec;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Device, SuperResolution, UpscaleFactor};
use crate::error::{Error, Result};
use crate::tensor::ImageTensor;

/// Interpolation filter used by [`ResampleModel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    /// Nearest neighbour.
    Nearest,
    /// Bilinear.
    Triangle,
    /// Bicubic (Catmull-Rom).
    #[default]
    CatmullRom,
    /// Gaussian.
    Gaussian,
    /// Lanczos with window 3.
    Lanczos3,
}

impl ResampleFilter {
    fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

fn default_channels() -> usize {
    3
}

/// On-disk checkpoint for [`ResampleModel`].
///
/// ```json
/// { "upscale_factor": 4, "filter": "lanczos3" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResampleCheckpoint {
    /// Magnification the checkpoint is keyed by.
    pub upscale_factor: UpscaleFactor,
    /// Interpolation filter.
    #[serde(default)]
    pub filter: ResampleFilter,
    /// Channel count accepted by the model.
    #[serde(default = "default_channels")]
    pub channels: usize,
}

/// Upscaler built on classical interpolation.
#[derive(Debug, Clone)]
pub struct ResampleModel {
    name: String,
    checkpoint: ResampleCheckpoint,
    device: Device,
}

impl ResampleModel {
    /// Create a model directly from a checkpoint description.
    #[must_use]
    pub fn new(checkpoint: ResampleCheckpoint, device: Device) -> Self {
        let name = format!("resample-{:?}-x{}", checkpoint.filter, checkpoint.upscale_factor)
            .to_lowercase();
        Self {
            name,
            checkpoint,
            device,
        }
    }

    /// Load a model from a JSON checkpoint file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Checkpoint`] if the file is missing or malformed.
    pub fn load(path: &Path, device: Device) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::Checkpoint {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::Checkpoint {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let checkpoint: ResampleCheckpoint =
            serde_json::from_str(&content).map_err(|e| Error::Checkpoint {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            path = %path.display(),
            filter = ?checkpoint.filter,
            factor = %checkpoint.upscale_factor,
            %device,
            "loaded resample checkpoint"
        );

        Ok(Self::new(checkpoint, device))
    }

    /// The checkpoint this model was built from.
    #[must_use]
    pub fn checkpoint(&self) -> &ResampleCheckpoint {
        &self.checkpoint
    }

    fn model_error(&self, message: String) -> Error {
        Error::Model {
            model: self.name.clone(),
            message,
        }
    }

    fn upscale_plane(&self, plane: &ImgVec<f32>) -> Result<ImgVec<f32>> {
        let factor = self.checkpoint.upscale_factor.get();
        let (width, height) = (plane.width() as u32, plane.height() as u32);
        let buf: ImageBuffer<Luma<f32>, Vec<f32>> =
            ImageBuffer::from_raw(width, height, plane.pixels().collect())
                .ok_or_else(|| self.model_error("plane buffer has the wrong length".to_string()))?;

        let resized = imageops::resize(
            &buf,
            width * factor,
            height * factor,
            self.checkpoint.filter.filter_type(),
        );

        let (out_w, out_h) = (resized.width() as usize, resized.height() as usize);
        let values: Vec<f32> = resized.into_raw().into_iter().map(|v| v.clamp(0.0, 1.0)).collect();
        Ok(ImgVec::new(values, out_w, out_h))
    }
}

impl SuperResolution for ResampleModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn upscale_factor(&self) -> UpscaleFactor {
        self.checkpoint.upscale_factor
    }

    fn device(&self) -> Device {
        self.device
    }

    fn infer(&self, low_res: &ImageTensor) -> Result<ImageTensor> {
        if low_res.channels() != self.checkpoint.channels {
            return Err(self.model_error(format!(
                "expected {} input channels, got {}",
                self.checkpoint.channels,
                low_res.channels()
            )));
        }

        let planes: Vec<ImgVec<f32>> = match self.device {
            Device::Cpu => low_res
                .planes()
                .iter()
                .map(|p| self.upscale_plane(p))
                .collect::<Result<_>>()?,
            Device::Accelerated => low_res
                .planes()
                .par_iter()
                .map(|p| self.upscale_plane(p))
                .collect::<Result<_>>()?,
        };

        ImageTensor::new(planes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint(filter: ResampleFilter) -> ResampleCheckpoint {
        ResampleCheckpoint {
            upscale_factor: UpscaleFactor::X2,
            filter,
            channels: 3,
        }
    }

    #[test]
    fn test_infer_shape() {
        let model = ResampleModel::new(checkpoint(ResampleFilter::CatmullRom), Device::Cpu);
        let lr = ImageTensor::filled(3, 5, 7, 0.25);
        let sr = model.infer(&lr).unwrap();
        assert_eq!(sr.shape(), (3, 10, 14));
        assert!(sr.values().all(|v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_devices_agree() {
        let data: Vec<f32> = (0..3 * 6 * 6).map(|i| (i % 11) as f32 / 10.0).collect();
        let lr = ImageTensor::from_chw(data, 3, 6, 6).unwrap();
        let cpu = ResampleModel::new(checkpoint(ResampleFilter::Lanczos3), Device::Cpu);
        let accel = ResampleModel::new(checkpoint(ResampleFilter::Lanczos3), Device::Accelerated);
        assert_eq!(cpu.infer(&lr).unwrap(), accel.infer(&lr).unwrap());
    }

    #[test]
    fn test_channel_mismatch() {
        let model = ResampleModel::new(checkpoint(ResampleFilter::Nearest), Device::Cpu);
        let gray = ImageTensor::filled(1, 4, 4, 0.5);
        assert!(matches!(model.infer(&gray), Err(Error::Model { .. })));
    }

    #[test]
    fn test_load_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upscale_4.json");
        std::fs::write(&path, r#"{"upscale_factor": 4, "filter": "lanczos3"}"#).unwrap();

        let model = ResampleModel::load(&path, Device::Cpu).unwrap();
        assert_eq!(model.upscale_factor(), UpscaleFactor::X4);
        assert_eq!(model.checkpoint().filter, ResampleFilter::Lanczos3);
        assert_eq!(model.checkpoint().channels, 3);
        assert_eq!(model.name(), "resample-lanczos3-x4");
    }

    #[test]
    fn test_load_missing_or_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            ResampleModel::load(&missing, Device::Cpu),
            Err(Error::Checkpoint { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"upscale_factor": 5}"#).unwrap();
        assert!(matches!(
            ResampleModel::load(&bad, Device::Cpu),
            Err(Error::Checkpoint { .. })
        ));
    }
}
