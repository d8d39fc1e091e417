//! Quality metrics for super-resolved images.
//!
//! This module compares a super-resolved candidate against its ground-truth
//! high-resolution reference. Supported metrics:
//!
//! - **PSNR**: Peak Signal-to-Noise Ratio in dB (higher is better, `+inf` = identical)
//! - **SSIM**: Gaussian-windowed Structural Similarity (1.0 = identical)
//!
//! Both accept tensors normalized to `[0, 1]`, so the peak value and the SSIM
//! dynamic range are 1.0.
//!
//! ## Color handling
//!
//! | Mode | Scored on |
//! |------|-----------|
//! | [`MetricMode::Rgb`] | every channel of the tensor |
//! | [`MetricMode::Luma`] | BT.601 luma `0.299 R + 0.587 G + 0.114 B` |
//!
//! Luma mode reproduces the literature convention of scoring only the
//! luminance channel.

pub mod ssim;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tensor::ImageTensor;

pub use ssim::{SSIM_K1, SSIM_K2, SSIM_SIGMA, SSIM_WINDOW_SIZE, calculate_ssim};

/// BT.601 luma weights for R, G, B.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Which color representation metrics are computed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricMode {
    /// Score all channels as given.
    #[default]
    Rgb,
    /// Score the BT.601 luma channel derived from RGB.
    Luma,
}

impl std::fmt::Display for MetricMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rgb => write!(f, "rgb"),
            Self::Luma => write!(f, "luma"),
        }
    }
}

/// PSNR and SSIM for one evaluated image.
///
/// `psnr` is `f64::INFINITY` for a perfect reconstruction. The JSON encoding
/// of an infinite PSNR is `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricPair {
    /// PSNR in dB.
    pub psnr: f64,
    /// Mean SSIM.
    pub ssim: f64,
}

/// Compute PSNR and SSIM of `candidate` against `reference` in the given mode.
///
/// # Errors
///
/// Returns an error if the shapes differ, the tensors are empty, or luma mode
/// is requested for a tensor that does not have three channels.
pub fn calculate_metrics(
    candidate: &ImageTensor,
    reference: &ImageTensor,
    mode: MetricMode,
) -> Result<MetricPair> {
    match mode {
        MetricMode::Rgb => Ok(MetricPair {
            psnr: calculate_psnr(candidate, reference)?,
            ssim: calculate_ssim(candidate, reference)?,
        }),
        MetricMode::Luma => {
            let candidate = to_luma(candidate)?;
            let reference = to_luma(reference)?;
            Ok(MetricPair {
                psnr: calculate_psnr(&candidate, &reference)?,
                ssim: calculate_ssim(&candidate, &reference)?,
            })
        }
    }
}

/// Mean squared error over every element of two equally shaped tensors.
///
/// # Errors
///
/// Returns an error if the shapes differ or the tensors are empty.
pub fn mean_squared_error(candidate: &ImageTensor, reference: &ImageTensor) -> Result<f64> {
    candidate.ensure_same_shape(reference)?;
    if candidate.is_empty() {
        return Err(Error::MetricCalculation {
            metric: "MSE".to_string(),
            reason: "empty image".to_string(),
        });
    }

    let sum: f64 = candidate
        .values()
        .zip(reference.values())
        .map(|(c, r)| {
            let diff = f64::from(c) - f64::from(r);
            diff * diff
        })
        .sum();

    Ok(sum / candidate.len() as f64)
}

/// Calculate PSNR between two tensors with peak value 1.0.
///
/// # Returns
///
/// PSNR value in decibels, `10 * log10(1 / mse)`. Higher is better. Returns
/// `f64::INFINITY` if the tensors are identical.
pub fn calculate_psnr(candidate: &ImageTensor, reference: &ImageTensor) -> Result<f64> {
    let mse = mean_squared_error(candidate, reference)?;

    if mse == 0.0 {
        Ok(f64::INFINITY)
    } else {
        Ok(10.0 * (1.0 / mse).log10())
    }
}

/// Derive the BT.601 luma channel of an RGB tensor.
///
/// # Errors
///
/// Returns an error unless the tensor has exactly three channels.
pub fn to_luma(rgb: &ImageTensor) -> Result<ImageTensor> {
    if rgb.channels() != 3 {
        return Err(Error::MetricCalculation {
            metric: "luma".to_string(),
            reason: format!("expected 3 channels, got {}", rgb.channels()),
        });
    }

    let [wr, wg, wb] = LUMA_WEIGHTS;
    let luma: Vec<f32> = rgb
        .plane(0)
        .pixels()
        .zip(rgb.plane(1).pixels())
        .zip(rgb.plane(2).pixels())
        .map(|((r, g), b)| wr * r + wg * g + wb * b)
        .collect();

    ImageTensor::from_chw(luma, 1, rgb.height(), rgb.width())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(channels: usize, height: usize, width: usize, offset: usize) -> ImageTensor {
        let data: Vec<f32> = (0..channels * height * width)
            .map(|i| ((i * 7 + offset) % 97) as f32 / 96.0)
            .collect();
        ImageTensor::from_chw(data, channels, height, width).unwrap()
    }

    #[test]
    fn test_psnr_identical() {
        let img = gradient(3, 16, 16, 0);
        let psnr = calculate_psnr(&img, &img).unwrap();
        assert!(psnr.is_infinite() && psnr > 0.0);
    }

    #[test]
    fn test_psnr_constant_offset() {
        let a = ImageTensor::filled(3, 8, 8, 0.5);
        let b = ImageTensor::filled(3, 8, 8, 0.6);
        let psnr = calculate_psnr(&a, &b).unwrap();
        // mse = 0.01 -> 20 dB
        assert!((psnr - 20.0).abs() < 1e-3, "psnr: {psnr}");
    }

    #[test]
    fn test_metrics_are_symmetric() {
        let a = gradient(3, 20, 24, 0);
        let b = gradient(3, 20, 24, 13);
        for mode in [MetricMode::Rgb, MetricMode::Luma] {
            let ab = calculate_metrics(&a, &b, mode).unwrap();
            let ba = calculate_metrics(&b, &a, mode).unwrap();
            assert!((ab.psnr - ba.psnr).abs() < 1e-12);
            assert!((ab.ssim - ba.ssim).abs() < 1e-12);
        }
    }

    #[test]
    fn test_self_comparison() {
        let img = gradient(3, 20, 20, 5);
        let pair = calculate_metrics(&img, &img, MetricMode::Rgb).unwrap();
        assert!(pair.psnr.is_infinite());
        assert!((pair.ssim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_luma_of_gray_matches_single_channel() {
        let gray_a = gradient(1, 18, 18, 0);
        let gray_b = gradient(1, 18, 18, 31);
        let expand = |t: &ImageTensor| {
            ImageTensor::new(vec![t.planes()[0].clone(); 3]).unwrap()
        };

        let luma = calculate_metrics(&expand(&gray_a), &expand(&gray_b), MetricMode::Luma).unwrap();
        let single = calculate_metrics(&gray_a, &gray_b, MetricMode::Rgb).unwrap();

        assert!((luma.psnr - single.psnr).abs() < 1e-3, "{} vs {}", luma.psnr, single.psnr);
        assert!((luma.ssim - single.ssim).abs() < 1e-4, "{} vs {}", luma.ssim, single.ssim);
    }

    #[test]
    fn test_luma_weights() {
        let data = [vec![1.0f32; 4], vec![0.0; 4], vec![0.0; 4]].concat();
        let red = ImageTensor::from_chw(data, 3, 2, 2).unwrap();
        let luma = to_luma(&red).unwrap();
        assert_eq!(luma.channels(), 1);
        assert!(luma.values().all(|v| (v - 0.299).abs() < 1e-6));
    }

    #[test]
    fn test_luma_requires_rgb() {
        let gray = ImageTensor::filled(1, 4, 4, 0.5);
        assert!(matches!(
            calculate_metrics(&gray, &gray, MetricMode::Luma),
            Err(Error::MetricCalculation { .. })
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = ImageTensor::filled(3, 8, 8, 0.5);
        let b = ImageTensor::filled(3, 8, 9, 0.5);
        assert!(matches!(
            calculate_psnr(&a, &b),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(calculate_ssim(&a, &b).is_err());
    }
}
