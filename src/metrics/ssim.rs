//! Gaussian-windowed SSIM.
//!
//! Follows the common reference formulation used by SR papers: an 11×11
//! Gaussian window (sigma 1.5) applied per channel as a same-size convolution
//! with zero padding, `C1 = (0.01 L)²` and `C2 = (0.03 L)²` with `L = 1`, and
//! the SSIM map averaged over every channel and pixel.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::tensor::ImageTensor;

/// Side length of the Gaussian window.
pub const SSIM_WINDOW_SIZE: usize = 11;

/// Standard deviation of the Gaussian window.
pub const SSIM_SIGMA: f64 = 1.5;

/// Luminance stabilisation constant factor.
pub const SSIM_K1: f64 = 0.01;

/// Contrast stabilisation constant factor.
pub const SSIM_K2: f64 = 0.03;

const DYNAMIC_RANGE: f64 = 1.0;

/// Calculate mean SSIM between two equally shaped tensors.
///
/// The result is 1.0 for identical inputs and symmetric in its arguments.
///
/// # Errors
///
/// Returns an error if the shapes differ or the tensors are empty.
pub fn calculate_ssim(candidate: &ImageTensor, reference: &ImageTensor) -> Result<f64> {
    candidate.ensure_same_shape(reference)?;
    if candidate.is_empty() {
        return Err(Error::MetricCalculation {
            metric: "SSIM".to_string(),
            reason: "empty image".to_string(),
        });
    }

    let (width, height) = (candidate.width(), candidate.height());
    let window = gaussian_window(SSIM_WINDOW_SIZE, SSIM_SIGMA);

    // Per-channel map sums, collected in channel order so the total is deterministic.
    let sums: Vec<f64> = candidate
        .planes()
        .par_iter()
        .zip(reference.planes().par_iter())
        .map(|(a, b)| {
            let a: Vec<f64> = a.pixels().map(f64::from).collect();
            let b: Vec<f64> = b.pixels().map(f64::from).collect();
            ssim_map_sum(&a, &b, width, height, &window)
        })
        .collect();

    Ok(sums.iter().sum::<f64>() / candidate.len() as f64)
}

/// Normalized 1-D Gaussian of `size` taps centred on `size / 2`.
pub(crate) fn gaussian_window(size: usize, sigma: f64) -> Vec<f64> {
    let center = (size / 2) as f64;
    let mut window: Vec<f64> = (0..size)
        .map(|x| {
            let d = x as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = window.iter().sum();
    for w in &mut window {
        *w /= sum;
    }
    window
}

fn ssim_map_sum(a: &[f64], b: &[f64], width: usize, height: usize, window: &[f64]) -> f64 {
    let c1 = (SSIM_K1 * DYNAMIC_RANGE).powi(2);
    let c2 = (SSIM_K2 * DYNAMIC_RANGE).powi(2);

    let aa: Vec<f64> = a.iter().map(|v| v * v).collect();
    let bb: Vec<f64> = b.iter().map(|v| v * v).collect();
    let ab: Vec<f64> = a.iter().zip(b).map(|(x, y)| x * y).collect();

    let mu_a = filter_same(a, width, height, window);
    let mu_b = filter_same(b, width, height, window);
    let e_aa = filter_same(&aa, width, height, window);
    let e_bb = filter_same(&bb, width, height, window);
    let e_ab = filter_same(&ab, width, height, window);

    let mut sum = 0.0;
    for i in 0..a.len() {
        let mu_aa = mu_a[i] * mu_a[i];
        let mu_bb = mu_b[i] * mu_b[i];
        let mu_ab = mu_a[i] * mu_b[i];
        let sigma_aa = e_aa[i] - mu_aa;
        let sigma_bb = e_bb[i] - mu_bb;
        let sigma_ab = e_ab[i] - mu_ab;

        let numerator = (2.0 * mu_ab + c1) * (2.0 * sigma_ab + c2);
        let denominator = (mu_aa + mu_bb + c1) * (sigma_aa + sigma_bb + c2);
        sum += numerator / denominator;
    }
    sum
}

/// Separable same-size convolution with zero padding outside the image.
fn filter_same(data: &[f64], width: usize, height: usize, kernel: &[f64]) -> Vec<f64> {
    let radius = kernel.len() / 2;

    let mut rows = vec![0.0; data.len()];
    for y in 0..height {
        let line = &data[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0;
            for (k, &kv) in kernel.iter().enumerate() {
                let sx = x as isize + k as isize - radius as isize;
                if sx >= 0 && (sx as usize) < width {
                    acc += line[sx as usize] * kv;
                }
            }
            rows[y * width + x] = acc;
        }
    }

    let mut out = vec![0.0; data.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, &kv) in kernel.iter().enumerate() {
                let sy = y as isize + k as isize - radius as isize;
                if sy >= 0 && (sy as usize) < height {
                    acc += rows[sy as usize * width + x] * kv;
                }
            }
            out[y * width + x] = acc;
        }
    }
    out
}
