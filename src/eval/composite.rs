//! Side-by-side comparison artifacts.
//!
//! Each evaluated image produces one composite: bicubic reference, ground
//! truth and super-resolved output laid out in a padded grid on a white
//! background, named after the source image and its metrics.

use std::path::Path;

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::MetricPair;
use crate::tensor::ImageTensor;

/// Border color between and around grid cells.
pub const PAD_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Grid arrangement of composite images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Images per row: 1 stacks vertically, 3 places side by side.
    pub images_per_row: usize,
    /// Border width in pixels.
    pub padding: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            images_per_row: 1,
            padding: 5,
        }
    }
}

/// Arrange equally sized images into a padded grid, row by row.
///
/// # Errors
///
/// Returns an error if `images` is empty, the shapes differ, or an image
/// cannot be converted to RGB8.
pub fn make_grid(images: &[&ImageTensor], layout: GridLayout) -> Result<RgbImage> {
    let Some(first) = images.first() else {
        return Err(Error::Config("composite needs at least one image".to_string()));
    };
    for img in images {
        first.ensure_same_shape(img)?;
    }

    let columns = layout.images_per_row.clamp(1, images.len());
    let rows = images.len().div_ceil(columns);
    let pad = layout.padding;
    let cell_w = first.width() as u32 + pad;
    let cell_h = first.height() as u32 + pad;

    let mut grid = RgbImage::from_pixel(
        cell_w * columns as u32 + pad,
        cell_h * rows as u32 + pad,
        PAD_COLOR,
    );

    for (k, img) in images.iter().enumerate() {
        let x0 = (k % columns) as u32 * cell_w + pad;
        let y0 = (k / columns) as u32 * cell_h + pad;
        let rgb = img.to_rgb8()?;
        for (y, row) in rgb.rows().enumerate() {
            for (x, p) in row.iter().enumerate() {
                grid.put_pixel(x0 + x as u32, y0 + y as u32, Rgb([p.r, p.g, p.b]));
            }
        }
    }

    Ok(grid)
}

/// File name for a composite: `<stem>_psnr_<p>_ssim_<s>.<ext>`, metrics to 4 decimals.
///
/// Only the last extension is split off, so `a.b.png` keeps the stem `a.b`.
/// The source extension is preserved; an infinite PSNR renders as `inf`.
#[must_use]
pub fn artifact_file_name(image_id: &str, metrics: &MetricPair) -> String {
    let path = Path::new(image_id);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(image_id);
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("png");
    format!(
        "{}_psnr_{:.4}_ssim_{:.4}.{}",
        stem, metrics.psnr, metrics.ssim, ext
    )
}

/// Encode a composite to `path`, choosing the format from its extension.
pub fn write_composite(grid: &RgbImage, path: &Path) -> Result<()> {
    grid.save(path).map_err(|e| Error::ImageWrite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_grid_dimensions() {
        let a = ImageTensor::filled(3, 4, 6, 0.0);
        let grid = make_grid(&[&a, &a, &a], GridLayout::default()).unwrap();
        // width = 6 + 2*5, height = 3*(4+5) + 5
        assert_eq!(grid.dimensions(), (16, 32));
        assert_eq!(*grid.get_pixel(0, 0), PAD_COLOR);
        assert_eq!(*grid.get_pixel(5, 5), Rgb([0, 0, 0]));
        assert_eq!(*grid.get_pixel(5, 9), PAD_COLOR);
    }

    #[test]
    fn test_horizontal_grid_order() {
        let black = ImageTensor::filled(3, 2, 2, 0.0);
        let gray = ImageTensor::filled(3, 2, 2, 0.5);
        let white = ImageTensor::filled(3, 2, 2, 1.0);
        let layout = GridLayout {
            images_per_row: 3,
            padding: 1,
        };
        let grid = make_grid(&[&black, &gray, &white], layout).unwrap();
        assert_eq!(grid.dimensions(), (10, 4));
        assert_eq!(*grid.get_pixel(1, 1), Rgb([0, 0, 0]));
        assert_eq!(*grid.get_pixel(4, 1), Rgb([128, 128, 128]));
        assert_eq!(*grid.get_pixel(7, 2), Rgb([255, 255, 255]));
        assert_eq!(*grid.get_pixel(3, 1), PAD_COLOR);
    }

    #[test]
    fn test_grid_shape_mismatch() {
        let a = ImageTensor::filled(3, 2, 2, 0.0);
        let b = ImageTensor::filled(3, 2, 3, 0.0);
        assert!(make_grid(&[&a, &b], GridLayout::default()).is_err());
        assert!(make_grid(&[], GridLayout::default()).is_err());
    }

    #[test]
    fn test_artifact_file_name() {
        let pair = MetricPair {
            psnr: 31.234567,
            ssim: 0.912345,
        };
        assert_eq!(
            artifact_file_name("baby.png", &pair),
            "baby_psnr_31.2346_ssim_0.9123.png"
        );
        let perfect = MetricPair {
            psnr: f64::INFINITY,
            ssim: 1.0,
        };
        assert_eq!(
            artifact_file_name("Set5_001.bmp", &perfect),
            "Set5_001_psnr_inf_ssim_1.0000.bmp"
        );
        assert_eq!(
            artifact_file_name("img.v2.png", &pair),
            "img.v2_psnr_31.2346_ssim_0.9123.png"
        );
    }

    #[test]
    fn test_write_composite_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let grid = RgbImage::from_pixel(2, 2, PAD_COLOR);
        let path = dir.path().join("out.unknownext");
        assert!(matches!(
            write_composite(&grid, &path),
            Err(Error::ImageWrite { .. })
        ));
    }
}
