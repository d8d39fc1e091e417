//! Sample decoding with an order-preserving prefetch window.

use std::collections::VecDeque;
use std::path::Path;

use image::RgbImage;
use image::imageops::{self, FilterType};
use imgref::ImgVec;
use rayon::prelude::*;
use rgb::RGB8;

use super::SamplePaths;
use crate::error::{Error, Result};
use crate::model::UpscaleFactor;
use crate::tensor::ImageTensor;

/// One decoded benchmark item.
#[derive(Debug, Clone)]
pub struct Sample {
    /// File name of the low-resolution image, e.g. `baby.png`.
    pub image_id: String,
    /// Low-resolution input.
    pub low_res: ImageTensor,
    /// Bicubic upsampling of the input, for visual comparison only.
    pub bicubic: ImageTensor,
    /// Ground-truth high-resolution image.
    pub high_res: ImageTensor,
}

/// Decode a sample and build its bicubic reference.
///
/// # Errors
///
/// Returns an error if either image cannot be decoded or the high-resolution
/// image is not exactly `factor` times the low-resolution size.
pub fn load_sample(paths: &SamplePaths, factor: UpscaleFactor) -> Result<Sample> {
    let low_res = open_rgb(&paths.low_res)?;
    let high_res = open_rgb(&paths.high_res)?;

    let f = factor.get();
    let (w, h) = low_res.dimensions();
    if high_res.dimensions() != (w * f, h * f) {
        return Err(Error::DimensionMismatch {
            expected: (3, (h * f) as usize, (w * f) as usize),
            actual: (3, high_res.height() as usize, high_res.width() as usize),
        });
    }

    let bicubic = imageops::resize(&low_res, w * f, h * f, FilterType::CatmullRom);

    Ok(Sample {
        image_id: paths.image_id.clone(),
        low_res: ImageTensor::from_rgb8(&to_imgvec(&low_res)),
        bicubic: ImageTensor::from_rgb8(&to_imgvec(&bicubic)),
        high_res: ImageTensor::from_rgb8(&to_imgvec(&high_res)),
    })
}

fn open_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|e| Error::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(img.to_rgb8())
}

fn to_imgvec(img: &RgbImage) -> ImgVec<RGB8> {
    let pixels: Vec<RGB8> = img.pixels().map(|p| RGB8::new(p[0], p[1], p[2])).collect();
    ImgVec::new(pixels, img.width() as usize, img.height() as usize)
}

/// Iterator over decoded samples in discovery order.
///
/// Up to `prefetch` samples are decoded in parallel ahead of consumption;
/// results are still yielded strictly in order.
pub struct SampleIter<'a> {
    entries: &'a [SamplePaths],
    next: usize,
    factor: UpscaleFactor,
    prefetch: usize,
    ready: VecDeque<Result<Sample>>,
}

impl<'a> SampleIter<'a> {
    pub(crate) fn new(entries: &'a [SamplePaths], factor: UpscaleFactor, prefetch: usize) -> Self {
        Self {
            entries,
            next: 0,
            factor,
            prefetch: prefetch.max(1),
            ready: VecDeque::new(),
        }
    }

    fn fill(&mut self) {
        let end = (self.next + self.prefetch).min(self.entries.len());
        let window = &self.entries[self.next..end];
        let factor = self.factor;
        let decoded: Vec<Result<Sample>> = if window.len() > 1 {
            window.par_iter().map(|p| load_sample(p, factor)).collect()
        } else {
            window.iter().map(|p| load_sample(p, factor)).collect()
        };
        self.ready.extend(decoded);
        self.next = end;
    }
}

impl Iterator for SampleIter<'_> {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ready.is_empty() && self.next < self.entries.len() {
            self.fill();
        }
        self.ready.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ready.len() + self.entries.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SampleIter<'_> {}
