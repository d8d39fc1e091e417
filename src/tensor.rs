//! Channel-planar float images.
//!
//! [`ImageTensor`] is the in-memory image representation shared by the model,
//! the metric engine, and the composite writer: `channels × height × width`
//! intensities in `[0, 1]`, stored as one [`ImgVec<f32>`] plane per channel.

use imgref::{ImgRef, ImgVec};
use rgb::RGB8;

use crate::error::{Error, Result};

/// A `channels × height × width` float image with values normalized to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    planes: Vec<ImgVec<f32>>,
}

impl ImageTensor {
    /// Create a tensor from per-channel planes.
    ///
    /// # Errors
    ///
    /// Returns an error if no planes are given or the planes differ in size.
    pub fn new(planes: Vec<ImgVec<f32>>) -> Result<Self> {
        let Some(first) = planes.first() else {
            return Err(Error::Config("image tensor needs at least one channel".to_string()));
        };
        let (width, height) = (first.width(), first.height());
        for plane in &planes {
            if plane.width() != width || plane.height() != height {
                return Err(Error::DimensionMismatch {
                    expected: (planes.len(), height, width),
                    actual: (planes.len(), plane.height(), plane.width()),
                });
            }
        }
        Ok(Self { planes })
    }

    /// Create a tensor from a flat CHW buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if `data.len() != channels * height * width` or
    /// `channels == 0`.
    pub fn from_chw(data: Vec<f32>, channels: usize, height: usize, width: usize) -> Result<Self> {
        if channels == 0 || data.len() != channels * height * width {
            return Err(Error::Config(format!(
                "CHW buffer of {} values does not fit shape {}x{}x{}",
                data.len(),
                channels,
                height,
                width
            )));
        }
        let plane_len = height * width;
        let planes = data
            .chunks_exact(plane_len.max(1))
            .take(channels)
            .map(|chunk| ImgVec::new(chunk.to_vec(), width, height))
            .collect();
        Self::new(planes)
    }

    /// Create a tensor with every value set to `value`.
    #[must_use]
    pub fn filled(channels: usize, height: usize, width: usize, value: f32) -> Self {
        let planes = (0..channels.max(1))
            .map(|_| ImgVec::new(vec![value; width * height], width, height))
            .collect();
        Self { planes }
    }

    /// Convert an RGB8 image into a three-channel tensor.
    #[must_use]
    pub fn from_rgb8(img: &ImgVec<RGB8>) -> Self {
        let (width, height) = (img.width(), img.height());
        let mut r = Vec::with_capacity(width * height);
        let mut g = Vec::with_capacity(width * height);
        let mut b = Vec::with_capacity(width * height);
        for p in img.pixels() {
            r.push(f32::from(p.r) / 255.0);
            g.push(f32::from(p.g) / 255.0);
            b.push(f32::from(p.b) / 255.0);
        }
        Self {
            planes: vec![
                ImgVec::new(r, width, height),
                ImgVec::new(g, width, height),
                ImgVec::new(b, width, height),
            ],
        }
    }

    /// Quantize to RGB8.
    ///
    /// Values are mapped with `v * 255 + 0.5`, clamped to `[0, 255]` and
    /// truncated. Single-channel tensors are replicated into gray RGB.
    ///
    /// # Errors
    ///
    /// Returns an error for channel counts other than 1 or 3.
    pub fn to_rgb8(&self) -> Result<ImgVec<RGB8>> {
        let (r, g, b) = match self.planes.as_slice() {
            [y] => (y, y, y),
            [r, g, b] => (r, g, b),
            _ => {
                return Err(Error::Config(format!(
                    "cannot convert a {}-channel tensor to RGB8",
                    self.channels()
                )));
            }
        };
        let pixels: Vec<RGB8> = r
            .pixels()
            .zip(g.pixels())
            .zip(b.pixels())
            .map(|((r, g), b)| RGB8::new(quantize(r), quantize(g), quantize(b)))
            .collect();
        Ok(ImgVec::new(pixels, self.width(), self.height()))
    }

    /// Number of channels.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.planes.len()
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.planes[0].height()
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.planes[0].width()
    }

    /// Shape as `(channels, height, width)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.channels(), self.height(), self.width())
    }

    /// Total number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels() * self.height() * self.width()
    }

    /// Whether the tensor has zero pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow one channel plane.
    #[must_use]
    pub fn plane(&self, channel: usize) -> ImgRef<'_, f32> {
        self.planes[channel].as_ref()
    }

    /// All channel planes in channel order.
    #[must_use]
    pub fn planes(&self) -> &[ImgVec<f32>] {
        &self.planes
    }

    /// Iterate over all values in CHW order.
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.planes.iter().flat_map(|plane| plane.pixels())
    }

    /// Fail with [`Error::DimensionMismatch`] unless `other` has the same shape.
    pub fn ensure_same_shape(&self, other: &Self) -> Result<()> {
        if self.shape() == other.shape() {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.shape(),
                actual: other.shape(),
            })
        }
    }
}

#[inline]
fn quantize(v: f32) -> u8 {
    (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_chw_shape() {
        let data: Vec<f32> = (0..2 * 3 * 4).map(|i| i as f32 / 24.0).collect();
        let t = ImageTensor::from_chw(data, 2, 3, 4).unwrap();
        assert_eq!(t.shape(), (2, 3, 4));
        assert_eq!(t.len(), 24);
        // Second plane starts at element 12
        assert!((t.plane(1).pixels().next().unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_from_chw_rejects_bad_length() {
        assert!(ImageTensor::from_chw(vec![0.0; 10], 3, 2, 2).is_err());
        assert!(ImageTensor::from_chw(vec![], 0, 2, 2).is_err());
    }

    #[test]
    fn test_new_rejects_unequal_planes() {
        let a = ImgVec::new(vec![0.0f32; 4], 2, 2);
        let b = ImgVec::new(vec![0.0f32; 6], 3, 2);
        assert!(matches!(
            ImageTensor::new(vec![a, b]),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_rgb8_conversion() {
        let img = ImgVec::new(vec![RGB8::new(255, 0, 128), RGB8::new(0, 255, 0)], 2, 1);
        let t = ImageTensor::from_rgb8(&img);
        assert_eq!(t.shape(), (3, 1, 2));
        assert!((t.plane(0).pixels().next().unwrap() - 1.0).abs() < 1e-6);

        let back = t.to_rgb8().unwrap();
        let pixels: Vec<_> = back.pixels().collect();
        assert_eq!(pixels[0], RGB8::new(255, 0, 128));
        assert_eq!(pixels[1], RGB8::new(0, 255, 0));
    }

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize(-0.5), 0);
        assert_eq!(quantize(2.0), 255);
        assert_eq!(quantize(0.5), 128);
    }

    #[test]
    fn test_gray_to_rgb8() {
        let t = ImageTensor::filled(1, 2, 2, 1.0);
        let rgb = t.to_rgb8().unwrap();
        assert!(rgb.pixels().all(|p| p == RGB8::new(255, 255, 255)));
        assert!(ImageTensor::filled(2, 2, 2, 1.0).to_rgb8().is_err());
    }
}
