//! Pixel-space nodes over `[batch, height, width, channels]` float images.

pub mod aspect;
pub mod grain;
pub mod multiple;
pub mod pad;
pub mod resample;

pub use aspect::{sdxl_dimensions, snap_to_sdxl, AspectRatio, SDXL_ASPECT_RATIOS};
pub use grain::{FilmGrain, GrainMode};
pub use multiple::{to_multiple_of, MultipleOfMethod};
pub use pad::{pad_to, PadMethod};
pub use resample::resize_bilinear;

use crate::error::{NodeError, Result};
use image::{DynamicImage, ImageBuffer, Luma, Rgb32FImage, Rgba32FImage};

/// Batch of images stored as contiguous `f32` in BHWC order, values in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch {
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<f32>,
}

impl ImageBatch {
    /// Zero-filled batch
    #[must_use]
    pub fn new(batch: usize, height: usize, width: usize, channels: usize) -> Self {
        Self::filled(batch, height, width, channels, 0.0)
    }

    #[must_use]
    pub fn filled(batch: usize, height: usize, width: usize, channels: usize, value: f32) -> Self {
        Self {
            batch,
            height,
            width,
            channels,
            data: vec![value; batch * height * width * channels],
        }
    }

    /// Build a batch from `f(b, y, x, c)`
    pub fn from_fn(
        batch: usize,
        height: usize,
        width: usize,
        channels: usize,
        mut f: impl FnMut(usize, usize, usize, usize) -> f32,
    ) -> Self {
        let mut data = Vec::with_capacity(batch * height * width * channels);
        for b in 0..batch {
            for y in 0..height {
                for x in 0..width {
                    for c in 0..channels {
                        data.push(f(b, y, x, c));
                    }
                }
            }
        }
        Self {
            batch,
            height,
            width,
            channels,
            data,
        }
    }

    /// Wrap an existing BHWC buffer
    pub fn from_vec(
        batch: usize,
        height: usize,
        width: usize,
        channels: usize,
        data: Vec<f32>,
    ) -> Result<Self> {
        let expected = batch
            .checked_mul(height)
            .and_then(|v| v.checked_mul(width))
            .and_then(|v| v.checked_mul(channels))
            .ok_or_else(|| NodeError::InvalidParameter("image size overflow".to_string()))?;

        if data.len() != expected {
            return Err(NodeError::InvalidParameter(format!(
                "buffer of {} values does not match {batch}x{height}x{width}x{channels}",
                data.len()
            )));
        }

        Ok(Self {
            batch,
            height,
            width,
            channels,
            data,
        })
    }

    #[must_use]
    pub const fn batch(&self) -> usize {
        self.batch
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// `(batch, height, width, channels)`
    #[must_use]
    pub const fn shape(&self) -> (usize, usize, usize, usize) {
        (self.batch, self.height, self.width, self.channels)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    const fn offset(&self, b: usize, y: usize, x: usize) -> usize {
        ((b * self.height + y) * self.width + x) * self.channels
    }

    #[inline]
    #[must_use]
    pub fn get(&self, b: usize, y: usize, x: usize, c: usize) -> f32 {
        self.data[self.offset(b, y, x) + c]
    }

    #[inline]
    pub fn set(&mut self, b: usize, y: usize, x: usize, c: usize, value: f32) {
        let i = self.offset(b, y, x) + c;
        self.data[i] = value;
    }

    /// All channels of one pixel
    #[inline]
    #[must_use]
    pub fn pixel(&self, b: usize, y: usize, x: usize) -> &[f32] {
        let start = self.offset(b, y, x);
        &self.data[start..start + self.channels]
    }

    #[inline]
    pub fn pixel_mut(&mut self, b: usize, y: usize, x: usize) -> &mut [f32] {
        let start = self.offset(b, y, x);
        let channels = self.channels;
        &mut self.data[start..start + channels]
    }

    /// Largest per-value difference, `None` if shapes differ
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> Option<f32> {
        if self.shape() != other.shape() {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f32::max),
        )
    }

    /// Single RGB image as a batch of one
    #[must_use]
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgb = image.to_rgb32f();
        let (width, height) = rgb.dimensions();
        Self {
            batch: 1,
            height: height as usize,
            width: width as usize,
            channels: 3,
            data: rgb.into_raw(),
        }
    }

    /// Stack same-sized images into one RGB batch
    pub fn from_images(images: &[DynamicImage]) -> Result<Self> {
        let first = images
            .first()
            .ok_or_else(|| NodeError::InvalidParameter("no images given".to_string()))?;
        let (width, height) = (first.width(), first.height());

        let mut data = Vec::new();
        for image in images {
            if (image.width(), image.height()) != (width, height) {
                return Err(NodeError::InvalidParameter(format!(
                    "batch images must share a size: {}x{} vs {width}x{height}",
                    image.width(),
                    image.height()
                )));
            }
            data.extend(image.to_rgb32f().into_raw());
        }

        Self::from_vec(images.len(), height as usize, width as usize, 3, data)
    }

    /// Extract image `index` of the batch
    pub fn to_image(&self, index: usize) -> Result<DynamicImage> {
        if index >= self.batch {
            return Err(NodeError::InvalidParameter(format!(
                "image {index} out of range for batch of {}",
                self.batch
            )));
        }

        let start = self.offset(index, 0, 0);
        let end = self.offset(index + 1, 0, 0);
        let pixels = self.data[start..end].to_vec();
        let (width, height) = (to_u32(self.width)?, to_u32(self.height)?);
        let size_error =
            || NodeError::Other(format!("buffer does not fit {width}x{height} image"));

        let image = match self.channels {
            1 => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let luma: Vec<u16> = pixels
                    .iter()
                    .map(|v| (v.clamp(0.0, 1.0) * f32::from(u16::MAX)).round() as u16)
                    .collect();
                let buffer = ImageBuffer::<Luma<u16>, _>::from_raw(width, height, luma)
                    .ok_or_else(size_error)?;
                DynamicImage::ImageLuma16(buffer)
            }
            3 => DynamicImage::ImageRgb32F(
                Rgb32FImage::from_raw(width, height, pixels).ok_or_else(size_error)?,
            ),
            4 => DynamicImage::ImageRgba32F(
                Rgba32FImage::from_raw(width, height, pixels).ok_or_else(size_error)?,
            ),
            n => {
                return Err(NodeError::InvalidParameter(format!(
                    "cannot convert {n}-channel image"
                )))
            }
        };

        Ok(image)
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| NodeError::InvalidParameter(format!("dimension {value} too large")))
}

/// Rec. 601 luma of an RGB pixel
#[inline]
#[must_use]
pub fn luma(rgb: &[f32]) -> f32 {
    0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_from_vec_validates_len() {
        assert!(ImageBatch::from_vec(1, 2, 2, 3, vec![0.0; 12]).is_ok());
        assert!(ImageBatch::from_vec(1, 2, 2, 3, vec![0.0; 11]).is_err());
    }

    #[test]
    fn test_indexing() {
        let image = ImageBatch::from_fn(2, 3, 4, 3, |b, y, x, c| (b * 1000 + y * 100 + x * 10 + c) as f32);
        assert_eq!(image.get(1, 2, 3, 2), 1232.0);
        assert_eq!(image.pixel(0, 1, 2), &[120.0, 121.0, 122.0]);
    }

    #[test]
    fn test_image_round_trip() {
        let rgb = RgbImage::from_fn(5, 3, |x, y| image::Rgb([x as u8 * 50, y as u8 * 100, 255]));
        let batch = ImageBatch::from_image(&DynamicImage::ImageRgb8(rgb.clone()));
        assert_eq!(batch.shape(), (1, 3, 5, 3));
        assert!((batch.get(0, 2, 0, 1) - 200.0 / 255.0).abs() < 1e-6);

        let back = batch.to_image(0).unwrap().to_rgb8();
        assert_eq!(back, rgb);
        assert!(batch.to_image(1).is_err());
    }

    #[test]
    fn test_from_images_requires_same_size() {
        let a = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let b = DynamicImage::ImageRgb8(RgbImage::new(4, 2));
        assert_eq!(
            ImageBatch::from_images(&[a.clone(), a.clone()]).unwrap().batch(),
            2
        );
        assert!(ImageBatch::from_images(&[a, b]).is_err());
        assert!(ImageBatch::from_images(&[]).is_err());
    }

    #[test]
    fn test_luma_weights_sum_to_one() {
        assert!((luma(&[1.0, 1.0, 1.0]) - 1.0).abs() < 1e-6);
    }
}
