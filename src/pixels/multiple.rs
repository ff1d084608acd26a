use crate::error::{NodeError, Result};
use crate::pixels::{resize_bilinear, ImageBatch};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultipleOfMethod {
    #[default]
    CenterCrop,
    Rescale,
}

impl MultipleOfMethod {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CenterCrop => "center crop",
            Self::Rescale => "rescale",
        }
    }
}

impl FromStr for MultipleOfMethod {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "center crop" | "center-crop" | "crop" => Ok(Self::CenterCrop),
            "rescale" | "resize" => Ok(Self::Rescale),
            other => Err(NodeError::InvalidParameter(format!(
                "Unknown method: {other}. Must be 'center crop' or 'rescale'"
            ))),
        }
    }
}

/// Shrink height and width down to the nearest multiple of `multiple_of`
pub fn to_multiple_of(
    image: &ImageBatch,
    multiple_of: usize,
    method: MultipleOfMethod,
) -> Result<ImageBatch> {
    if multiple_of == 0 {
        return Err(NodeError::InvalidParameter(
            "multiple_of must be at least 1".to_string(),
        ));
    }

    let (_, height, width, _) = image.shape();
    let new_height = height - height % multiple_of;
    let new_width = width - width % multiple_of;

    if new_height == 0 || new_width == 0 {
        return Err(NodeError::InvalidParameter(format!(
            "{width}x{height} image is smaller than a multiple of {multiple_of}"
        )));
    }

    Ok(match method {
        MultipleOfMethod::Rescale => resize_bilinear(image, new_height, new_width),
        MultipleOfMethod::CenterCrop => {
            let top = (height - new_height) / 2;
            let left = (width - new_width) / 2;
            crop(image, top, left, new_height, new_width)
        }
    })
}

fn crop(image: &ImageBatch, top: usize, left: usize, height: usize, width: usize) -> ImageBatch {
    let mut out = ImageBatch::new(image.batch(), height, width, image.channels());
    for b in 0..image.batch() {
        for y in 0..height {
            for x in 0..width {
                out.pixel_mut(b, y, x)
                    .copy_from_slice(image.pixel(b, top + y, left + x));
            }
        }
    }
    out
}
