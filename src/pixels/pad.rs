use crate::error::NodeError;
use crate::pixels::ImageBatch;
use std::str::FromStr;

/// How the padded border is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadMethod {
    /// Zeros (black)
    #[default]
    Constant,
    /// Repeat the edge pixel
    Replicate,
    /// Mirror the image, not repeating the edge pixel
    Reflect,
}

impl PadMethod {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Replicate => "replicate",
            Self::Reflect => "reflect",
        }
    }

    /// Source index for padded coordinate `i`, or `None` for a constant fill
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn source_index(self, i: isize, len: usize) -> Option<usize> {
        let last = len as isize - 1;
        if (0..=last).contains(&i) {
            return Some(i as usize);
        }
        match self {
            Self::Constant => None,
            Self::Replicate => Some(i.clamp(0, last) as usize),
            Self::Reflect => Some(reflect(i, len)),
        }
    }
}

impl FromStr for PadMethod {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "constant" => Ok(Self::Constant),
            "replicate" | "edge" => Ok(Self::Replicate),
            "reflect" | "mirror" => Ok(Self::Reflect),
            other => Err(NodeError::InvalidParameter(format!(
                "Unknown padding method: {other}. Must be 'constant', 'replicate' or 'reflect'"
            ))),
        }
    }
}

/// Mirror `i` into `0..len`. Pads wider than the image keep bouncing
/// between the edges.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn reflect(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let m = i.rem_euclid(period);
    if m < len as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}

/// Pad each image up to `width` x `height`, centring the source.
///
/// Dimensions already at or above the target are left alone; the trailing
/// side takes the odd pixel.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn pad_to(image: &ImageBatch, width: usize, height: usize, method: PadMethod) -> ImageBatch {
    let (batch, src_h, src_w, channels) = image.shape();
    let pad_h = height.saturating_sub(src_h);
    let pad_w = width.saturating_sub(src_w);

    if pad_h == 0 && pad_w == 0 {
        return image.clone();
    }

    let top = (pad_h / 2) as isize;
    let left = (pad_w / 2) as isize;
    let out_h = src_h + pad_h;
    let out_w = src_w + pad_w;

    tracing::debug!(
        "Padding {src_w}x{src_h} to {out_w}x{out_h} with {} fill",
        method.name()
    );

    let mut out = ImageBatch::new(batch, out_h, out_w, channels);
    if src_h == 0 || src_w == 0 {
        return out;
    }

    for b in 0..batch {
        for y in 0..out_h {
            let Some(sy) = method.source_index(y as isize - top, src_h) else {
                continue;
            };
            for x in 0..out_w {
                let Some(sx) = method.source_index(x as isize - left, src_w) else {
                    continue;
                };
                out.pixel_mut(b, y, x).copy_from_slice(image.pixel(b, sy, sx));
            }
        }
    }
    out
}
