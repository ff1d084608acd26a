use crate::pixels::ImageBatch;

/// Source taps for one output coordinate
#[derive(Debug, Clone, Copy)]
struct Tap {
    lo: usize,
    hi: usize,
    frac: f32,
}

/// Half-pixel-centre sampling positions, the `align_corners = false`
/// convention used by diffusion tooling.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn axis_taps(input: usize, output: usize) -> Vec<Tap> {
    let scale = input as f32 / output as f32;
    (0..output)
        .map(|dst| {
            let src = ((dst as f32 + 0.5) * scale - 0.5).max(0.0);
            let lo = (src as usize).min(input - 1);
            let hi = if lo + 1 < input { lo + 1 } else { lo };
            Tap {
                lo,
                hi,
                frac: src - lo as f32,
            }
        })
        .collect()
}

/// Bilinear resize of every image in the batch to `height` x `width`
#[must_use]
pub fn resize_bilinear(image: &ImageBatch, height: usize, width: usize) -> ImageBatch {
    let (batch, in_h, in_w, channels) = image.shape();
    if (in_h, in_w) == (height, width) {
        return image.clone();
    }
    if in_h == 0 || in_w == 0 || height == 0 || width == 0 {
        return ImageBatch::new(batch, height, width, channels);
    }

    let rows = axis_taps(in_h, height);
    let cols = axis_taps(in_w, width);

    let mut out = ImageBatch::new(batch, height, width, channels);
    for b in 0..batch {
        for (y, row) in rows.iter().enumerate() {
            for (x, col) in cols.iter().enumerate() {
                let top_left = image.pixel(b, row.lo, col.lo);
                let top_right = image.pixel(b, row.lo, col.hi);
                let bottom_left = image.pixel(b, row.hi, col.lo);
                let bottom_right = image.pixel(b, row.hi, col.hi);
                let dst = out.pixel_mut(b, y, x);
                for c in 0..channels {
                    let top = top_left[c] + (top_right[c] - top_left[c]) * col.frac;
                    let bottom = bottom_left[c] + (bottom_right[c] - bottom_left[c]) * col.frac;
                    dst[c] = top + (bottom - top) * row.frac;
                }
            }
        }
    }
    out
}
