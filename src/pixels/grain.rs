use crate::error::{NodeError, Result};
use crate::pixels::{luma, resize_bilinear, ImageBatch};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::str::FromStr;

/// Post-grain colour treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrainMode {
    /// Keep colour, rescale saturation by `image_saturation`
    #[default]
    Color,
    /// Collapse to luma on all three channels
    BlackAndWhite,
}

impl GrainMode {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Color => "Color",
            Self::BlackAndWhite => "Black and White",
        }
    }
}

impl FromStr for GrainMode {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "color" | "colour" => Ok(Self::Color),
            "black and white" | "black-and-white" | "bw" => Ok(Self::BlackAndWhite),
            other => Err(NodeError::InvalidParameter(format!(
                "Unknown grain mode: {other}. Must be 'Color' or 'Black and White'"
            ))),
        }
    }
}

/// Film grain effect parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FilmGrain {
    /// Grain strength, 0..=1
    pub intensity: f32,
    /// Grain scale; noise is generated at `1 / grain_size` resolution, 0.5..=5
    pub grain_size: f32,
    /// 0 = monochrome grain, 1 = fully per-channel grain
    pub grain_saturation: f32,
    /// How much darker areas receive less grain, 0..=1
    pub brightness_impact: f32,
    /// Saturation multiplier applied in colour mode, 0..=2
    pub image_saturation: f32,
    pub mode: GrainMode,
}

impl Default for FilmGrain {
    fn default() -> Self {
        Self {
            intensity: 0.1,
            grain_size: 1.0,
            grain_saturation: 0.0,
            brightness_impact: 0.5,
            image_saturation: 1.0,
            mode: GrainMode::Color,
        }
    }
}

impl FilmGrain {
    /// Apply grain to an RGB batch, drawing noise from `rng`
    pub fn apply<R: Rng + ?Sized>(&self, image: &ImageBatch, rng: &mut R) -> Result<ImageBatch> {
        if !self.grain_size.is_finite() || self.grain_size <= 0.0 {
            return Err(NodeError::InvalidParameter(format!(
                "grain_size must be positive, got {}",
                self.grain_size
            )));
        }
        let (batch, height, width, channels) = image.shape();
        if channels != 3 {
            return Err(NodeError::InvalidParameter(format!(
                "film grain expects RGB images, got {channels} channels"
            )));
        }

        let noise = self.noise(batch, height, width, rng);
        let mut out = ImageBatch::new(batch, height, width, 3);

        for b in 0..batch {
            for y in 0..height {
                for x in 0..width {
                    let src = image.pixel(b, y, x);
                    let grain = noise.pixel(b, y, x);
                    let factor = (1.0 - self.brightness_impact) + self.brightness_impact * luma(src);

                    let mut rgb = [0.0f32; 3];
                    for c in 0..3 {
                        rgb[c] = src[c] + (grain[c] - 0.5) * self.intensity * factor;
                    }

                    let rgb = match self.mode {
                        GrainMode::Color => scale_saturation(rgb, self.image_saturation),
                        GrainMode::BlackAndWhite => [luma(&rgb); 3],
                    };

                    let dst = out.pixel_mut(b, y, x);
                    for c in 0..3 {
                        dst[c] = rgb[c].clamp(0.0, 1.0);
                    }
                }
            }
        }

        Ok(out)
    }

    /// Gaussian grain at reduced resolution, blended mono/colour and resized
    /// back to the image size
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )]
    fn noise<R: Rng + ?Sized>(&self, batch: usize, height: usize, width: usize, rng: &mut R) -> ImageBatch {
        let noise_h = ((height as f32 / self.grain_size) as usize).max(1);
        let noise_w = ((width as f32 / self.grain_size) as usize).max(1);
        let saturation = self.grain_saturation;

        let mut noise = ImageBatch::new(batch, noise_h, noise_w, 3);
        for b in 0..batch {
            for y in 0..noise_h {
                for x in 0..noise_w {
                    let mono = standard_normal(rng);
                    for value in noise.pixel_mut(b, y, x) {
                        *value = mono * (1.0 - saturation) + standard_normal(rng) * saturation;
                    }
                }
            }
        }

        if self.grain_size == 1.0 {
            noise
        } else {
            resize_bilinear(&noise, height, width)
        }
    }
}

fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    StandardNormal.sample(rng)
}

/// Round-trip through HSV with saturation multiplied by `factor`
#[allow(clippy::float_cmp)]
fn scale_saturation([r, g, b]: [f32; 3], factor: f32) -> [f32; 3] {
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0.0 { 0.0 } else { diff / v };

    // grey pixels keep hue 0; with c = 0 the hue does not matter
    let h = if diff == 0.0 {
        0.0
    } else if b == v {
        (240.0 + 60.0 * (r - g) / diff) / 360.0
    } else if g == v {
        (120.0 + 60.0 * (b - r) / diff) / 360.0
    } else {
        (60.0 * (g - b) / diff).rem_euclid(360.0) / 360.0
    };

    let s = (s * factor).clamp(0.0, 1.0);
    let c = v * s;
    let x = c * (1.0 - ((h * 6.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 1.0 / 6.0 {
        (c, x, 0.0)
    } else if h < 2.0 / 6.0 {
        (x, c, 0.0)
    } else if h < 3.0 / 6.0 {
        (0.0, c, x)
    } else if h < 4.0 / 6.0 {
        (0.0, x, c)
    } else if h < 5.0 / 6.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [r + m, g + m, b + m]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient(batch: usize, height: usize, width: usize) -> ImageBatch {
        ImageBatch::from_fn(batch, height, width, 3, |b, y, x, c| {
            ((b + y * 3 + x * 5 + c * 7) % 11) as f32 / 10.0
        })
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_zero_intensity_is_identity() {
        let image = gradient(2, 9, 13);
        for grain_size in [0.5, 1.0, 2.5] {
            let grain = FilmGrain {
                intensity: 0.0,
                grain_size,
                grain_saturation: 0.4,
                ..FilmGrain::default()
            };
            let out = grain.apply(&image, &mut rng()).unwrap();
            assert!(out.max_abs_diff(&image).unwrap() < 1e-5);
        }
    }

    #[test]
    fn test_output_is_clamped() {
        let image = gradient(1, 16, 16);
        let grain = FilmGrain {
            intensity: 1.0,
            brightness_impact: 0.0,
            grain_saturation: 1.0,
            ..FilmGrain::default()
        };
        let out = grain.apply(&image, &mut rng()).unwrap();
        assert_eq!(out.shape(), image.shape());
        assert!(out.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(out.max_abs_diff(&image).unwrap() > 0.01);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let image = gradient(1, 8, 8);
        let grain = FilmGrain {
            grain_size: 2.0,
            ..FilmGrain::default()
        };
        let a = grain.apply(&image, &mut rng()).unwrap();
        let b = grain.apply(&image, &mut rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_black_and_white_channels_match() {
        let image = gradient(1, 6, 6);
        let grain = FilmGrain {
            mode: GrainMode::BlackAndWhite,
            ..FilmGrain::default()
        };
        let out = grain.apply(&image, &mut rng()).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                let px = out.pixel(0, y, x);
                assert_eq!(px[0], px[1]);
                assert_eq!(px[1], px[2]);
            }
        }
    }

    #[test]
    fn test_zero_saturation_greys_out() {
        let image = gradient(1, 4, 4);
        let grain = FilmGrain {
            intensity: 0.0,
            image_saturation: 0.0,
            ..FilmGrain::default()
        };
        let out = grain.apply(&image, &mut rng()).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let px = out.pixel(0, y, x);
                let src = image.pixel(0, y, x);
                let v = src[0].max(src[1]).max(src[2]);
                assert!(px.iter().all(|c| (c - v).abs() < 1e-6));
            }
        }
    }

    #[test]
    fn test_rejects_non_rgb() {
        let image = ImageBatch::new(1, 4, 4, 1);
        assert!(FilmGrain::default().apply(&image, &mut rng()).is_err());

        let bad = FilmGrain {
            grain_size: 0.0,
            ..FilmGrain::default()
        };
        assert!(bad.apply(&gradient(1, 4, 4), &mut rng()).is_err());
    }

    #[test]
    fn test_scale_saturation_round_trip() {
        for rgb in [
            [0.9, 0.2, 0.1],
            [0.1, 0.8, 0.3],
            [0.2, 0.3, 0.7],
            [0.5, 0.5, 0.5],
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
        ] {
            let out = scale_saturation(rgb, 1.0);
            for c in 0..3 {
                assert!((out[c] - rgb[c]).abs() < 1e-5, "{rgb:?} -> {out:?}");
            }
        }
    }

    #[test]
    fn test_noise_is_roughly_standard_normal() {
        let mut rng = rng();
        let samples: Vec<f32> = (0..20_000).map(|_| standard_normal(&mut rng)).collect();
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        let var = samples.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / samples.len() as f32;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Color".parse::<GrainMode>().unwrap(), GrainMode::Color);
        assert_eq!(
            "Black and White".parse::<GrainMode>().unwrap(),
            GrainMode::BlackAndWhite
        );
        assert!("sepia".parse::<GrainMode>().is_err());
    }
}
