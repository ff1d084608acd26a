use crate::pixels::ImageBatch;

/// An aspect ratio and the ~1 megapixel resolution SDXL was trained at for it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio {
    /// width / height
    pub ratio: f64,
    pub width: u32,
    pub height: u32,
}

const fn entry(ratio: f64, width: u32, height: u32) -> AspectRatio {
    AspectRatio {
        ratio,
        width,
        height,
    }
}

/// SDXL training buckets, square first
pub const SDXL_ASPECT_RATIOS: [AspectRatio; 13] = [
    entry(1.0 / 1.0, 1024, 1024),
    entry(2.0 / 3.0, 832, 1216),
    entry(3.0 / 4.0, 896, 1152),
    entry(5.0 / 8.0, 768, 1216),
    entry(9.0 / 16.0, 768, 1344),
    entry(9.0 / 19.0, 704, 1472),
    entry(9.0 / 21.0, 640, 1536),
    entry(3.0 / 2.0, 1216, 832),
    entry(4.0 / 3.0, 1152, 896),
    entry(8.0 / 5.0, 1216, 768),
    entry(16.0 / 9.0, 1344, 768),
    entry(19.0 / 9.0, 1472, 704),
    entry(21.0 / 9.0, 1536, 640),
];

/// Closest SDXL `(width, height)` for a source size. Ties go to the earlier
/// table entry.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn snap_to_sdxl(width: usize, height: usize) -> (u32, u32) {
    let ratio = width as f64 / height.max(1) as f64;

    let mut best = &SDXL_ASPECT_RATIOS[0];
    for candidate in &SDXL_ASPECT_RATIOS[1..] {
        if (candidate.ratio - ratio).abs() < (best.ratio - ratio).abs() {
            best = candidate;
        }
    }

    (best.width, best.height)
}

/// `SDXLAspectRatio` node: SDXL-friendly size for the batch's image size
#[must_use]
pub fn sdxl_dimensions(image: &ImageBatch) -> (u32, u32) {
    snap_to_sdxl(image.width(), image.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square() {
        assert_eq!(snap_to_sdxl(512, 512), (1024, 1024));
        assert_eq!(sdxl_dimensions(&ImageBatch::new(1, 33, 33, 3)), (1024, 1024));
    }

    #[test]
    fn test_widescreen() {
        assert_eq!(snap_to_sdxl(1920, 1080), (1344, 768));
        assert_eq!(snap_to_sdxl(1080, 1920), (768, 1344));
    }

    #[test]
    fn test_nearest_match() {
        // 1.4 sits between 4:3 (1.333) and 3:2 (1.5), closer to 4:3
        assert_eq!(snap_to_sdxl(1400, 1000), (1152, 896));
        // extreme panoramas clamp to the widest bucket
        assert_eq!(snap_to_sdxl(4000, 500), (1536, 640));
        assert_eq!(snap_to_sdxl(100, 4000), (640, 1536));
    }

    #[test]
    fn test_table_dimensions_are_multiples_of_64() {
        for entry in SDXL_ASPECT_RATIOS {
            assert_eq!(entry.width % 64, 0);
            assert_eq!(entry.height % 64, 0);
        }
    }
}
