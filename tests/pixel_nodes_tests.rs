use glif_nodes::nodes::NodeKind;
use glif_nodes::pixels::{
    pad_to, sdxl_dimensions, to_multiple_of, FilmGrain, GrainMode, ImageBatch, MultipleOfMethod,
    PadMethod,
};
use glif_nodes::values::{resolve_variable, FloatRamp, RampType};
use image::{DynamicImage, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

fn checkerboard(width: u32, height: u32) -> DynamicImage {
    let image = RgbImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([255, 128, 0])
        } else {
            Rgb([0, 64, 255])
        }
    });
    DynamicImage::ImageRgb8(image)
}

#[test]
fn test_image_round_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("in.png");
    checkerboard(10, 6).save(&path).unwrap();

    let batch = ImageBatch::from_image(&image::open(&path).unwrap());
    assert_eq!(batch.shape(), (1, 6, 10, 3));
    assert!((batch.get(0, 0, 0, 0) - 1.0).abs() < 1e-6);
    assert!((batch.get(0, 0, 1, 2) - 1.0).abs() < 1e-6);

    let back = batch.to_image(0).unwrap().to_rgb8();
    assert_eq!(back.get_pixel(0, 0), &Rgb([255, 128, 0]));
}

#[test]
fn test_batch_requires_matching_sizes() {
    let ok = ImageBatch::from_images(&[checkerboard(4, 4), checkerboard(4, 4)]).unwrap();
    assert_eq!(ok.batch(), 2);

    assert!(ImageBatch::from_images(&[checkerboard(4, 4), checkerboard(5, 4)]).is_err());
    assert!(ImageBatch::from_images(&[]).is_err());
}

#[test]
fn test_padding_keeps_source_centred() {
    let source = ImageBatch::from_image(&checkerboard(30, 20));
    let padded = pad_to(&source, 64, 64, PadMethod::Constant);
    assert_eq!(padded.shape(), (1, 64, 64, 3));

    // 34 extra columns and 44 extra rows split evenly
    for y in 0..20 {
        for x in 0..30 {
            assert_eq!(padded.pixel(0, 22 + y, 17 + x), source.pixel(0, y, x));
        }
    }
    assert_eq!(padded.pixel(0, 0, 0), &[0.0, 0.0, 0.0]);

    let cropped = to_multiple_of(&padded, 32, MultipleOfMethod::CenterCrop).unwrap();
    assert_eq!(cropped, padded);
}

#[test]
fn test_multiple_of_then_aspect_ratio() {
    let source = ImageBatch::filled(1, 1080, 1920, 3, 0.5);
    let snapped = to_multiple_of(&source, 64, MultipleOfMethod::Rescale).unwrap();

    assert_eq!(snapped.shape(), (1, 1024, 1920, 3));
    assert_eq!(sdxl_dimensions(&source), (1344, 768));
    assert_eq!(sdxl_dimensions(&snapped), (1344, 768));

    let panorama = ImageBatch::new(1, 100, 300, 3);
    assert_eq!(sdxl_dimensions(&panorama), (1536, 640));
}

#[test]
fn test_film_grain_on_batch() {
    let batch = ImageBatch::from_images(&[checkerboard(16, 16), checkerboard(16, 16)]).unwrap();
    let grain = FilmGrain {
        intensity: 0.3,
        grain_size: 2.0,
        grain_saturation: 0.5,
        mode: GrainMode::Color,
        ..FilmGrain::default()
    };

    let a = grain.apply(&batch, &mut StdRng::seed_from_u64(42)).unwrap();
    let b = grain.apply(&batch, &mut StdRng::seed_from_u64(43)).unwrap();

    assert_eq!(a.shape(), batch.shape());
    assert!(a.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    assert_ne!(a, b);
}

#[test]
fn test_variable_and_ramp_drive_a_schedule() {
    let steps = resolve_variable("{steps}", " 8 ");
    assert_eq!(steps.string, "8");
    assert_eq!(steps.int, 8);

    let ramp = FloatRamp {
        start: 1.0,
        end: 0.0,
        steps_threshold: u32::try_from(steps.int).unwrap(),
        ramp_type: "ease_out".parse::<RampType>().unwrap(),
    };

    let values: Vec<f64> = (0..12).map(|step| ramp.value_at(step)).collect();
    assert!(values.windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(values[7], 0.0);
    assert_eq!(values[11], 0.0);
}

#[test]
fn test_node_catalog_covers_every_node() {
    assert_eq!(NodeKind::ALL.len(), 9);
    assert!(NodeKind::ALL
        .iter()
        .all(|kind| !kind.display_name().is_empty()));
}
