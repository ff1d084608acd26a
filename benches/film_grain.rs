//! Film grain throughput at common generation sizes
//!
//! Run with: cargo bench --bench film_grain

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glif_nodes::pixels::{FilmGrain, ImageBatch};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_film_grain(c: &mut Criterion) {
    let mut group = c.benchmark_group("film_grain");

    for side in [256usize, 512, 1024] {
        let image = ImageBatch::from_fn(1, side, side, 3, |_, y, x, c| {
            ((x + y + c) % 255) as f32 / 255.0
        });

        for grain_size in [1.0f32, 2.5] {
            let grain = FilmGrain {
                intensity: 0.2,
                grain_size,
                grain_saturation: 0.5,
                ..FilmGrain::default()
            };

            group.throughput(Throughput::Elements((side * side) as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("grain_size_{grain_size}"), side),
                &image,
                |b, image| {
                    let mut rng = StdRng::seed_from_u64(0);
                    b.iter(|| black_box(grain.apply(image, &mut rng).unwrap()));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_film_grain);
criterion_main!(benches);
