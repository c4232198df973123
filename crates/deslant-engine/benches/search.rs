use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deslant_core::{binarize_otsu, GrayImage};
use deslant_engine::{score_shear, DeslantEngine, Optimizer, ReferenceEngine, SearchParams};

/// Text-line sized page with a few slanted strokes.
fn synthetic_line(width: usize, height: usize) -> GrayImage {
    let mut img = GrayImage::filled(width, height, 255);
    for start in (height..width - 2).step_by(24) {
        for y in 0..height {
            let x = start - (y / 2);
            img.set(x, y, 0);
            img.set(x + 1, y, 0);
        }
    }
    img
}

fn bench_score(c: &mut Criterion) {
    let img = synthetic_line(512, 64);
    let mask = binarize_otsu(&img.view());
    let mut group = c.benchmark_group("score_shear");
    for alpha in [-1.0f32, 0.0, 0.5] {
        group.bench_with_input(BenchmarkId::from_parameter(alpha), &alpha, |b, &alpha| {
            b.iter(|| black_box(score_shear(&mask, alpha)))
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_search");
    for (w, h) in [(256usize, 32usize), (1024, 128)] {
        let img = synthetic_line(w, h);
        for optimizer in [Optimizer::Grid, Optimizer::Powell] {
            let params = SearchParams {
                optimizer,
                ..SearchParams::default()
            };
            let Ok(mut engine) = ReferenceEngine::new(params) else {
                continue;
            };
            let id = BenchmarkId::new(optimizer.name(), format!("{w}x{h}"));
            group.bench_function(id, |b| {
                b.iter(|| black_box(engine.search(&img.view()).map(|o| o.alpha())))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_score, bench_search);
criterion_main!(benches);
