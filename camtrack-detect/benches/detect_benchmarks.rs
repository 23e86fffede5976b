use camtrack_core::{FastParams, GrayFrame, HarrisParams, OrbParams, ResponseMap, ShiTomasiParams};
use camtrack_detect::{
    suppress_non_maxima, suppress_non_maxima_fast, FastDetector, HarrisDetector, OrbDetector,
    ShiTomasiDetector,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Gradient background with scattered checker blobs, KITTI-like proportions.
fn create_benchmark_image(width: usize, height: usize) -> GrayFrame {
    let mut img = GrayFrame::filled(width, height, 0);
    for y in 0..height {
        for x in 0..width {
            let gradient = ((x as f32 / width as f32) * 50.0) as u8;
            let noise = ((x * 7 + y * 13) % 11) as u8;
            img.set(x, y, 100 + gradient + noise);
        }
    }
    for i in 0..40 {
        let cx = (i * 37 * width / 40) % width;
        let cy = (i * 17 * height / 40) % height;
        for dy in 0..6 {
            for dx in 0..6 {
                let (x, y) = (cx + dx, cy + dy);
                if x < width && y < height {
                    img.set(x, y, if (dx / 3 + dy / 3) % 2 == 0 { 30 } else { 230 });
                }
            }
        }
    }
    img
}

fn create_response_map(rows: usize, cols: usize) -> ResponseMap {
    let data = (0..rows * cols)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 7) as u8)
        .collect();
    ResponseMap::new(rows, cols, data).unwrap_or_else(|| ResponseMap::zeros(rows, cols))
}

fn bench_nms(c: &mut Criterion) {
    let mut group = c.benchmark_group("harris_nms");
    for &(rows, cols) in &[(64, 64), (128, 128), (375, 620)] {
        let map = create_response_map(rows, cols);
        group.bench_with_input(BenchmarkId::new("literal", format!("{rows}x{cols}")), &map, |b, map| {
            b.iter(|| black_box(suppress_non_maxima(black_box(map), 3, 100)))
        });
        group.bench_with_input(BenchmarkId::new("separable", format!("{rows}x{cols}")), &map, |b, map| {
            b.iter(|| black_box(suppress_non_maxima_fast(black_box(map), 3, 100)))
        });
    }
    group.finish();
}

fn bench_detectors(c: &mut Criterion) {
    let mut group = c.benchmark_group("detectors");
    let img = create_benchmark_image(1242, 375);
    let harris = HarrisDetector::new(HarrisParams::default()).unwrap();
    let fast = FastDetector::new(FastParams::default()).unwrap();
    let shi_tomasi = ShiTomasiDetector::new(ShiTomasiParams::default()).unwrap();
    let orb = OrbDetector::new(OrbParams::default()).unwrap();

    group.bench_function("harris_1242x375", |b| {
        b.iter(|| black_box(harris.detect(black_box(&img.view())).unwrap()))
    });
    group.bench_function("fast_1242x375", |b| {
        b.iter(|| black_box(fast.detect(black_box(&img.view())).unwrap()))
    });
    group.bench_function("shi_tomasi_1242x375", |b| {
        b.iter(|| black_box(shi_tomasi.detect(black_box(&img.view())).unwrap()))
    });
    group.bench_function("orb_1242x375", |b| {
        b.iter(|| black_box(orb.detect(black_box(&img.view())).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_nms, bench_detectors);
criterion_main!(benches);
