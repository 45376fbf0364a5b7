// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the blattwerk-document crate. Times boundary
// detection alone and the full rectification on a synthetic skewed page.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use blattwerk_document::Rectifier;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 640x480 photo of a light page whose corners are pulled inwards to mimic
/// a camera held at an angle.
fn skewed_page() -> RgbaImage {
    let page = [(120.0, 60.0), (540.0, 90.0), (510.0, 430.0), (90.0, 400.0)];
    RgbaImage::from_fn(640, 480, |x, y| {
        let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
        let mut inside = false;
        for i in 0..4 {
            let (ax, ay): (f64, f64) = page[i];
            let (bx, by): (f64, f64) = page[(i + 1) % 4];
            if (ay > py) != (by > py) && px < (bx - ax) * (py - ay) / (by - ay) + ax {
                inside = !inside;
            }
        }
        if inside {
            Rgba([235, 232, 225, 255])
        } else {
            Rgba([40, 35, 30, 255])
        }
    })
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_detection(c: &mut Criterion) {
    let raster = skewed_page();
    let rectifier = Rectifier::default();
    c.bench_function("detect (640x480)", |b| {
        b.iter(|| black_box(rectifier.detect(black_box(&raster))))
    });
}

/// The fallback path (no edges) is benchmarked too: it still runs the whole
/// edge pipeline before giving up.
fn bench_rectification(c: &mut Criterion) {
    let raster = skewed_page();
    let blank = RgbaImage::from_pixel(640, 480, Rgba([128, 128, 128, 255]));
    let rectifier = Rectifier::default();
    c.bench_function("rectify (640x480)", |b| {
        b.iter(|| black_box(rectifier.rectify(black_box(&raster))))
    });
    c.bench_function("rectify fallback (640x480)", |b| {
        b.iter(|| black_box(rectifier.rectify(black_box(&blank))))
    });
}

criterion_group!(benches, bench_detection, bench_rectification);
criterion_main!(benches);
