// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge pipeline — luminance reduction, 3x3 smoothing, Sobel gradients,
// non-maximum suppression, and double-threshold classification with
// hysteresis linking. Produces a binary edge mask (0 / 255).

use blattwerk_core::{HysteresisMode, RectifyConfig};
use image::{GrayImage, Luma, RgbaImage};
use tracing::{debug, instrument};

use crate::image::FloatImage;

/// Value of a confirmed edge pixel in the mask.
pub const STRONG: u8 = 255;
/// Provisional value of a pixel between the two thresholds.
pub const WEAK: u8 = 128;

/// Gradient magnitude and direction (radians) per pixel.
pub struct Gradients {
    pub magnitude: FloatImage,
    pub direction: FloatImage,
}

/// Thresholds derived from the strongest gradient in the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeThresholds {
    pub high: f32,
    pub low: f32,
}

/// Project an RGBA raster onto luminance: `round(0.299 R + 0.587 G + 0.114 B)`.
pub fn grayscale(raster: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(raster.width(), raster.height(), |x, y| {
        let [r, g, b, _] = raster.get_pixel(x, y).0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Smooth with the 3x3 binomial kernel `[[1,2,1],[2,4,2],[1,2,1]] / 16`.
///
/// The outermost rows and columns are copied unchanged rather than padded.
pub fn smooth(gray: &GrayImage) -> GrayImage {
    const KERNEL: [[u32; 3]; 3] = [[1, 2, 1], [2, 4, 2], [1, 2, 1]];

    let (width, height) = gray.dimensions();
    let mut out = gray.clone();
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let mut sum = 0u32;
            for (ky, row) in KERNEL.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    let px = gray.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1).0[0];
                    sum += weight * px as u32;
                }
            }
            out.put_pixel(x, y, Luma([((sum + 8) / 16) as u8]));
        }
    }
    out
}

/// 3x3 Sobel gradients. Border pixels keep zero magnitude and direction.
pub fn gradients(gray: &GrayImage) -> Gradients {
    let (width, height) = gray.dimensions();
    let mut magnitude = FloatImage::new(width, height);
    let mut direction = FloatImage::new(width, height);

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let p = |dx: i32, dy: i32| -> f32 {
                gray.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32).0[0] as f32
            };
            let gx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            let gy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
            magnitude.put_pixel(x, y, Luma([gx.hypot(gy)]));
            direction.put_pixel(x, y, Luma([gy.atan2(gx)]));
        }
    }
    Gradients {
        magnitude,
        direction,
    }
}

/// Thin gradient ridges to one pixel across.
///
/// A pixel keeps its magnitude only when it is at least as large as both
/// neighbours along its (undirected) gradient direction.
pub fn suppress_non_maxima(gradients: &Gradients) -> FloatImage {
    let mag = &gradients.magnitude;
    let (width, height) = mag.dimensions();
    let mut out = FloatImage::new(width, height);

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let mut angle = gradients.direction.get_pixel(x, y).0[0].to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }
            let m = |px: u32, py: u32| mag.get_pixel(px, py).0[0];
            let (n1, n2) = if !(22.5..157.5).contains(&angle) {
                (m(x - 1, y), m(x + 1, y))
            } else if angle < 67.5 {
                (m(x + 1, y - 1), m(x - 1, y + 1))
            } else if angle < 112.5 {
                (m(x, y - 1), m(x, y + 1))
            } else {
                (m(x - 1, y - 1), m(x + 1, y + 1))
            };
            let value = m(x, y);
            if value >= n1 && value >= n2 {
                out.put_pixel(x, y, Luma([value]));
            }
        }
    }
    out
}

/// Derive the high/low thresholds from the strongest surviving gradient.
///
/// Returns `None` when the image has no gradient at all.
pub fn edge_thresholds(thinned: &FloatImage, config: &RectifyConfig) -> Option<EdgeThresholds> {
    let max = thinned.pixels().map(|p| p.0[0]).fold(0.0f32, f32::max);
    if max <= 0.0 {
        return None;
    }
    let high = config.high_threshold_ratio as f32 * max;
    Some(EdgeThresholds {
        high,
        low: config.low_threshold_ratio as f32 * high,
    })
}

/// Double threshold plus hysteresis, yielding a 0/255 mask.
pub fn classify_edges(thinned: &FloatImage, config: &RectifyConfig) -> GrayImage {
    let (width, height) = thinned.dimensions();
    let Some(thresholds) = edge_thresholds(thinned, config) else {
        debug!("No gradient in image; edge mask is empty");
        return GrayImage::new(width, height);
    };

    let mut mask = GrayImage::from_fn(width, height, |x, y| {
        let v = thinned.get_pixel(x, y).0[0];
        if v >= thresholds.high {
            Luma([STRONG])
        } else if v >= thresholds.low {
            Luma([WEAK])
        } else {
            Luma([0])
        }
    });

    match config.hysteresis {
        HysteresisMode::SinglePass => {
            link_weak_pixels(&mut mask);
        }
        HysteresisMode::Converge => {
            let mut passes = 1;
            while link_weak_pixels(&mut mask) > 0 {
                passes += 1;
            }
            debug!(passes, "Hysteresis converged");
        }
    }

    for pixel in mask.pixels_mut() {
        if pixel.0[0] == WEAK {
            pixel.0[0] = 0;
        }
    }

    debug!(
        high = thresholds.high,
        low = thresholds.low,
        "Edge pixels classified"
    );
    mask
}

/// One raster-order sweep promoting weak pixels that touch a strong one.
///
/// Returns the number of promotions. Weak pixels are left weak so that a
/// later sweep can still reach them.
fn link_weak_pixels(mask: &mut GrayImage) -> usize {
    let (width, height) = mask.dimensions();
    let mut promoted = 0;
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            if mask.get_pixel(x, y).0[0] != WEAK {
                continue;
            }
            let touches_strong = (y - 1..=y + 1).any(|ny| {
                (x - 1..=x + 1)
                    .any(|nx| (nx, ny) != (x, y) && mask.get_pixel(nx, ny).0[0] == STRONG)
            });
            if touches_strong {
                mask.put_pixel(x, y, Luma([STRONG]));
                promoted += 1;
            }
        }
    }
    promoted
}

/// Run stages 1-5: RGBA raster in, binary edge mask out.
#[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
pub fn detect_edges(raster: &RgbaImage, config: &RectifyConfig) -> GrayImage {
    let smoothed = smooth(&grayscale(raster));
    let thinned = suppress_non_maxima(&gradients(&smoothed));
    let mask = classify_edges(&thinned, config);
    debug!(
        edge_pixels = mask.pixels().filter(|p| p.0[0] == STRONG).count(),
        "Edge mask ready"
    );
    mask
}
