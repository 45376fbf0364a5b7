// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective resampling — inverse-maps every output pixel through a
// homography and bilinearly interpolates the source with imageproc.

use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, warp_into_with};
use tracing::{debug, instrument};

use blattwerk_core::Point;

use crate::scan::homography::Homography;

/// Samples this close to the last row or column still count as inside.
const EDGE_TOLERANCE: f64 = 1e-3;

/// Coordinate handed to the interpolator for pixels with no source point.
const UNMAPPED: (f32, f32) = (-1.0, -1.0);

/// Output pixels with no source sample.
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Pull a coordinate within [`EDGE_TOLERANCE`] of the first or last row or
/// column just inside it, so its 2x2 neighbourhood fits the source.
///
/// Anything further out is returned unchanged and left to the interpolator
/// to reject.
fn snap_to_edge(v: f64, len: u32) -> f32 {
    let last = len as f64 - 1.0;
    if (-EDGE_TOLERANCE..0.0).contains(&v) {
        0.0
    } else if len > 1 && (v - last).abs() <= EDGE_TOLERANCE {
        // Largest f32 below `last`: full weight on the last pixel.
        let last = last as f32;
        f32::from_bits(last.to_bits() - 1)
    } else {
        v as f32
    }
}

/// Source coordinates read by output pixel `(x, y)`, or [`UNMAPPED`].
fn source_coordinates(homography: &Homography, source: &RgbaImage, x: f32, y: f32) -> (f32, f32) {
    match homography.apply(Point::new(x as f64, y as f64)) {
        Some(p) => (
            snap_to_edge(p.x, source.width()),
            snap_to_edge(p.y, source.height()),
        ),
        None => UNMAPPED,
    }
}

/// Render a `width` x `height` raster whose pixel `(x, y)` is read from the
/// source at `homography(x, y)`.
///
/// Pixels whose 2x2 source neighbourhood leaves the raster, or that map onto
/// the line at infinity, stay transparent black.
#[instrument(skip(source, homography), fields(src_w = source.width(), src_h = source.height()))]
pub fn warp_perspective(
    source: &RgbaImage,
    homography: &Homography,
    width: u32,
    height: u32,
) -> RgbaImage {
    let mut output = RgbaImage::new(width, height);
    warp_into_with(
        source,
        |x, y| source_coordinates(homography, source, x, y),
        Interpolation::Bilinear,
        TRANSPARENT,
        &mut output,
    );

    debug!(
        width,
        height,
        unmapped = output.pixels().filter(|p| p.0[3] == 0).count(),
        "Perspective resampling complete"
    );
    output
}
