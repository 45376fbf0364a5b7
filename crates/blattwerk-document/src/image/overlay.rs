// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview overlay — draws a detected page boundary on top of the source photo
// so a caller can confirm the detection before keeping the rectified page.

use blattwerk_core::Quadrilateral;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use tracing::{debug, instrument};

/// Appearance of the boundary overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub line_color: Rgba<u8>,
    /// Stroke width in pixels (at least 1).
    pub thickness: u32,
    pub corner_color: Rgba<u8>,
    /// Radius of the corner markers; 0 disables them.
    pub corner_radius: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            line_color: Rgba([255, 140, 0, 255]),
            thickness: 3,
            corner_color: Rgba([0, 160, 255, 255]),
            corner_radius: 6,
        }
    }
}

/// Return a copy of `raster` with the quadrilateral outlined.
#[instrument(skip(raster), fields(width = raster.width(), height = raster.height()))]
pub fn highlight_quadrilateral(
    raster: &RgbaImage,
    quad: &Quadrilateral,
    style: &OverlayStyle,
) -> RgbaImage {
    let mut canvas = raster.clone();
    let thickness = style.thickness.max(1) as i32;
    // Offsets spread the stroke symmetrically around the edge.
    let offsets: Vec<f32> = (0..thickness)
        .map(|i| (i - thickness / 2) as f32)
        .collect();

    for i in 0..4 {
        let a = quad.corners[i];
        let b = quad.corners[(i + 1) % 4];
        let (ax, ay, bx, by) = (a.x as f32, a.y as f32, b.x as f32, b.y as f32);
        // Mostly horizontal edges get thickened vertically and vice versa.
        let horizontal = (bx - ax).abs() >= (by - ay).abs();
        for &o in &offsets {
            let (start, end) = if horizontal {
                ((ax, ay + o), (bx, by + o))
            } else {
                ((ax + o, ay), (bx + o, by))
            };
            draw_line_segment_mut(&mut canvas, start, end, style.line_color);
        }
    }

    if style.corner_radius > 0 {
        for corner in &quad.corners {
            let center = (corner.x.round() as i32, corner.y.round() as i32);
            draw_filled_circle_mut(
                &mut canvas,
                center,
                style.corner_radius as i32,
                style.corner_color,
            );
        }
    }

    debug!(corners = ?quad.corners, "Boundary overlay drawn");
    canvas
}
