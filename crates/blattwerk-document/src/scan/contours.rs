// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region tracing — groups edge pixels into 8-connected components with an
// explicit stack, so large components never deepen the call stack.

use blattwerk_core::Point;
use image::GrayImage;
use tracing::{debug, instrument};

use crate::scan::edges::STRONG;

/// The member pixels of one connected edge component, in traversal order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Extract every 8-connected component of strong pixels with more than
/// `min_pixels` members.
///
/// Components are discovered in raster order of their first pixel.
#[instrument(skip(mask), fields(width = mask.width(), height = mask.height()))]
pub fn trace_regions(mask: &GrayImage, min_pixels: usize) -> Vec<Contour> {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as usize, height as usize);
    let mut visited = vec![false; w * h];
    let mut stack: Vec<(u32, u32)> = Vec::new();
    let mut contours = Vec::new();
    let mut discarded = 0usize;

    for y in 0..height {
        for x in 0..width {
            let seed = y as usize * w + x as usize;
            if visited[seed] || mask.get_pixel(x, y).0[0] != STRONG {
                continue;
            }

            visited[seed] = true;
            stack.push((x, y));
            let mut points = Vec::new();

            while let Some((px, py)) = stack.pop() {
                points.push(Point::new(px as f64, py as f64));
                for (dx, dy) in NEIGHBOURS {
                    let nx = px as i64 + dx;
                    let ny = py as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    let idx = ny as usize * w + nx as usize;
                    if !visited[idx] && mask.get_pixel(nx as u32, ny as u32).0[0] == STRONG {
                        visited[idx] = true;
                        stack.push((nx as u32, ny as u32));
                    }
                }
            }

            if points.len() > min_pixels {
                contours.push(Contour { points });
            } else {
                discarded += 1;
            }
        }
    }

    debug!(
        contours = contours.len(),
        discarded, "Edge components traced"
    );
    contours
}
