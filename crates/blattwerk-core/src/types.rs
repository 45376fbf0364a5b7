// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Blattwerk: pixel-space points, the detected page
// quadrilateral, and the size of the rectified output.

use serde::{Deserialize, Serialize};

/// A point in pixel space.
///
/// Early pipeline stages only ever hold integral pixel indices here; the
/// geometry stages treat the same values as continuous coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Four page corners in the order top-left, top-right, bottom-right,
/// bottom-left.
///
/// The ordering is established by the corner orderer; this type does not
/// check it, and degenerate shapes (colinear or coincident corners) are
/// representable on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub corners: [Point; 4],
}

impl Quadrilateral {
    pub const fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    /// Axis-aligned rectangle with the given inclusive-exclusive extents.
    pub fn rectangle(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new([
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        ])
    }

    pub fn top_left(&self) -> Point {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.corners[3]
    }

    /// Longer of the top and bottom edges.
    pub fn max_horizontal_edge(&self) -> f64 {
        let top = self.top_left().distance(&self.top_right());
        let bottom = self.bottom_left().distance(&self.bottom_right());
        top.max(bottom)
    }

    /// Longer of the left and right edges.
    pub fn max_vertical_edge(&self) -> f64 {
        let left = self.top_left().distance(&self.bottom_left());
        let right = self.top_right().distance(&self.bottom_right());
        left.max(right)
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height), portrait.
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Portrait pixel dimensions at the given resolution.
    pub fn pixels_at(&self, dpi: u32) -> (u32, u32) {
        let (w_mm, h_mm) = self.dimensions_mm();
        let to_px = |mm: u32| (mm as f64 * dpi as f64 / 25.4).round() as u32;
        (to_px(w_mm), to_px(h_mm))
    }

}

/// How large the rectified output raster should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OutputSize {
    /// Longest opposite edges of the detected quadrilateral.
    #[default]
    FromCorners,
    /// Same dimensions as the source raster.
    MatchSource,
    /// Exact caller-chosen dimensions.
    Fixed { width: u32, height: u32 },
    /// A paper format rendered at `dpi`, turned landscape when the detected
    /// page is wider than tall.
    Paper { size: PaperSize, dpi: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_corners_run_clockwise() {
        let quad = Quadrilateral::rectangle(10.0, 20.0, 110.0, 70.0);
        assert_eq!(quad.top_left(), Point::new(10.0, 20.0));
        assert_eq!(quad.top_right(), Point::new(110.0, 20.0));
        assert_eq!(quad.bottom_left(), Point::new(10.0, 70.0));
    }

    #[test]
    fn edge_lengths_take_the_longer_side() {
        let quad = Quadrilateral::new([
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(90.0, 60.0),
            Point::new(10.0, 50.0),
        ]);
        assert!((quad.max_horizontal_edge() - 100.0).abs() < 1e-9);
        let right = (10.0f64).hypot(60.0);
        assert!((quad.max_vertical_edge() - right).abs() < 1e-9);
    }

    #[test]
    fn a4_at_300_dpi() {
        assert_eq!(PaperSize::A4.pixels_at(300), (2480, 3508));
        assert_eq!(PaperSize::Letter.pixels_at(100), (850, 1098));
    }

    #[test]
    fn output_size_serializes_with_mode_tag() {
        let json = serde_json::to_string(&OutputSize::Fixed {
            width: 800,
            height: 600,
        })
        .unwrap();
        assert_eq!(json, r#"{"mode":"fixed","width":800,"height":600}"#);
        let parsed: OutputSize = serde_json::from_str(r#"{"mode":"match_source"}"#).unwrap();
        assert_eq!(parsed, OutputSize::MatchSource);
    }
}
