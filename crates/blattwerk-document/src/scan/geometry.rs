// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Planar geometry for boundary detection — Graham-scan convex hulls,
// Douglas-Peucker simplification of closed polygons, area-ratio scoring of
// four-vertex candidates, and canonical corner ordering.

use blattwerk_core::{CornerOrdering, Point, Quadrilateral, RectifyConfig};
use tracing::{debug, instrument, trace};

use crate::scan::contours::Contour;

/// A four-vertex candidate and its score (percentage of image area covered).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadCandidate {
    pub corners: [Point; 4],
    pub score: f64,
}

/// Z component of `(a - o) x (b - o)`. Positive for a left turn in a y-up
/// frame, which is a clockwise turn on screen.
fn cross(o: &Point, a: &Point, b: &Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull by Graham scan.
///
/// The pivot is the point with the smallest y (then smallest x). Inputs with
/// fewer than three points are returned unchanged. Colinear points on the hull
/// boundary are dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let pivot_idx = points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let pivot = points[pivot_idx];

    let mut rest: Vec<(f64, f64, Point)> = points
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != pivot_idx)
        .map(|(_, p)| {
            let dx = p.x - pivot.x;
            let dy = p.y - pivot.y;
            (dy.atan2(dx), dx * dx + dy * dy, *p)
        })
        .collect();
    rest.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut hull: Vec<Point> = Vec::with_capacity(rest.len() + 1);
    hull.push(pivot);
    for (_, _, p) in rest {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], &p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull
}

/// Perimeter of a closed polygon.
pub fn perimeter(polygon: &[Point]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| polygon[i].distance(&polygon[(i + 1) % n]))
        .sum()
}

/// Unsigned area of a closed polygon (shoelace formula).
pub fn polygon_area(polygon: &[Point]) -> f64 {
    let n = polygon.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            polygon[i].x * polygon[j].y - polygon[j].x * polygon[i].y
        })
        .sum();
    twice.abs() / 2.0
}

/// Distance from `p` to the line through `a` and `b`, or to `a` when the two
/// coincide.
fn perpendicular_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let length = a.distance(b);
    if length < 1e-12 {
        return p.distance(a);
    }
    cross(a, b, p).abs() / length
}

/// Douglas-Peucker reduction of a closed polygon.
///
/// The tolerance is `epsilon` times the polygon's perimeter. The ring is
/// opened at its first vertex and closed again by repeating that vertex as
/// the final chord end. Polygons with fewer than four vertices are returned
/// unchanged.
pub fn simplify_polygon(polygon: &[Point], epsilon: f64) -> Vec<Point> {
    let n = polygon.len();
    if n < 4 {
        return polygon.to_vec();
    }
    let tolerance = epsilon * perimeter(polygon);

    let mut ring = polygon.to_vec();
    ring.push(polygon[0]);

    let mut kept = Vec::new();
    simplify_span(&ring, 0, n, tolerance, &mut kept);
    kept
}

/// Emit the retained start points of `ring[start..end]`, in order. The end
/// point belongs to the following span.
fn simplify_span(ring: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut Vec<Point>) {
    if end <= start + 1 {
        kept.push(ring[start]);
        return;
    }

    let mut farthest = start;
    let mut max_distance = -1.0;
    for i in start + 1..end {
        let d = perpendicular_distance(&ring[i], &ring[start], &ring[end]);
        if d > max_distance {
            max_distance = d;
            farthest = i;
        }
    }

    if max_distance > tolerance {
        simplify_span(ring, start, farthest, tolerance, kept);
        simplify_span(ring, farthest, end, tolerance, kept);
    } else {
        kept.push(ring[start]);
    }
}

/// Hull, simplify and score one contour. Returns a candidate only for
/// four-vertex results whose area ratio lies strictly inside the configured
/// bounds.
pub fn score_contour(
    contour: &Contour,
    width: u32,
    height: u32,
    config: &RectifyConfig,
) -> Option<QuadCandidate> {
    let hull = convex_hull(&contour.points);
    let simplified = simplify_polygon(&hull, config.simplify_epsilon);
    let corners: [Point; 4] = simplified.as_slice().try_into().ok()?;

    let ratio = polygon_area(&corners) / (width as f64 * height as f64);
    trace!(hull = hull.len(), ratio, "Four-vertex candidate");
    if ratio > config.min_area_ratio && ratio < config.max_area_ratio {
        Some(QuadCandidate {
            corners,
            score: ratio * 100.0,
        })
    } else {
        None
    }
}

/// Pick the highest-scoring quadrilateral across all contours. Ties keep the
/// earliest contour.
#[instrument(skip(contours, config), fields(contours = contours.len()))]
pub fn select_quadrilateral(
    contours: &[Contour],
    width: u32,
    height: u32,
    config: &RectifyConfig,
) -> Option<QuadCandidate> {
    let mut best: Option<QuadCandidate> = None;
    let mut qualifying = 0usize;
    for candidate in contours
        .iter()
        .filter_map(|c| score_contour(c, width, height, config))
    {
        qualifying += 1;
        if best.is_none_or(|b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }
    debug!(qualifying, best_score = best.map(|b| b.score), "Quadrilateral selection done");
    best
}

/// The image rectangle inset by `fallback_margin_ratio * min(width, height)`
/// on every side, scored at the fixed fallback confidence.
pub fn fallback_quadrilateral(width: u32, height: u32, config: &RectifyConfig) -> QuadCandidate {
    let (w, h) = (width as f64, height as f64);
    let margin = config.fallback_margin_ratio * w.min(h);
    QuadCandidate {
        corners: Quadrilateral::rectangle(margin, margin, w - margin, h - margin).corners,
        score: config.fallback_confidence,
    }
}

/// Assign four corners to top-left, top-right, bottom-right, bottom-left.
pub fn order_corners(corners: [Point; 4], strategy: CornerOrdering) -> Quadrilateral {
    match strategy {
        CornerOrdering::SumDifference => order_by_sum_difference(corners),
        CornerOrdering::CentroidAngle => order_by_centroid_angle(corners),
    }
}

fn order_by_sum_difference(mut corners: [Point; 4]) -> Quadrilateral {
    corners.sort_by(|a, b| (a.x + a.y).total_cmp(&(b.x + b.y)));
    let [top_left, p, q, bottom_right] = corners;
    let (top_right, bottom_left) = if (p.x - p.y) >= (q.x - q.y) { (p, q) } else { (q, p) };
    Quadrilateral::new([top_left, top_right, bottom_right, bottom_left])
}

fn order_by_centroid_angle(mut corners: [Point; 4]) -> Quadrilateral {
    let cx = corners.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = corners.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let angle = |p: &Point| (p.y - cy).atan2(p.x - cx);
    // Increasing angle in a y-down frame walks the corners clockwise on screen.
    corners.sort_by(|a, b| angle(a).total_cmp(&angle(b)));

    let start = corners
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (a.x + a.y).total_cmp(&(b.x + b.y)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    corners.rotate_left(start);
    Quadrilateral::new(corners)
}
