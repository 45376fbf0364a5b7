// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Projective transforms from four point correspondences — direct linear
// transform with the ninth coefficient fixed to 1, solved through the normal
// equations by Gaussian elimination with partial pivoting.

use blattwerk_core::{Point, Quadrilateral};
use nalgebra::Matrix3;
use tracing::{trace, warn};

/// Pivots smaller than this are treated as zero and skipped.
const PIVOT_EPS: f64 = 1e-12;
/// Homogeneous weights smaller than this map to no point at all.
const W_EPS: f64 = 1e-10;

/// Row-major 3x3 projective transform with eight free parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    coefficients: [f64; 9],
}

impl Homography {
    pub const IDENTITY: Homography = Homography {
        coefficients: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    pub fn from_coefficients(coefficients: [f64; 9]) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[f64; 9] {
        &self.coefficients
    }

    pub fn is_finite(&self) -> bool {
        self.coefficients.iter().all(|c| c.is_finite())
    }

    /// Map a point, or `None` when it lands on the line at infinity.
    pub fn apply(&self, p: Point) -> Option<Point> {
        let h = &self.coefficients;
        let w = h[6] * p.x + h[7] * p.y + h[8];
        if !w.is_finite() || w.abs() < W_EPS {
            return None;
        }
        let mapped = Point::new(
            (h[0] * p.x + h[1] * p.y + h[2]) / w,
            (h[3] * p.x + h[4] * p.y + h[5]) / w,
        );
        mapped.is_finite().then_some(mapped)
    }

    /// The transform taking each `from[i]` to `to[i]`.
    ///
    /// Both point sets are normalised (centroid at the origin, mean distance
    /// √2) before solving and the result is rescaled so that the ninth
    /// coefficient is exactly 1. A singular system never fails: skipped
    /// pivots leave a transform that may be non-finite, which callers check
    /// with [`Homography::is_finite`].
    pub fn estimate(from: &[Point; 4], to: &[Point; 4]) -> Self {
        let (t_from, from_n) = normalize(from);
        let (t_to, to_n) = normalize(to);

        let mut rows = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let (x, y) = (from_n[i].x, from_n[i].y);
            let (u, v) = (to_n[i].x, to_n[i].y);
            rows[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, u];
            rows[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, v];
        }

        let solution = solve_normal_equations(&rows);
        let h_norm = Matrix3::new(
            solution[0], solution[1], solution[2],
            solution[3], solution[4], solution[5],
            solution[6], solution[7], 1.0,
        );

        let Some(t_to_inv) = t_to.try_inverse() else {
            warn!("Normalising transform is singular");
            return Self::from_coefficients([f64::NAN; 9]);
        };
        let h = t_to_inv * h_norm * t_from;
        let scale = h[(2, 2)];
        let h = if scale.abs() > PIVOT_EPS {
            h / scale
        } else {
            warn!(scale, "Homography has a vanishing ninth coefficient");
            h
        };

        // nalgebra stores column-major; coefficients are row-major.
        let mut coefficients = [0.0f64; 9];
        coefficients.copy_from_slice(h.transpose().as_slice());
        trace!(?coefficients, "Homography estimated");
        Self { coefficients }
    }

    /// The transform from the output rectangle `(0,0) (W,0) (W,H) (0,H)` onto
    /// an ordered source quadrilateral.
    pub fn rectangle_to_quad(width: f64, height: f64, quad: &Quadrilateral) -> Self {
        let rect = Quadrilateral::rectangle(0.0, 0.0, width, height);
        Self::estimate(&rect.corners, &quad.corners)
    }
}

/// Similarity transform that centres the points and scales their mean
/// distance from the centroid to √2, with the transformed points.
fn normalize(points: &[Point; 4]) -> (Matrix3<f64>, [Point; 4]) {
    let cx = points.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let mean_distance = points
        .iter()
        .map(|p| (p.x - cx).hypot(p.y - cy))
        .sum::<f64>()
        / 4.0;
    let s = if mean_distance > PIVOT_EPS {
        std::f64::consts::SQRT_2 / mean_distance
    } else {
        1.0
    };
    let transform = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    (transform, points.map(|p| Point::new(s * (p.x - cx), s * (p.y - cy))))
}

/// Least-squares solution of `A x = b` for an 8x8 `A` with `b` stored as the
/// ninth column of each row, via `AᵀA x = Aᵀb`.
fn solve_normal_equations(rows: &[[f64; 9]; 8]) -> [f64; 8] {
    // Augmented 8x9 system [AᵀA | Aᵀb].
    let mut m = [[0.0f64; 9]; 8];
    for i in 0..8 {
        for j in 0..9 {
            m[i][j] = rows.iter().map(|row| row[i] * row[j]).sum();
        }
    }

    for col in 0..8 {
        let pivot_row = (col..8)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .unwrap_or(col);
        m.swap(col, pivot_row);

        let pivot = m[col][col];
        if pivot.abs() < PIVOT_EPS {
            continue;
        }
        for r in col + 1..8 {
            let factor = m[r][col] / pivot;
            for k in col..9 {
                m[r][k] -= factor * m[col][k];
            }
        }
    }

    let mut x = [0.0f64; 8];
    for i in (0..8).rev() {
        let residual = m[i][8] - (i + 1..8).map(|j| m[i][j] * x[j]).sum::<f64>();
        x[i] = if m[i][i].abs() < PIVOT_EPS {
            residual
        } else {
            residual / m[i][i]
        };
    }
    x
}
