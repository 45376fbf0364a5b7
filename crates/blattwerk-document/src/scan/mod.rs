// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — edge detection, contour tracing, quadrilateral
// selection, homography estimation, and perspective resampling.

pub mod contours;
pub mod edges;
pub mod geometry;
pub mod homography;
pub mod rectify;
pub mod warp;

pub use homography::Homography;
pub use rectify::{Detection, ProcessingResult, Rectifier, rectify_document};
