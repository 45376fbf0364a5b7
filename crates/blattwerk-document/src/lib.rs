// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-document — Document rectification for photographed paper pages.
//
// Provides raster decoding and encoding, the edge pipeline (grayscale, smoothing,
// Sobel gradients, non-maximum suppression, hysteresis), contour tracing, hull
// and polygon geometry, homography estimation, and perspective resampling,
// tied together by the `Rectifier` entry point.

pub mod image;
pub mod scan;

// Re-export the primary entry points so callers can use `blattwerk_document::Rectifier` etc.
pub use scan::rectify::{Detection, ProcessingResult, Rectifier, rectify_document};
