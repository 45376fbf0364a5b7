// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — raster validation, decoding/encoding, and preview overlays.

pub mod codec;
pub mod overlay;
pub mod raster;

pub use codec::{DEFAULT_JPEG_QUALITY, decode_raster, decode_raster_scaled, encode_jpeg, encode_png};
pub use overlay::{OverlayStyle, highlight_quadrilateral};
pub use raster::{FloatImage, raster_from_raw, validate_raster};
