// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster validation. The pipeline accepts 4-channel 8-bit rasters and uses
// single-channel `u8`/`f32` buffers for its intermediate stages.

use blattwerk_core::error::{BlattwerkError, Result};
use image::{ImageBuffer, Luma, RgbaImage};

/// Single-channel floating point raster (gradient magnitude, direction).
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Bytes per RGBA pixel.
const CHANNELS: usize = 4;

/// Reject rasters with no pixels.
pub fn validate_raster(raster: &RgbaImage) -> Result<()> {
    if raster.width() == 0 || raster.height() == 0 {
        return Err(BlattwerkError::InvalidInput(format!(
            "raster has zero area ({}x{})",
            raster.width(),
            raster.height()
        )));
    }
    Ok(())
}

/// Build an RGBA raster from a row-major byte buffer, checking that the
/// buffer length matches the declared dimensions.
pub fn raster_from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<RgbaImage> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(CHANNELS))
        .ok_or_else(|| {
            BlattwerkError::InvalidInput(format!(
                "{width}x{height} RGBA does not fit in addressable memory"
            ))
        })?;
    if data.len() != expected {
        return Err(BlattwerkError::InvalidInput(format!(
            "buffer holds {} bytes but {}x{} RGBA needs {}",
            data.len(),
            width,
            height,
            expected
        )));
    }
    let raster = RgbaImage::from_raw(width, height, data).ok_or_else(|| {
        BlattwerkError::InvalidInput(format!("cannot wrap buffer as {width}x{height} raster"))
    })?;
    validate_raster(&raster)?;
    Ok(raster)
}
