// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster codec — decode photos into RGBA rasters and encode rectified pages
// back into JPEG or PNG using the `image` crate.

use std::path::Path;

use blattwerk_core::error::{BlattwerkError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, info, instrument};

/// JPEG quality used for rectified pages unless the caller picks another.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Decode an encoded image (JPEG, PNG, TIFF, ...) into an RGBA raster.
///
/// Multi-frame formats yield their first frame.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode_raster(data: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(data).map_err(|err| {
        BlattwerkError::ImageError(format!("failed to decode image: {}", err))
    })?;
    debug!(
        width = image.width(),
        height = image.height(),
        "Image decoded from bytes"
    );
    Ok(image.to_rgba8())
}

/// Decode an image and rescale it by `scale` (1.0 keeps the native size).
///
/// Each dimension is rounded and kept at least one pixel.
#[instrument(skip(data), fields(data_len = data.len(), scale))]
pub fn decode_raster_scaled(data: &[u8], scale: f64) -> Result<RgbaImage> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(BlattwerkError::InvalidInput(format!(
            "decode scale must be positive, got {scale}"
        )));
    }
    let raster = decode_raster(data)?;
    Ok(rescale(raster, scale))
}

/// Load and decode an image file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn open_raster(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let image = image::open(path.as_ref()).map_err(|err| {
        BlattwerkError::ImageError(format!(
            "failed to open {}: {}",
            path.as_ref().display(),
            err
        ))
    })?;
    info!(width = image.width(), height = image.height(), "Image loaded");
    Ok(image.to_rgba8())
}

/// Resize a raster by a uniform factor.
pub fn rescale(raster: RgbaImage, scale: f64) -> RgbaImage {
    if (scale - 1.0).abs() < f64::EPSILON {
        return raster;
    }
    let width = ((raster.width() as f64 * scale).round() as u32).max(1);
    let height = ((raster.height() as f64 * scale).round() as u32).max(1);
    debug!(
        from_w = raster.width(),
        from_h = raster.height(),
        width,
        height,
        "Rescaling raster"
    );
    image::imageops::resize(&raster, width, height, FilterType::Triangle)
}

/// Encode a raster as JPEG with the given quality (1-100). Alpha is dropped.
pub fn encode_jpeg(raster: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = DynamicImage::ImageRgba8(raster.clone()).to_rgb8();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder).map_err(|err| {
        BlattwerkError::ImageError(format!("JPEG encoding failed: {}", err))
    })?;
    Ok(buffer)
}

/// Encode a raster as PNG, keeping the alpha channel.
pub fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    raster.write_to(&mut cursor, ImageFormat::Png).map_err(|err| {
        BlattwerkError::ImageError(format!("PNG encoding failed: {}", err))
    })?;
    Ok(buffer)
}

/// Write a raster to `path`, choosing the format from the extension.
///
/// JPEG files use `jpeg_quality`; every other format uses the encoder's
/// defaults.
pub fn save_raster(raster: &RgbaImage, path: impl AsRef<Path>, jpeg_quality: u8) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path).map_err(|err| {
        BlattwerkError::ImageError(format!(
            "cannot infer image format for {}: {}",
            path.display(),
            err
        ))
    })?;
    match format {
        ImageFormat::Jpeg => {
            let bytes = encode_jpeg(raster, jpeg_quality)?;
            std::fs::write(path, bytes)?;
        }
        _ => {
            raster.save_with_format(path, format).map_err(|err| {
                BlattwerkError::ImageError(format!(
                    "failed to save image to {}: {}",
                    path.display(),
                    err
                ))
            })?;
        }
    }
    info!(path = %path.display(), ?format, "Raster written");
    Ok(())
}
