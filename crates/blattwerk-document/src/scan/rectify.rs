// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document rectification — finds the page quadrilateral in a photo and warps
// it to an axis-aligned rectangle, reporting a heuristic confidence instead of
// failing when the page boundary is unclear.

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::{OutputSize, Quadrilateral, RectifyConfig};
use image::RgbaImage;
use tracing::{debug, info, instrument, warn};

use crate::image::raster::{raster_from_raw, validate_raster};
use crate::scan::contours::trace_regions;
use crate::scan::edges::detect_edges;
use crate::scan::geometry::{fallback_quadrilateral, order_corners, select_quadrilateral};
use crate::scan::homography::Homography;
use crate::scan::warp::warp_perspective;

/// Attached to results whose confidence is below the warning threshold.
pub const LOW_CONFIDENCE_WARNING: &str = "The document boundary could not be detected reliably. \
     The page may be cropped or still skewed; please check the result.";

/// Attached when the detected corners admit no usable perspective transform.
pub const DEGENERATE_TRANSFORM_WARNING: &str = "The detected document corners are degenerate, \
     so no perspective correction could be applied.";

/// Outcome of boundary detection alone (no resampling).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Ordered corners in source pixel space.
    pub corners: Quadrilateral,
    /// Heuristic score in `[0, confidence_ceiling]`.
    pub confidence: f64,
    /// True when no contour qualified and the inset rectangle was used.
    pub fallback: bool,
}

/// A rectified page and how much to trust it.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub image: RgbaImage,
    /// Corners of the page in source pixel space, TL/TR/BR/BL.
    pub corners: Quadrilateral,
    pub confidence: f64,
    /// Human-readable note, present whenever confidence is below the
    /// configured threshold.
    pub warning: Option<String>,
    fallback: bool,
}

impl ProcessingResult {
    /// True when the page boundary was guessed rather than detected.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

/// Detects and rectifies document pages.
///
/// A `Rectifier` holds only its configuration; every call works on its own
/// buffers, so one instance can be shared across threads.
///
/// ```ignore
/// let result = Rectifier::default().rectify(&raster)?;
/// if let Some(warning) = &result.warning {
///     eprintln!("{warning}");
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Rectifier {
    config: RectifyConfig,
}

impl Rectifier {
    // -- Construction ---------------------------------------------------------

    /// Create a rectifier after validating `config`.
    pub fn new(config: RectifyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RectifyConfig {
        &self.config
    }

    // -- Detection ------------------------------------------------------------

    /// Locate the page boundary (edge pipeline, tracing, geometry).
    ///
    /// Never fails for a non-empty raster: when nothing qualifies, the inset
    /// fallback rectangle is returned at the fallback confidence.
    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    pub fn detect(&self, raster: &RgbaImage) -> Result<Detection> {
        validate_raster(raster)?;
        let (width, height) = raster.dimensions();
        let config = &self.config;

        let mask = detect_edges(raster, config);
        let contours = trace_regions(&mask, config.min_contour_pixels);
        drop(mask);

        let (candidate, fallback) = match select_quadrilateral(&contours, width, height, config) {
            Some(candidate) => (candidate, false),
            None => {
                warn!(
                    contours = contours.len(),
                    "No document quadrilateral found; using inset fallback"
                );
                (fallback_quadrilateral(width, height, config), true)
            }
        };

        let corners = order_corners(candidate.corners, config.corner_ordering);
        let confidence = candidate.score.min(config.confidence_ceiling).max(0.0);
        debug!(?corners, confidence, fallback, "Document boundary located");
        Ok(Detection {
            corners,
            confidence,
            fallback,
        })
    }

    // -- Rectification --------------------------------------------------------

    /// Run the full pipeline: detect the page and warp it upright.
    ///
    /// Fails only with [`BlattwerkError::InvalidInput`] (empty raster or an
    /// unusable fixed output size).
    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    pub fn rectify(&self, raster: &RgbaImage) -> Result<ProcessingResult> {
        let detection = self.detect(raster)?;
        let (out_w, out_h) = self.output_dimensions(raster, &detection.corners)?;

        let homography =
            Homography::rectangle_to_quad(out_w as f64, out_h as f64, &detection.corners);
        Ok(self.render(raster, &detection, &homography, out_w, out_h))
    }

    /// Resample the detected page through `homography` into an
    /// `out_w` x `out_h` raster and attach the warning, if any.
    ///
    /// A non-finite transform yields a blank raster at confidence 0.
    fn render(
        &self,
        raster: &RgbaImage,
        detection: &Detection,
        homography: &Homography,
        out_w: u32,
        out_h: u32,
    ) -> ProcessingResult {
        let (image, confidence, message) = if homography.is_finite() {
            let image = warp_perspective(raster, homography, out_w, out_h);
            (image, detection.confidence, LOW_CONFIDENCE_WARNING)
        } else {
            warn!(corners = ?detection.corners, "Perspective transform is degenerate");
            (RgbaImage::new(out_w, out_h), 0.0, DEGENERATE_TRANSFORM_WARNING)
        };

        let warning = (confidence < self.config.warning_threshold).then(|| message.to_string());
        info!(
            out_w,
            out_h,
            confidence,
            fallback = detection.fallback,
            warned = warning.is_some(),
            "Document rectified"
        );

        ProcessingResult {
            image,
            corners: detection.corners,
            confidence,
            warning,
            fallback: detection.fallback,
        }
    }

    /// Rectify a raw row-major RGBA buffer, checking it against the declared
    /// dimensions first.
    pub fn rectify_raw(&self, width: u32, height: u32, data: Vec<u8>) -> Result<ProcessingResult> {
        let raster = raster_from_raw(width, height, data)?;
        self.rectify(&raster)
    }

    /// Size of the output raster for a page detected at `corners`.
    pub fn output_dimensions(
        &self,
        raster: &RgbaImage,
        corners: &Quadrilateral,
    ) -> Result<(u32, u32)> {
        let to_px = |len: f64| (len.round().max(1.0)) as u32;
        let dims = match self.config.output_size {
            OutputSize::FromCorners => (
                to_px(corners.max_horizontal_edge()),
                to_px(corners.max_vertical_edge()),
            ),
            OutputSize::MatchSource => raster.dimensions(),
            OutputSize::Fixed { width, height } => (width, height),
            OutputSize::Paper { size, dpi } => {
                let (w, h) = size.pixels_at(dpi);
                if corners.max_horizontal_edge() > corners.max_vertical_edge() {
                    (h, w)
                } else {
                    (w, h)
                }
            }
        };
        if dims.0 == 0 || dims.1 == 0 {
            return Err(BlattwerkError::InvalidInput(format!(
                "output size has zero area ({}x{})",
                dims.0, dims.1
            )));
        }
        Ok(dims)
    }
}

/// Rectify `raster` with default settings and the given warning threshold.
pub fn rectify_document(raster: &RgbaImage, warning_threshold: f64) -> Result<ProcessingResult> {
    let config = RectifyConfig {
        warning_threshold,
        ..RectifyConfig::default()
    };
    Rectifier::new(config)?.rectify(raster)
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use blattwerk_core::{CornerOrdering, PaperSize, Point};
    use image::Rgba;

    const DARK: Rgba<u8> = Rgba([30, 30, 30, 255]);
    const PAPER: Rgba<u8> = Rgba([230, 230, 230, 255]);

    /// Even-odd point-in-polygon test.
    fn inside(poly: &[(f64, f64)], x: f64, y: f64) -> bool {
        let mut hit = false;
        for i in 0..poly.len() {
            let (ax, ay) = poly[i];
            let (bx, by) = poly[(i + 1) % poly.len()];
            if (ay > y) != (by > y) && x < (bx - ax) * (y - ay) / (by - ay) + ax {
                hit = !hit;
            }
        }
        hit
    }

    /// Light page on a dark table, page corners given clockwise from top-left.
    fn page_photo(width: u32, height: u32, page: &[(f64, f64)]) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if inside(page, x as f64 + 0.5, y as f64 + 0.5) {
                PAPER
            } else {
                DARK
            }
        })
    }

    /// Resampled pixels may lose a unit or two to rounding.
    fn is_close_to(pixel: &Rgba<u8>, expected: Rgba<u8>) -> bool {
        pixel
            .0
            .iter()
            .zip(expected.0)
            .all(|(&a, b)| (a as i32 - b as i32).abs() <= 2)
    }

    fn assert_near(actual: Point, expected: (f64, f64), tol: f64) {
        assert!(
            (actual.x - expected.0).abs() <= tol && (actual.y - expected.1).abs() <= tol,
            "{actual} not within {tol}px of {expected:?}"
        );
    }

    #[test]
    fn uniform_image_falls_back() {
        let raster = RgbaImage::from_pixel(120, 90, Rgba([200, 180, 160, 255]));
        let result = Rectifier::default().rectify(&raster).unwrap();
        assert!(result.is_fallback());
        assert_eq!(result.confidence, 30.0);
        assert!(result.warning.is_some());
    }

    #[test]
    fn black_400x300_scenario() {
        let raster = RgbaImage::from_pixel(400, 300, Rgba([0, 0, 0, 255]));
        let result = rectify_document(&raster, 50.0).unwrap();
        assert_eq!(
            result.corners,
            Quadrilateral::new([
                Point::new(15.0, 15.0),
                Point::new(385.0, 15.0),
                Point::new(385.0, 285.0),
                Point::new(15.0, 285.0),
            ])
        );
        assert_eq!(result.confidence, 30.0);
        assert_eq!(result.warning.as_deref(), Some(LOW_CONFIDENCE_WARNING));
        assert_eq!(result.image.dimensions(), (370, 270));
    }

    #[test]
    fn warning_threshold_is_respected() {
        let raster = RgbaImage::from_pixel(400, 300, Rgba([0, 0, 0, 255]));
        let result = rectify_document(&raster, 20.0).unwrap();
        assert_eq!(result.confidence, 30.0);
        assert!(result.warning.is_none());
    }

    #[test]
    fn finds_page_inside_solid_border() {
        let raster = page_photo(200, 160, &[(20.0, 20.0), (180.0, 20.0), (180.0, 140.0), (20.0, 140.0)]);
        let result = Rectifier::default().rectify(&raster).unwrap();

        assert!(!result.is_fallback());
        let expected = [(20.0, 20.0), (180.0, 20.0), (180.0, 140.0), (20.0, 140.0)];
        for (corner, expected) in result.corners.corners.iter().zip(expected) {
            assert_near(*corner, expected, 3.0);
        }
        assert!(result.confidence > 50.0 && result.confidence <= 95.0);
        assert!(result.warning.is_none());

        // The rectified page is essentially all paper.
        let (w, h) = result.image.dimensions();
        assert!((158..=166).contains(&w) && (118..=126).contains(&h), "{w}x{h}");
        assert!(is_close_to(result.image.get_pixel(w / 2, h / 2), PAPER));
    }

    #[test]
    fn skewed_page_is_straightened() {
        let page = [(40.0, 30.0), (170.0, 45.0), (160.0, 140.0), (30.0, 125.0)];
        let raster = page_photo(200, 160, &page);
        let rectifier = Rectifier::default();
        let result = rectifier.rectify(&raster).unwrap();

        assert!(!result.is_fallback());
        for (corner, expected) in result.corners.corners.iter().zip(page) {
            assert_near(*corner, expected, 3.0);
        }
        // About 40% of the frame: detected, but below the warning threshold.
        assert!(result.confidence > 35.0 && result.confidence < 50.0);
        assert!(result.warning.is_some());

        let (w, h) = result.image.dimensions();
        let paper_pixels = result
            .image
            .pixels()
            .filter(|p| p.0[0] > 200 && p.0[3] > 250)
            .count();
        assert!(
            paper_pixels as f64 > 0.85 * (w * h) as f64,
            "only {paper_pixels} of {} pixels are paper",
            w * h
        );
    }

    #[test]
    fn page_filling_the_frame_is_rejected() {
        // Over 95% of the area: treated as implausible and replaced by the fallback.
        let raster = page_photo(200, 200, &[(2.0, 2.0), (198.0, 2.0), (198.0, 198.0), (2.0, 198.0)]);
        let result = Rectifier::default().rectify(&raster).unwrap();
        assert!(result.is_fallback());
        assert_eq!(result.confidence, 30.0);
    }

    #[test]
    fn detect_matches_rectify() {
        let raster = page_photo(200, 160, &[(20.0, 20.0), (180.0, 20.0), (180.0, 140.0), (20.0, 140.0)]);
        let rectifier = Rectifier::default();
        let detection = rectifier.detect(&raster).unwrap();
        let result = rectifier.rectify(&raster).unwrap();
        assert_eq!(detection.corners, result.corners);
        assert_eq!(detection.confidence, result.confidence);
        assert!(!detection.fallback);
    }

    #[test]
    fn confidence_bounds_and_warning_rule() {
        let rasters = [
            RgbaImage::from_pixel(60, 40, Rgba([10, 10, 10, 255])),
            page_photo(200, 160, &[(20.0, 20.0), (180.0, 20.0), (180.0, 140.0), (20.0, 140.0)]),
            page_photo(200, 160, &[(40.0, 30.0), (170.0, 45.0), (160.0, 140.0), (30.0, 125.0)]),
            RgbaImage::from_fn(64, 64, |x, y| {
                if (x / 8 + y / 8) % 2 == 0 { PAPER } else { DARK }
            }),
        ];
        let config = RectifyConfig {
            output_size: OutputSize::Fixed {
                width: 32,
                height: 32,
            },
            ..RectifyConfig::default()
        };
        let rectifier = Rectifier::new(config).unwrap();
        for raster in &rasters {
            let result = rectifier.rectify(raster).unwrap();
            assert!((0.0..=95.0).contains(&result.confidence));
            assert_eq!(result.warning.is_some(), result.confidence < 50.0);
            assert_eq!(result.image.dimensions(), (32, 32));
        }
    }

    #[test]
    fn paper_output_follows_page_orientation() {
        let config = RectifyConfig {
            output_size: OutputSize::Paper {
                size: PaperSize::A5,
                dpi: 20,
            },
            ..RectifyConfig::default()
        };
        let rectifier = Rectifier::new(config).unwrap();
        let (pw, ph) = PaperSize::A5.pixels_at(20);

        let landscape = page_photo(200, 160, &[(20.0, 20.0), (180.0, 20.0), (180.0, 140.0), (20.0, 140.0)]);
        assert_eq!(rectifier.rectify(&landscape).unwrap().image.dimensions(), (ph, pw));

        let portrait = page_photo(160, 200, &[(20.0, 20.0), (140.0, 20.0), (140.0, 180.0), (20.0, 180.0)]);
        assert_eq!(rectifier.rectify(&portrait).unwrap().image.dimensions(), (pw, ph));
    }

    #[test]
    fn match_source_output() {
        let config = RectifyConfig {
            output_size: OutputSize::MatchSource,
            corner_ordering: CornerOrdering::CentroidAngle,
            ..RectifyConfig::default()
        };
        let raster = RgbaImage::from_pixel(50, 30, DARK);
        let result = Rectifier::new(config).unwrap().rectify(&raster).unwrap();
        assert_eq!(result.image.dimensions(), (50, 30));
        // The fallback inset maps the output fully inside the source.
        assert!(result.image.pixels().all(|p| is_close_to(p, DARK)));
    }

    #[test]
    fn malformed_input_is_rejected() {
        let rectifier = Rectifier::default();
        assert!(matches!(
            rectifier.rectify(&RgbaImage::new(0, 10)),
            Err(BlattwerkError::InvalidInput(_))
        ));
        assert!(matches!(
            rectifier.rectify_raw(10, 10, vec![0; 399]),
            Err(BlattwerkError::InvalidInput(_))
        ));
        assert!(matches!(
            rectifier.rectify_raw(u32::MAX, u32::MAX, vec![0; 16]),
            Err(BlattwerkError::InvalidInput(_))
        ));
        let ok = rectifier.rectify_raw(10, 10, vec![0; 400]).unwrap();
        assert!(ok.is_fallback());
    }

    #[test]
    fn degenerate_transform_gives_blank_page() {
        let raster = page_photo(200, 160, &[(20.0, 20.0), (180.0, 20.0), (180.0, 140.0), (20.0, 140.0)]);
        let rectifier = Rectifier::default();
        let detection = rectifier.detect(&raster).unwrap();
        assert!(detection.confidence > 50.0);

        let broken = Homography::from_coefficients([f64::NAN; 9]);
        let result = rectifier.render(&raster, &detection, &broken, 40, 30);
        assert_eq!(result.image.dimensions(), (40, 30));
        assert!(result.image.pixels().all(|p| p.0 == [0, 0, 0, 0]));
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.warning.as_deref(), Some(DEGENERATE_TRANSFORM_WARNING));
        assert_eq!(result.corners, detection.corners);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = RectifyConfig {
            low_threshold_ratio: 2.0,
            ..RectifyConfig::default()
        };
        assert!(matches!(Rectifier::new(config), Err(BlattwerkError::Config(_))));
    }

    #[test]
    fn parallel_calls_agree() {
        let raster = page_photo(200, 160, &[(40.0, 30.0), (170.0, 45.0), (160.0, 140.0), (30.0, 125.0)]);
        let rectifier = Rectifier::default();
        let expected = rectifier.rectify(&raster).unwrap();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| rectifier.rectify(&raster).unwrap()))
                .collect();
            for handle in handles {
                let result = handle.join().unwrap();
                assert_eq!(result.corners, expected.corners);
                assert_eq!(result.image, expected.image);
            }
        });
    }
}
