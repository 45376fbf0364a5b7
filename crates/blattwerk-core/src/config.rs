// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectification configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BlattwerkError, Result};
use crate::types::OutputSize;

/// How weak edge pixels are linked to strong ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HysteresisMode {
    /// One raster-order sweep. Promotions made earlier in the sweep count as
    /// strong for pixels visited later.
    #[default]
    SinglePass,
    /// Repeat the sweep until no weak pixel is promoted.
    Converge,
}

/// How four unordered corners are assigned to TL/TR/BR/BL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerOrdering {
    /// Smallest `x + y` is top-left, largest is bottom-right, the larger
    /// `x - y` of the remaining two is top-right.
    #[default]
    SumDifference,
    /// Walk the corners by angle around their centroid, starting from the
    /// smallest `x + y`. Stable under stronger rotation.
    CentroidAngle,
}

/// Tunables for boundary detection and rectification.
///
/// Every field has a default; a JSON file only needs to name the fields it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// High edge threshold as a fraction of the strongest gradient.
    pub high_threshold_ratio: f64,
    /// Low edge threshold as a fraction of the high threshold.
    pub low_threshold_ratio: f64,
    pub hysteresis: HysteresisMode,
    /// Connected edge components must have more pixels than this.
    pub min_contour_pixels: usize,
    /// Douglas-Peucker tolerance as a fraction of the hull perimeter.
    pub simplify_epsilon: f64,
    /// Exclusive lower bound on quad area / image area.
    pub min_area_ratio: f64,
    /// Exclusive upper bound on quad area / image area.
    pub max_area_ratio: f64,
    /// Inset of the fallback rectangle as a fraction of the shorter side.
    pub fallback_margin_ratio: f64,
    pub fallback_confidence: f64,
    /// Confidence never exceeds this value.
    pub confidence_ceiling: f64,
    /// A warning is attached whenever confidence is below this value.
    pub warning_threshold: f64,
    pub corner_ordering: CornerOrdering,
    pub output_size: OutputSize,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            high_threshold_ratio: 0.15,
            low_threshold_ratio: 0.4,
            hysteresis: HysteresisMode::SinglePass,
            min_contour_pixels: 50,
            simplify_epsilon: 0.02,
            min_area_ratio: 0.1,
            max_area_ratio: 0.95,
            fallback_margin_ratio: 0.05,
            fallback_confidence: 30.0,
            confidence_ceiling: 95.0,
            warning_threshold: 50.0,
            corner_ordering: CornerOrdering::SumDifference,
            output_size: OutputSize::FromCorners,
        }
    }
}

impl RectifyConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| -> Result<()> {
            if value.is_finite() && value > 0.0 && value <= 1.0 {
                Ok(())
            } else {
                Err(BlattwerkError::Config(format!(
                    "{name} must be in (0, 1], got {value}"
                )))
            }
        };
        unit("high_threshold_ratio", self.high_threshold_ratio)?;
        unit("low_threshold_ratio", self.low_threshold_ratio)?;
        unit("simplify_epsilon", self.simplify_epsilon)?;
        unit("max_area_ratio", self.max_area_ratio)?;

        if !(0.0..self.max_area_ratio).contains(&self.min_area_ratio) {
            return Err(BlattwerkError::Config(format!(
                "min_area_ratio must be in [0, max_area_ratio), got {}",
                self.min_area_ratio
            )));
        }
        if !(0.0..0.5).contains(&self.fallback_margin_ratio) {
            return Err(BlattwerkError::Config(format!(
                "fallback_margin_ratio must be in [0, 0.5), got {}",
                self.fallback_margin_ratio
            )));
        }
        if !(0.0..=100.0).contains(&self.confidence_ceiling) {
            return Err(BlattwerkError::Config(format!(
                "confidence_ceiling must be in [0, 100], got {}",
                self.confidence_ceiling
            )));
        }
        if !(0.0..=self.confidence_ceiling).contains(&self.fallback_confidence) {
            return Err(BlattwerkError::Config(format!(
                "fallback_confidence must be in [0, confidence_ceiling], got {}",
                self.fallback_confidence
            )));
        }
        if !self.warning_threshold.is_finite() {
            return Err(BlattwerkError::Config(
                "warning_threshold must be finite".into(),
            ));
        }
        match self.output_size {
            OutputSize::Fixed { width, height } if width == 0 || height == 0 => {
                Err(BlattwerkError::Config(format!(
                    "fixed output size must be non-zero, got {width}x{height}"
                )))
            }
            OutputSize::Paper { dpi: 0, .. } => {
                Err(BlattwerkError::Config("paper dpi must be non-zero".into()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaperSize;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        RectifyConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_inherits_defaults() {
        let config: RectifyConfig = serde_json::from_str(
            r#"{ "hysteresis": "converge", "output_size": { "mode": "paper", "size": "A4", "dpi": 150 } }"#,
        )
        .unwrap();
        assert_eq!(config.hysteresis, HysteresisMode::Converge);
        assert_eq!(
            config.output_size,
            OutputSize::Paper {
                size: PaperSize::A4,
                dpi: 150
            }
        );
        assert_eq!(config.min_contour_pixels, 50);
        assert_eq!(config.warning_threshold, 50.0);
    }

    #[test]
    fn rejects_out_of_range_ratios() {
        let config = RectifyConfig {
            high_threshold_ratio: 0.0,
            ..RectifyConfig::default()
        };
        assert!(matches!(config.validate(), Err(BlattwerkError::Config(_))));

        let config = RectifyConfig {
            min_area_ratio: 0.96,
            ..RectifyConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RectifyConfig {
            fallback_confidence: 99.0,
            ..RectifyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_fixed_output() {
        let config = RectifyConfig {
            output_size: OutputSize::Fixed {
                width: 0,
                height: 10,
            },
            ..RectifyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "simplify_epsilon": 0.03, "corner_ordering": "centroid_angle" }}"#)
            .unwrap();
        let config = RectifyConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.simplify_epsilon, 0.03);
        assert_eq!(config.corner_ordering, CornerOrdering::CentroidAngle);
    }

    #[test]
    fn invalid_file_contents_are_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_area_ratio": 1.5 }}"#).unwrap();
        assert!(matches!(
            RectifyConfig::from_json_file(file.path()),
            Err(BlattwerkError::Config(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            RectifyConfig::from_json_file(file.path()),
            Err(BlattwerkError::Serialization(_))
        ));
    }
}
