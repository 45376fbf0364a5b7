// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and their translation into a `RectifyConfig`.

use std::path::PathBuf;

use blattwerk_core::error::Result;
use blattwerk_core::{OutputSize, PaperSize, RectifyConfig};
use blattwerk_document::image::DEFAULT_JPEG_QUALITY;
use clap::{Parser, ValueEnum};

/// Straighten a photographed document page.
#[derive(Debug, Parser)]
#[command(name = "blattwerk", version, about)]
pub struct Cli {
    /// Photo of the page (JPEG, PNG, TIFF, ...). Multi-frame files use frame 1.
    pub input: PathBuf,

    /// Where to write the rectified page; the format follows the extension.
    #[arg(short, long)]
    pub output: PathBuf,

    /// JSON file with detection settings.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output width in pixels (requires --height).
    #[arg(long, requires = "height", conflicts_with_all = ["paper", "match_source"])]
    pub width: Option<u32>,

    /// Output height in pixels (requires --width).
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// Render onto a paper format instead of the detected size.
    #[arg(long, value_enum, conflicts_with = "match_source")]
    pub paper: Option<PaperArg>,

    /// Resolution used with --paper.
    #[arg(long, default_value_t = 300)]
    pub dpi: u32,

    /// Keep the source photo's dimensions.
    #[arg(long)]
    pub match_source: bool,

    /// Scale applied to the photo while decoding.
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// JPEG quality for .jpg outputs.
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Confidence below which a warning is reported.
    #[arg(long)]
    pub warning_threshold: Option<f64>,

    /// Also write the photo with the detected boundary drawn on it.
    #[arg(long)]
    pub overlay: Option<PathBuf>,

    /// Also write a JSON report of the detection.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => PaperSize::A3,
            PaperArg::A4 => PaperSize::A4,
            PaperArg::A5 => PaperSize::A5,
            PaperArg::Letter => PaperSize::Letter,
            PaperArg::Legal => PaperSize::Legal,
            PaperArg::Tabloid => PaperSize::Tabloid,
        }
    }
}

impl Cli {
    /// Settings from `--config` (or defaults), overridden by explicit flags.
    pub fn rectify_config(&self) -> Result<RectifyConfig> {
        let mut config = match &self.config {
            Some(path) => RectifyConfig::from_json_file(path)?,
            None => RectifyConfig::default(),
        };

        if let (Some(width), Some(height)) = (self.width, self.height) {
            config.output_size = OutputSize::Fixed { width, height };
        } else if let Some(paper) = self.paper {
            config.output_size = OutputSize::Paper {
                size: paper.into(),
                dpi: self.dpi,
            };
        } else if self.match_source {
            config.output_size = OutputSize::MatchSource;
        }
        if let Some(threshold) = self.warning_threshold {
            config.warning_threshold = threshold;
        }

        config.validate()?;
        Ok(config)
    }
}
