// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blattwerk — straighten photographed document pages.
//
// Entry point. Initialises logging, decodes the photo, runs the rectifier, and
// writes the page plus the optional overlay and report.

mod cli;
mod report;

use std::process::ExitCode;

use blattwerk_core::error::Result;
use blattwerk_document::Rectifier;
use blattwerk_document::image::codec::{decode_raster_scaled, save_raster};
use blattwerk_document::image::{OverlayStyle, highlight_quadrilateral};
use clap::Parser;

use cli::Cli;
use report::RectifyReport;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, input = %cli.input.display(), "rectification failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let rectifier = Rectifier::new(cli.rectify_config()?)?;

    let bytes = std::fs::read(&cli.input)?;
    let raster = decode_raster_scaled(&bytes, cli.scale)?;
    let result = rectifier.rectify(&raster)?;

    save_raster(&result.image, &cli.output, cli.quality)?;

    if let Some(path) = &cli.overlay {
        let overlay = highlight_quadrilateral(&raster, &result.corners, &OverlayStyle::default());
        save_raster(&overlay, path, cli.quality)?;
    }

    if let Some(path) = &cli.report {
        RectifyReport::new(&cli.input, &bytes, &result).write(path)?;
    }

    if let Some(warning) = &result.warning {
        eprintln!("warning: {warning}");
    }
    tracing::info!(
        output = %cli.output.display(),
        confidence = result.confidence,
        "Page written"
    );
    Ok(())
}
