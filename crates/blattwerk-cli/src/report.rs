// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectification report — a JSON sidecar describing what was detected, keyed
// by the SHA-256 fingerprint of the source file.

use std::path::Path;

use blattwerk_core::Quadrilateral;
use blattwerk_core::error::Result;
use blattwerk_document::ProcessingResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Summary of one rectification, written next to the output image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectifyReport {
    /// Source file name as given on the command line.
    pub source: String,
    /// Lowercase hex SHA-256 of the encoded source bytes.
    pub source_sha256: String,
    /// Dimensions of the rectified output.
    pub width: u32,
    pub height: u32,
    pub corners: Quadrilateral,
    pub confidence: f64,
    pub warning: Option<String>,
    pub fallback: bool,
    pub processed_at: DateTime<Utc>,
}

impl RectifyReport {
    pub fn new(source: &Path, source_bytes: &[u8], result: &ProcessingResult) -> Self {
        Self {
            source: source.display().to_string(),
            source_sha256: hash_bytes(source_bytes),
            width: result.image.width(),
            height: result.image.height(),
            corners: result.corners,
            confidence: result.confidence,
            warning: result.warning.clone(),
            fallback: result.is_fallback(),
            processed_at: Utc::now(),
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// SHA-256 of `data` as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
