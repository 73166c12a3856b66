// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Settings fixed at session creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum number of pages a single session may hold.
    pub max_pages: u32,
    /// JPEG quality of the cropped output pages (0-100).
    pub output_quality: u8,
    /// Inward offset, in image pixels, of the default crop when no document
    /// corners are detected.
    pub fallback_inset: f64,
    /// Where cropped pages are written. `None` uses the platform data dir.
    pub output_dir: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_pages: 24,
            output_quality: 100,
            fallback_inset: 100.0,
            output_dir: None,
        }
    }
}

impl ScanConfig {
    /// Load a configuration from a JSON file. Missing fields take their
    /// default values. The result is validated before it is returned.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the session cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(ScanError::InvalidConfig(
                "max pages must be a positive number".into(),
            ));
        }
        if self.output_quality > 100 {
            return Err(ScanError::InvalidConfig(
                "output quality must be a number between 0 and 100".into(),
            ));
        }
        if !self.fallback_inset.is_finite() || self.fallback_inset < 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "fallback inset must be a non-negative number, got {}",
                self.fallback_inset
            )));
        }
        Ok(())
    }
}
