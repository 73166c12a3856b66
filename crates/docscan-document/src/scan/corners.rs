// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document corner lookup — the seam to an external corner detector plus the
// inset rectangle used when nothing is found.

use docscan_core::error::{Result, ScanError};
use docscan_core::types::{Point, Quad};
use image::DynamicImage;
use tracing::{debug, info, instrument};

/// Finds the document boundary in a full-resolution photo.
///
/// Implementations return `Ok(None)` when no document is visible; that is a
/// normal outcome and the caller substitutes [`fallback_quad`]. An `Err` means
/// the detector itself broke and aborts the capture.
pub trait CornerDetector: Send + Sync {
    fn detect(&self, photo: &DynamicImage) -> Result<Option<Quad>>;
}

/// Detector that never finds a document, so every page starts from the
/// fallback inset rectangle.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDetection;

impl CornerDetector for NoDetection {
    fn detect(&self, _photo: &DynamicImage) -> Result<Option<Quad>> {
        Ok(None)
    }
}

/// The crop shown when no corners are detected: the photo's own corners, each
/// moved `inset` pixels diagonally towards the centre.
///
/// Never fails. On photos smaller than twice the inset the corners cross over
/// and the quad comes out inverted; it is returned as is.
pub fn fallback_quad(width: u32, height: u32, inset: f64) -> Quad {
    let (w, h) = (width as f64, height as f64);
    Quad::new(
        Point::new(0.0, 0.0).translate(inset, inset),
        Point::new(w, 0.0).translate(-inset, inset),
        Point::new(w, h).translate(-inset, -inset),
        Point::new(0.0, h).translate(inset, -inset),
    )
}

/// Run `detector` on `photo`, substituting the fallback quad when it finds
/// nothing. Detector errors are reported as [`ScanError::Corner`].
#[instrument(skip(detector, photo), fields(width = photo.width(), height = photo.height()))]
pub fn detect_or_fallback(
    detector: &dyn CornerDetector,
    photo: &DynamicImage,
    inset: f64,
) -> Result<Quad> {
    let detected = detector.detect(photo).map_err(|err| match err {
        ScanError::Corner(_) => err,
        other => ScanError::Corner(other.to_string()),
    })?;

    match detected {
        Some(quad) => {
            debug!(?quad, "Document corners detected");
            Ok(quad)
        }
        None => {
            info!(inset, "No document corners found; using inset fallback");
            Ok(fallback_quad(photo.width(), photo.height(), inset))
        }
    }
}
