// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview mapping — moving crop corners between the full-resolution photo and
// its scaled, letterboxed on-screen preview.

use docscan_core::error::{Result, ScanError};
use docscan_core::types::{Document, Point, Quad};

/// The rectangle a photo preview is drawn into, in view pixels.
///
/// The rectangle always has the photo's aspect ratio; `left`/`top` carry the
/// letterbox offset inside the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PreviewBounds {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Largest rectangle with the image's aspect ratio that fits in a
    /// `view_width` x `view_height` view, centred on the free axis.
    pub fn fit(
        image_width: u32,
        image_height: u32,
        view_width: f64,
        view_height: f64,
    ) -> Result<Self> {
        let scale = (view_width / image_width as f64).min(view_height / image_height as f64);
        check_scale(scale)?;

        let width = image_width as f64 * scale;
        let height = image_height as f64 * scale;
        Ok(Self {
            left: (view_width - width) / 2.0,
            top: (view_height - height) / 2.0,
            width,
            height,
        })
    }

    /// Preview-to-original scale: drawn height over photo height.
    pub fn scale_factor(&self, original_height: u32) -> Result<f64> {
        let scale = self.height / original_height as f64;
        check_scale(scale)?;
        Ok(scale)
    }
}

/// Map a quad from original-image space into preview space.
pub fn to_preview(quad: &Quad, bounds: &PreviewBounds, scale_factor: f64) -> Result<Quad> {
    check_scale(scale_factor)?;
    Ok(quad.map(|p| {
        Point::new(p.x * scale_factor, p.y * scale_factor).translate(bounds.left, bounds.top)
    }))
}

/// Map a quad from preview space back into original-image space. Exact
/// inverse of [`to_preview`] up to floating-point rounding.
pub fn to_original(quad: &Quad, bounds: &PreviewBounds, scale_factor: f64) -> Result<Quad> {
    check_scale(scale_factor)?;
    Ok(quad.map(|p| {
        let shifted = p.translate(-bounds.left, -bounds.top);
        Point::new(shifted.x / scale_factor, shifted.y / scale_factor)
    }))
}

/// The page's current corners as they should be drawn over `bounds`.
pub fn page_corners_in_preview(page: &Document, bounds: &PreviewBounds) -> Result<Quad> {
    let scale = bounds.scale_factor(page.original_height)?;
    to_preview(&page.corners, bounds, scale)
}

fn check_scale(scale: f64) -> Result<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(ScanError::InvalidScale(scale))
    }
}
