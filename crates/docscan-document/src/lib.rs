// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-document — Image processing for captured document pages.
//
// Provides photo decoding and JPEG encoding, the corner-detector seam with its
// inset fallback, mapping between photo and preview coordinates, and the
// perspective cropper that turns a selected quadrilateral into a flat page.

pub mod image;
pub mod scan;

// Re-export the primary items so callers can use `docscan_document::PerspectiveCropper` etc.
pub use crate::image::processor::ImageProcessor;
pub use crate::scan::corners::{CornerDetector, NoDetection};
pub use crate::scan::crop::PerspectiveCropper;
pub use crate::scan::preview::PreviewBounds;
