// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — corner lookup, preview mapping, and perspective cropping
// of captured document pages.

pub mod corners;
pub mod crop;
pub mod preview;

pub use corners::{CornerDetector, NoDetection};
pub use crop::PerspectiveCropper;
pub use preview::PreviewBounds;
