// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Docscan.

use thiserror::Error;

/// Top-level error type for all Docscan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Capture errors --
    #[error("unable to decode photo: {0}")]
    Decode(String),

    #[error("unable to get document corners: {0}")]
    Corner(String),

    #[error("no page is currently being edited")]
    NoCurrentPage,

    #[error("capture unavailable: the session already holds {max_pages} page(s)")]
    CaptureUnavailable { max_pages: usize },

    #[error("cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    // -- Geometry errors --
    #[error("invalid preview scale factor: {0}")]
    InvalidScale(f64),

    // -- Output errors --
    #[error("unable to crop image: {0}")]
    Crop(String),

    #[error("unable to encode cropped image: {0}")]
    Encode(String),

    #[error("unable to save cropped image: {0}")]
    Storage(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// Whether this error comes from calling an operation at the wrong time,
    /// as opposed to a failure while processing a photo or page.
    ///
    /// Misuse errors leave the session state untouched; processing errors end it.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Self::NoCurrentPage | Self::CaptureUnavailable { .. } | Self::InvalidState { .. }
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
