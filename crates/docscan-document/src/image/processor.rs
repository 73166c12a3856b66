// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decoding captured photos and encoding cropped pages.
// Operates on in-memory images using the `image` crate.

use std::path::Path;

use docscan_core::error::ScanError;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use tracing::{debug, info, instrument};

/// A single decoded image plus the codec operations the scan flow needs.
///
/// ```ignore
/// let photo = ImageProcessor::open("capture.jpg")?;
/// let (width, height) = photo.dimensions();
/// let bytes = ImageProcessor::from_dynamic(cropped).to_jpeg_bytes(80)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            ScanError::Decode(format!("failed to open {}: {}", path.as_ref().display(), err))
        })?;
        if img.width() == 0 || img.height() == 0 {
            return Err(ScanError::Decode(format!(
                "{} has no pixels",
                path.as_ref().display()
            )));
        }
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as JPEG bytes.
    ///
    /// `quality` is validated at configuration time (0-100). The JPEG encoder
    /// has no quality 0, so 0 is encoded as 1.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, ScanError> {
        let quality = quality.clamp(1, 100);
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| ScanError::Encode(format!("JPEG encoding failed: {}", err)))?;
        debug!(quality, bytes = buffer.len(), "JPEG encoded");
        Ok(buffer)
    }
}
