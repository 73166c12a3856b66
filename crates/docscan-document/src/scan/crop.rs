// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective cropping — unwarping the user's quadrilateral selection into an
// upright rectangular page, and compressing the result.

use std::path::Path;

use docscan_core::error::{Result, ScanError};
use docscan_core::types::Quad;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;

/// Quads whose corners span less than this (in square pixels) cannot be
/// unwarped.
const MIN_QUAD_SPREAD: f64 = 1.0;

/// Largest output page, in pixels. 64 megapixels is far beyond any phone
/// camera and keeps the RGBA buffer at 256 MiB.
const MAX_OUTPUT_PIXELS: u64 = 64 * 1024 * 1024;

/// Rectifies a quadrilateral region of a photo into an axis-aligned image.
///
/// The output size follows the quad itself: width is the longer of the top
/// and bottom sides, height the longer of the left and right sides. A skewed
/// selection is therefore straightened rather than stretched to a fixed size.
#[derive(Debug, Clone)]
pub struct PerspectiveCropper {
    /// Fill colour for output pixels whose pre-image falls outside the photo.
    background: Rgba<u8>,
    /// Resampling used when reading the source photo.
    interpolation: Interpolation,
}

impl Default for PerspectiveCropper {
    fn default() -> Self {
        Self {
            background: Rgba([255u8, 255, 255, 255]),
            interpolation: Interpolation::Bilinear,
        }
    }
}

impl PerspectiveCropper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the photo at `path` and crop `quad` out of it.
    ///
    /// Any failure, including an unreadable photo, is a [`ScanError::Crop`].
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn crop(&self, path: impl AsRef<Path>, quad: &Quad) -> Result<DynamicImage> {
        let photo = ImageProcessor::open(path.as_ref()).map_err(|err| match err {
            ScanError::Decode(detail) => ScanError::Crop(detail),
            other => other,
        })?;
        self.crop_image(photo.as_dynamic(), quad)
    }

    /// Crop `quad` (in `photo` pixel coordinates) out of an in-memory photo.
    pub fn crop_image(&self, photo: &DynamicImage, quad: &Quad) -> Result<DynamicImage> {
        let (out_w, out_h) = output_size(quad)?;

        let src = quad.corners().map(|p| (p.x as f32, p.y as f32));
        let dest: [(f32, f32); 4] = [
            (0.0, 0.0),                   // top-left
            (out_w as f32, 0.0),          // top-right
            (out_w as f32, out_h as f32), // bottom-right
            (0.0, out_h as f32),          // bottom-left
        ];

        // from_control_points computes the mapping from `src` to `dest`.
        let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
            ScanError::Crop("quadrilateral does not define a projective transform".into())
        })?;

        let rgba_input = photo.to_rgba8();
        let mut output = RgbaImage::new(out_w, out_h);
        warp_into(
            &rgba_input,
            &projection,
            self.interpolation,
            self.background,
            &mut output,
        );

        info!(out_w, out_h, "Perspective crop applied");
        Ok(DynamicImage::ImageRgba8(output))
    }
}

/// Output dimensions for unwarping `quad`, rounded to whole pixels.
///
/// Fails for degenerate quads (all corners on one line, a collapsed side, or
/// non-finite coordinates) and for outputs larger than the pixel budget.
/// Crossed quads are not degenerate; they crop to a distorted page.
pub fn output_size(quad: &Quad) -> Result<(u32, u32)> {
    if quad.corners().iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(ScanError::Crop("quadrilateral has non-finite corners".into()));
    }

    let spread = quad.max_corner_triangle_area();
    if spread < MIN_QUAD_SPREAD {
        return Err(ScanError::Crop(format!(
            "quadrilateral is degenerate (corners span {spread:.3} square pixels)"
        )));
    }

    let width = quad.max_horizontal_side().round();
    let height = quad.max_vertical_side().round();
    if width < 1.0 || height < 1.0 {
        return Err(ScanError::Crop(format!(
            "quadrilateral is too small to crop ({width}x{height})"
        )));
    }
    if width * height > MAX_OUTPUT_PIXELS as f64 {
        return Err(ScanError::Crop(format!(
            "quadrilateral is too large to crop ({width}x{height})"
        )));
    }

    debug!(width, height, spread, "Crop output size computed");
    Ok((width as u32, height as u32))
}

/// Compress a cropped page as JPEG at `quality` (validated by the caller).
pub fn encode(image: DynamicImage, quality: u8) -> Result<Vec<u8>> {
    ImageProcessor::from_dynamic(image).to_jpeg_bytes(quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_core::types::Point;
    use image::{GenericImageView, Rgb, RgbImage};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Quad {
        Quad::new(
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        )
    }

    /// Dark photo with a bright block from (100,100) to (300,200).
    fn photo_with_block() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(400, 300, |x, y| {
            if (100..300).contains(&x) && (100..200).contains(&y) {
                Rgb([250, 250, 250])
            } else {
                Rgb([10, 10, 10])
            }
        }))
    }

    #[test]
    fn output_size_of_axis_aligned_quad() {
        assert_eq!(output_size(&rect(50.0, 50.0, 750.0, 550.0)).expect("size"), (700, 500));
        assert_eq!(output_size(&rect(100.0, 100.0, 700.0, 500.0)).expect("size"), (600, 400));
    }

    #[test]
    fn output_size_uses_longer_sides_of_skewed_quad() {
        let q = Quad::new(
            Point::new(10.0, 0.0),
            Point::new(90.0, 0.0),
            Point::new(100.0, 50.0),
            Point::new(0.0, 50.0),
        );
        let (w, h) = output_size(&q).expect("size");
        assert_eq!(w, 100);
        assert_eq!(h, (50.0f64.hypot(10.0)).round() as u32);
    }

    #[test]
    fn degenerate_quad_is_crop_error() {
        let line = Quad::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 0.0),
        );
        assert!(matches!(output_size(&line), Err(ScanError::Crop(_))));

        let point = rect(5.0, 5.0, 5.0, 5.0);
        assert!(matches!(
            PerspectiveCropper::new().crop_image(&photo_with_block(), &point),
            Err(ScanError::Crop(_))
        ));
    }

    #[test]
    fn oversized_quad_is_crop_error_not_panic() {
        let small = DynamicImage::ImageRgb8(RgbImage::new(20, 20));
        let huge = rect(0.0, 0.0, 4.0e9, 4.0e9);
        assert!(matches!(output_size(&huge), Err(ScanError::Crop(_))));
        assert!(matches!(
            PerspectiveCropper::new().crop_image(&small, &huge),
            Err(ScanError::Crop(_))
        ));

        // Each side fits in u32 but the page does not fit the budget.
        assert!(matches!(
            output_size(&rect(0.0, 0.0, 20_000.0, 20_000.0)),
            Err(ScanError::Crop(_))
        ));
        assert!(output_size(&rect(0.0, 0.0, 8_000.0, 6_000.0)).is_ok());
    }

    #[test]
    fn crossed_quad_crops_to_a_distorted_page() {
        // Bottom corners swapped: a bowtie whose signed area cancels to zero.
        let bowtie = Quad::new(
            Point::new(100.0, 100.0),
            Point::new(300.0, 200.0),
            Point::new(300.0, 100.0),
            Point::new(100.0, 200.0),
        );
        let expected = output_size(&bowtie).expect("bowtie is not degenerate");
        let cropped = PerspectiveCropper::new()
            .crop_image(&photo_with_block(), &bowtie)
            .expect("bowtie crop");
        assert_eq!(cropped.dimensions(), expected);
    }

    #[test]
    fn axis_aligned_crop_extracts_the_block() {
        let cropped = PerspectiveCropper::new()
            .crop_image(&photo_with_block(), &rect(100.0, 100.0, 300.0, 200.0))
            .expect("crop");
        assert_eq!(cropped.dimensions(), (200, 100));

        let centre = cropped.get_pixel(100, 50);
        assert!(centre.0[0] > 200, "centre should be bright, got {:?}", centre);
    }

    #[test]
    fn skewed_quad_is_rectified() {
        // A trapezoid around the bright block; the unwarped centre stays bright.
        let q = Quad::new(
            Point::new(110.0, 100.0),
            Point::new(290.0, 105.0),
            Point::new(300.0, 195.0),
            Point::new(100.0, 200.0),
        );
        let cropped = PerspectiveCropper::new()
            .crop_image(&photo_with_block(), &q)
            .expect("crop");
        let (w, h) = cropped.dimensions();
        assert_eq!(w, output_size(&q).expect("size").0);
        assert_eq!(h, output_size(&q).expect("size").1);
        assert!(cropped.get_pixel(w / 2, h / 2).0[0] > 200);
    }

    #[test]
    fn inverted_fallback_quad_still_crops() {
        // Corners crossed over, as produced by the fallback on tiny photos.
        let q = Quad::new(
            Point::new(300.0, 200.0),
            Point::new(100.0, 200.0),
            Point::new(100.0, 100.0),
            Point::new(300.0, 100.0),
        );
        let cropped = PerspectiveCropper::new()
            .crop_image(&photo_with_block(), &q)
            .expect("mirrored crop");
        assert_eq!(cropped.dimensions(), (200, 100));
    }

    #[test]
    fn crop_from_missing_file_is_crop_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = PerspectiveCropper::new()
            .crop(dir.path().join("gone.jpg"), &rect(0.0, 0.0, 10.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, ScanError::Crop(_)), "got {err:?}");
    }

    #[test]
    fn encode_produces_jpeg() {
        let bytes = encode(photo_with_block(), 80).expect("encode");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
