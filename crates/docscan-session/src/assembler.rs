// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result assembly — cropping, encoding, and storing every accepted page in
// capture order once the user is done.

use std::path::PathBuf;
use std::sync::Arc;

use docscan_core::error::Result;
use docscan_core::types::Document;
use docscan_document::PerspectiveCropper;
use docscan_document::scan::crop::encode;
use tracing::{info, instrument, warn};

use crate::storage::PageStorage;

/// Turns the accepted pages of a finished session into output files.
///
/// Pages are processed one at a time in capture order and the run stops at
/// the first failure. Work done before the failure is not rolled back: source
/// photos of pages already cropped stay deleted, their output files stay on
/// disk, and the photos of pages never reached are left untouched.
pub struct PageAssembler {
    pages: Vec<Document>,
    cropper: PerspectiveCropper,
    storage: Arc<dyn PageStorage>,
    quality: u8,
}

impl PageAssembler {
    pub fn new(
        pages: Vec<Document>,
        cropper: PerspectiveCropper,
        storage: Arc<dyn PageStorage>,
        quality: u8,
    ) -> Self {
        Self {
            pages,
            cropper,
            storage,
            quality,
        }
    }

    /// Number of pages this run will process.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Process every page. Returns the output files in page order, or the
    /// error of the first page that failed.
    #[instrument(skip(self), fields(pages = self.pages.len(), quality = self.quality))]
    pub fn run(mut self) -> Result<Vec<PathBuf>> {
        let pages = std::mem::take(&mut self.pages);
        let mut outputs = Vec::with_capacity(pages.len());
        let mut remaining = pages.into_iter().enumerate();

        while let Some((page_number, page)) = remaining.next() {
            match self.process(page_number, &page) {
                Ok(output) => outputs.push(output),
                Err(err) => {
                    let untouched: Vec<PathBuf> =
                        remaining.by_ref().map(|(_, page)| page.original_photo_path).collect();
                    warn!(
                        page_number,
                        error = %err,
                        completed = outputs.len(),
                        untouched = ?untouched,
                        "Page failed; stopping without processing later pages"
                    );
                    return Err(err);
                }
            }
        }

        info!(pages = outputs.len(), "All pages cropped and stored");
        Ok(outputs)
    }

    /// Crop, release the source photo, encode, and store a single page.
    #[instrument(skip(self, page), fields(source = %page.original_photo_path.display()))]
    fn process(&self, page_number: usize, page: &Document) -> Result<PathBuf> {
        let cropped = self.cropper.crop(&page.original_photo_path, &page.corners)?;

        // The source photo is released as soon as its crop exists.
        self.storage.delete(&page.original_photo_path)?;

        let bytes = encode(cropped, self.quality)?;
        let output = self.storage.create_file(page_number)?;
        self.storage.write(&output, &bytes)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsStorage;
    use docscan_core::error::ScanError;
    use docscan_core::types::{Point, Quad};
    use image::{DynamicImage, Rgb, RgbImage};
    use std::path::Path;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Quad {
        Quad::new(
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        )
    }

    fn photo(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 120, 150])))
            .save(&path)
            .expect("save photo");
        path
    }

    fn page(path: PathBuf, corners: Quad) -> Document {
        Document::new(path, 200, 100, corners)
    }

    #[test]
    fn outputs_follow_page_order_and_sources_are_removed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let storage = Arc::new(FsStorage::new(dir.path().join("out")).expect("storage"));

        let first = photo(dir.path(), "first.png", 200, 100);
        let second = photo(dir.path(), "second.png", 200, 100);
        let pages = vec![
            page(first.clone(), rect(0.0, 0.0, 120.0, 80.0)),
            page(second.clone(), rect(10.0, 10.0, 60.0, 40.0)),
        ];

        let outputs = PageAssembler::new(pages, PerspectiveCropper::new(), storage, 80)
            .run()
            .expect("run");

        assert_eq!(outputs.len(), 2);
        let sizes: Vec<(u32, u32)> = outputs
            .iter()
            .map(|p| image::image_dimensions(p).expect("dimensions"))
            .collect();
        assert_eq!(sizes, vec![(120, 80), (50, 30)]);
        assert!(!first.exists());
        assert!(!second.exists());
    }

    #[test]
    fn stops_at_first_failing_page() {
        let dir = tempfile::tempdir().expect("temp dir");
        let storage = Arc::new(FsStorage::new(dir.path().join("out")).expect("storage"));

        let first = photo(dir.path(), "first.png", 200, 100);
        let second = photo(dir.path(), "second.png", 200, 100);
        let third = photo(dir.path(), "third.png", 200, 100);
        let collapsed = rect(20.0, 20.0, 20.0, 20.0);
        let pages = vec![
            page(first.clone(), rect(0.0, 0.0, 100.0, 50.0)),
            page(second.clone(), collapsed),
            page(third.clone(), rect(0.0, 0.0, 100.0, 50.0)),
        ];

        let err = PageAssembler::new(pages, PerspectiveCropper::new(), storage, 80)
            .run()
            .unwrap_err();

        assert!(matches!(err, ScanError::Crop(_)), "got {err:?}");
        assert!(!first.exists(), "first page was cropped, its photo is gone");
        assert!(second.exists(), "failed page keeps its photo");
        assert!(third.exists(), "later pages are never touched");
    }

    #[test]
    fn empty_run_yields_empty_list() {
        let dir = tempfile::tempdir().expect("temp dir");
        let storage = Arc::new(FsStorage::new(dir.path()).expect("storage"));
        let assembler = PageAssembler::new(Vec::new(), PerspectiveCropper::new(), storage, 50);
        assert_eq!(assembler.page_count(), 0);
        assert!(assembler.run().expect("run").is_empty());
    }
}
