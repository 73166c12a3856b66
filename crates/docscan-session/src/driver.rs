// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async driver — runs the slow parts of a session (photo decoding, corner
// detection, cropping) on blocking workers without giving up the session's
// one-operation-at-a-time guarantee.

use std::path::PathBuf;

use docscan_core::error::{Result, ScanError};
use tracing::debug;

use crate::session::{CaptureSession, PageReady};

/// Owns a [`CaptureSession`] and feeds worker results back into it.
///
/// The long-running work happens on `tokio::task::spawn_blocking`; its result
/// is applied to the session only after the worker finishes, from the same
/// `&mut self` call. Because every method takes `&mut self`, no two session
/// operations can overlap and a completion can never race a user action.
pub struct SessionDriver {
    session: CaptureSession,
}

impl SessionDriver {
    pub fn new(session: CaptureSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Direct access for the quick, synchronous operations (start, cancel,
    /// accept, retake).
    pub fn session_mut(&mut self) -> &mut CaptureSession {
        &mut self.session
    }

    pub fn into_session(self) -> CaptureSession {
        self.session
    }

    /// Deliver a captured photo: decode and detect on a worker, then open the
    /// page for editing.
    pub async fn photo_captured(&mut self, path: PathBuf) -> Result<PageReady> {
        let preparer = self.session.page_preparer()?;
        debug!(path = %path.display(), "Preparing captured photo on worker");

        let prepared = tokio::task::spawn_blocking(move || preparer.prepare(&path))
            .await
            .unwrap_or_else(|err| Err(ScanError::Decode(format!("capture worker failed: {err}"))));

        self.session.on_page_prepared(prepared)
    }

    /// Finish the scan, cropping pages on a worker in page order.
    pub async fn finish(&mut self) -> Result<Vec<PathBuf>> {
        let assembler = self.session.begin_finish()?;
        debug!(pages = assembler.page_count(), "Assembling pages on worker");

        let result = tokio::task::spawn_blocking(move || assembler.run())
            .await
            .unwrap_or_else(|err| Err(ScanError::Crop(format!("finish worker failed: {err}"))));

        self.session.complete_finish(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use crate::storage::FsStorage;
    use docscan_core::config::ScanConfig;
    use docscan_core::types::ScanOutcome;
    use docscan_document::{NoDetection, PreviewBounds};
    use image::{DynamicImage, Rgb, RgbImage};
    use std::sync::Arc;

    fn driver(dir: &std::path::Path) -> SessionDriver {
        let storage = Arc::new(FsStorage::new(dir.join("out")).expect("storage"));
        let session = CaptureSession::new(ScanConfig::default(), Arc::new(NoDetection), storage)
            .expect("session");
        SessionDriver::new(session)
    }

    fn photo(dir: &std::path::Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        DynamicImage::ImageRgb8(RgbImage::from_pixel(500, 400, Rgb([220, 220, 210])))
            .save(&path)
            .expect("save");
        path
    }

    #[tokio::test]
    async fn capture_and_finish_through_workers() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut driver = driver(dir.path());
        let source = photo(dir.path(), "page.png");

        driver.session_mut().start_capture().expect("start");
        let ready = driver.photo_captured(source.clone()).await.expect("captured");
        assert_eq!((ready.width, ready.height), (500, 400));

        let bounds = PreviewBounds::fit(500, 400, 250.0, 400.0).expect("fit");
        let scale = bounds.scale_factor(400).expect("scale");
        let page = driver.session().current_page().expect("editing");
        let preview = docscan_document::scan::preview::page_corners_in_preview(page, &bounds)
            .expect("preview corners");
        driver
            .session_mut()
            .accept_current_page(&preview, &bounds, scale)
            .expect("accept");

        let outputs = driver.finish().await.expect("finish");
        assert_eq!(outputs.len(), 1);
        assert_eq!(image::image_dimensions(&outputs[0]).expect("dims"), (300, 200));
        assert!(!source.exists());
        assert!(matches!(
            driver.session().outcome(),
            Some(ScanOutcome::Completed { .. })
        ));
    }

    #[tokio::test]
    async fn photo_without_pending_capture_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut driver = driver(dir.path());
        let source = photo(dir.path(), "page.png");

        let err = driver.photo_captured(source).await.unwrap_err();
        assert!(err.is_misuse());
        assert_eq!(driver.session().state(), &SessionState::Idle);
    }

    #[tokio::test]
    async fn missing_photo_fails_the_session() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut driver = driver(dir.path());

        driver.session_mut().start_capture().expect("start");
        let err = driver
            .photo_captured(dir.path().join("never-written.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)));
        assert!(matches!(
            driver.into_session().outcome(),
            Some(ScanOutcome::Error { .. })
        ));
    }
}
