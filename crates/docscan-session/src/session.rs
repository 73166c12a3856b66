// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session — the state machine behind a multi-page document scan.
//
// A session cycles through capture (waiting for the camera), editing (the user
// adjusts the crop of the newest photo), and idle (between pages) until the
// user finishes or cancels. Finishing crops every accepted page in order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docscan_core::config::ScanConfig;
use docscan_core::error::{Result, ScanError};
use docscan_core::types::{Document, Quad, ScanOutcome};
use docscan_document::image::processor::ImageProcessor;
use docscan_document::scan::corners::{CornerDetector, detect_or_fallback};
use docscan_document::scan::crop::PerspectiveCropper;
use docscan_document::scan::preview::{PreviewBounds, to_original};
use tracing::{debug, info, instrument, warn};

use crate::assembler::PageAssembler;
use crate::storage::PageStorage;

/// Where a session currently is.
#[derive(Debug, PartialEq)]
pub enum SessionState {
    /// Between pages; a new capture may be started or the scan finished.
    Idle,
    /// A capture is outstanding. Only one may be pending at a time.
    Capturing,
    /// The newest photo awaits the user's corner selection.
    Editing(Document),
    /// Accepted pages are being cropped and stored.
    Finishing,
    /// All pages were written; holds the output files in page order.
    Completed(Vec<PathBuf>),
    /// The user left before accepting any page.
    Cancelled,
    /// The session stopped on an error; holds its message.
    Failed(String),
}

impl SessionState {
    /// Short lowercase name, used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Capturing => "capturing",
            Self::Editing(_) => "editing",
            Self::Finishing => "finishing",
            Self::Completed(_) => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether the session has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Cancelled | Self::Failed(_))
    }
}

/// A freshly captured page, ready for the crop editor.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReady {
    /// Index the page will have once accepted.
    pub page_index: usize,
    pub width: u32,
    pub height: u32,
    /// Detected (or fallback) corners in original-image space.
    pub corners: Quad,
    /// True when this is the last page the session can hold; the UI should
    /// stop offering "add another page".
    pub is_last_page: bool,
}

/// Decodes a captured photo and finds its corners, detached from the session
/// so the work can run on a worker thread.
pub struct PagePreparer {
    detector: Arc<dyn CornerDetector>,
    inset: f64,
}

impl PagePreparer {
    /// Build the page for the photo at `path`.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn prepare(&self, path: &Path) -> Result<Document> {
        let photo = ImageProcessor::open(path)?;
        let (width, height) = photo.dimensions();
        let corners = detect_or_fallback(self.detector.as_ref(), photo.as_dynamic(), self.inset)?;
        Ok(Document::new(path.to_path_buf(), width, height, corners))
    }
}

/// State machine for one multi-page scan.
///
/// Every mutating operation takes `&mut self`, so operations are serialised by
/// construction. Misuse (calling an operation in the wrong state) returns an
/// error and leaves the state as it was; a processing failure moves the
/// session to [`SessionState::Failed`].
pub struct CaptureSession {
    config: ScanConfig,
    state: SessionState,
    pages: Vec<Document>,
    detector: Arc<dyn CornerDetector>,
    cropper: PerspectiveCropper,
    storage: Arc<dyn PageStorage>,
}

impl CaptureSession {
    /// Create an idle session. The configuration is validated here and
    /// trusted afterwards.
    pub fn new(
        config: ScanConfig,
        detector: Arc<dyn CornerDetector>,
        storage: Arc<dyn PageStorage>,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            max_pages = config.max_pages,
            quality = config.output_quality,
            "Capture session created"
        );
        Ok(Self {
            config,
            state: SessionState::Idle,
            pages: Vec::new(),
            detector,
            cropper: PerspectiveCropper::new(),
            storage,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Accepted pages, in capture order.
    pub fn pages(&self) -> &[Document] {
        &self.pages
    }

    /// The page being edited, if any.
    pub fn current_page(&self) -> Option<&Document> {
        match &self.state {
            SessionState::Editing(page) => Some(page),
            _ => None,
        }
    }

    fn max_pages(&self) -> usize {
        self.config.max_pages as usize
    }

    /// Whether the UI should offer capturing another page.
    ///
    /// Counts the page under edit, so this turns false as soon as the last
    /// allowed photo has been taken.
    pub fn capture_enabled(&self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        let in_progress = usize::from(self.current_page().is_some());
        self.pages.len() + in_progress < self.max_pages()
    }

    /// The result for the caller of the scan flow, once the session has ended.
    pub fn outcome(&self) -> Option<ScanOutcome> {
        match &self.state {
            SessionState::Completed(outputs) => Some(ScanOutcome::Completed {
                cropped_image_results: outputs.clone(),
            }),
            SessionState::Cancelled => Some(ScanOutcome::Cancelled),
            SessionState::Failed(message) => Some(ScanOutcome::Error {
                error: message.clone(),
            }),
            _ => None,
        }
    }

    // -- Capture --------------------------------------------------------------

    /// Mark a capture as outstanding.
    pub fn start_capture(&mut self) -> Result<()> {
        self.expect_idle("start a capture")?;
        if self.pages.len() >= self.max_pages() {
            return Err(ScanError::CaptureUnavailable {
                max_pages: self.max_pages(),
            });
        }
        debug!(pages = self.pages.len(), "Capture started");
        self.state = SessionState::Capturing;
        Ok(())
    }

    /// Detached decode-and-detect step for the outstanding capture.
    pub fn page_preparer(&self) -> Result<PagePreparer> {
        self.expect_capturing("process a captured photo")?;
        Ok(PagePreparer {
            detector: Arc::clone(&self.detector),
            inset: self.config.fallback_inset,
        })
    }

    /// Handle a photo written by the camera: decode it, find its corners, and
    /// open it for editing.
    pub fn on_photo_captured(&mut self, path: impl AsRef<Path>) -> Result<PageReady> {
        let prepared = self.page_preparer()?.prepare(path.as_ref());
        self.on_page_prepared(prepared)
    }

    /// Apply the result of a [`PagePreparer`] run to the session.
    pub fn on_page_prepared(&mut self, prepared: Result<Document>) -> Result<PageReady> {
        self.expect_capturing("process a captured photo")?;

        let page = match prepared {
            Ok(page) => page,
            Err(err) => return Err(self.fail(err)),
        };

        let ready = PageReady {
            page_index: self.pages.len(),
            width: page.original_width,
            height: page.original_height,
            corners: page.corners,
            is_last_page: self.pages.len() + 1 == self.max_pages(),
        };
        info!(
            page_index = ready.page_index,
            width = ready.width,
            height = ready.height,
            is_last_page = ready.is_last_page,
            "Page ready for editing"
        );
        self.state = SessionState::Editing(page);
        Ok(ready)
    }

    /// The camera was closed without a photo.
    ///
    /// Before any page is accepted this cancels the whole scan; afterwards it
    /// just returns to idle and keeps the accepted pages.
    pub fn on_cancel_capture(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle | SessionState::Capturing => {}
            ref other => {
                return Err(ScanError::InvalidState {
                    operation: "cancel a capture",
                    state: other.name(),
                });
            }
        }

        if self.pages.is_empty() {
            info!("Capture cancelled before any page was accepted; cancelling scan");
            self.state = SessionState::Cancelled;
        } else {
            debug!(pages = self.pages.len(), "Capture cancelled; keeping accepted pages");
            self.state = SessionState::Idle;
        }
        Ok(())
    }

    // -- Editing --------------------------------------------------------------

    /// Accept the current page with the user's corners, given in preview
    /// space, and append it to the page list.
    #[instrument(skip(self, preview_quad, bounds))]
    pub fn accept_current_page(
        &mut self,
        preview_quad: &Quad,
        bounds: &PreviewBounds,
        scale_factor: f64,
    ) -> Result<()> {
        let mut page = self.take_current_page("accept the current page")?;

        match to_original(preview_quad, bounds, scale_factor) {
            Ok(corners) => page.corners = corners,
            Err(err) => {
                self.state = SessionState::Editing(page);
                return Err(err);
            }
        }

        debug!(page_index = self.pages.len(), corners = ?page.corners, "Page accepted");
        self.pages.push(page);
        Ok(())
    }

    /// Throw the current photo away and return to idle.
    pub fn retake_current_page(&mut self) -> Result<()> {
        let page = self.take_current_page("retake the current page")?;
        if let Err(err) = self.storage.delete(&page.original_photo_path) {
            return Err(self.fail(err));
        }
        info!(path = %page.original_photo_path.display(), "Page discarded for retake");
        Ok(())
    }

    // -- Finishing ------------------------------------------------------------

    /// Crop, encode, and store every accepted page. Returns the output files
    /// in page order. Finishing with no pages is allowed.
    pub fn finish(&mut self) -> Result<Vec<PathBuf>> {
        let assembler = self.begin_finish()?;
        let result = assembler.run();
        self.complete_finish(result)
    }

    /// Accept the current page, then finish.
    pub fn accept_and_finish(
        &mut self,
        preview_quad: &Quad,
        bounds: &PreviewBounds,
        scale_factor: f64,
    ) -> Result<Vec<PathBuf>> {
        self.accept_current_page(preview_quad, bounds, scale_factor)?;
        self.finish()
    }

    /// Hand the accepted pages to an assembler and mark the session as
    /// finishing. Pair with [`CaptureSession::complete_finish`].
    pub fn begin_finish(&mut self) -> Result<PageAssembler> {
        self.expect_idle("finish")?;
        let pages = std::mem::take(&mut self.pages);
        info!(pages = pages.len(), "Finishing scan");
        self.state = SessionState::Finishing;
        Ok(PageAssembler::new(
            pages,
            self.cropper.clone(),
            Arc::clone(&self.storage),
            self.config.output_quality,
        ))
    }

    /// Record the result of an assembler run.
    pub fn complete_finish(&mut self, result: Result<Vec<PathBuf>>) -> Result<Vec<PathBuf>> {
        if self.state != SessionState::Finishing {
            return Err(ScanError::InvalidState {
                operation: "complete finishing",
                state: self.state.name(),
            });
        }
        match result {
            Ok(outputs) => {
                info!(pages = outputs.len(), "Scan completed");
                self.state = SessionState::Completed(outputs.clone());
                Ok(outputs)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    // -- Helpers --------------------------------------------------------------

    fn expect_idle(&self, operation: &'static str) -> Result<()> {
        match self.state {
            SessionState::Idle => Ok(()),
            ref other => Err(ScanError::InvalidState {
                operation,
                state: other.name(),
            }),
        }
    }

    fn expect_capturing(&self, operation: &'static str) -> Result<()> {
        match self.state {
            SessionState::Capturing => Ok(()),
            ref other => Err(ScanError::InvalidState {
                operation,
                state: other.name(),
            }),
        }
    }

    /// Move the page under edit out of the state, leaving the session idle.
    fn take_current_page(&mut self, operation: &'static str) -> Result<Document> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Editing(page) => Ok(page),
            other => {
                let err = match other {
                    SessionState::Idle | SessionState::Capturing => ScanError::NoCurrentPage,
                    ref terminal => ScanError::InvalidState {
                        operation,
                        state: terminal.name(),
                    },
                };
                self.state = other;
                Err(err)
            }
        }
    }

    /// End the session on `err` and hand the error back for propagation.
    fn fail(&mut self, err: ScanError) -> ScanError {
        warn!(error = %err, state = self.state.name(), "Scan session failed");
        self.state = SessionState::Failed(err.to_string());
        err
    }
}
