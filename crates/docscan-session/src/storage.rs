// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Durable storage for cropped pages and captured photos.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::Utc;
use docscan_core::error::{Result, ScanError};
use tracing::{debug, instrument};
use uuid::Uuid;

/// File operations the session needs from the platform.
pub trait PageStorage: Send + Sync {
    /// Allocate a new, empty output file for the page at `page_number`.
    fn create_file(&self, page_number: usize) -> Result<PathBuf>;

    /// Replace the contents of `file` with `bytes`.
    fn write(&self, file: &Path, bytes: &[u8]) -> Result<()>;

    /// Remove `file`.
    fn delete(&self, file: &Path) -> Result<()>;
}

/// Storage rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStorage {
    dir: PathBuf,
}

impl FsStorage {
    /// Use `dir` for output files, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|err| {
            ScanError::Storage(format!("cannot create {}: {}", dir.display(), err))
        })?;
        Ok(Self { dir })
    }

    /// Conventional location for scanned pages.
    ///
    /// `$XDG_DATA_HOME/docscan/pages`, then `$HOME/.local/share/docscan/pages`,
    /// then the system temp dir. On mobile the host app should pass its own
    /// documents directory to [`FsStorage::new`] instead.
    pub fn default_location() -> PathBuf {
        let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            PathBuf::from(xdg)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".local").join("share")
        } else {
            std::env::temp_dir()
        };
        base.join("docscan").join("pages")
    }

    /// The directory files are allocated in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PageStorage for FsStorage {
    #[instrument(skip(self))]
    fn create_file(&self, page_number: usize) -> Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!("DOCUMENT_SCAN_{page_number}_{stamp}_{}.jpg", &suffix[..8]);
        let path = self.dir.join(name);

        // create_new: never hand out a file that already exists.
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|err| {
                ScanError::Storage(format!("cannot create {}: {}", path.display(), err))
            })?;

        debug!(path = %path.display(), "Output file allocated");
        Ok(path)
    }

    fn write(&self, file: &Path, bytes: &[u8]) -> Result<()> {
        std::fs::write(file, bytes).map_err(|err| {
            ScanError::Storage(format!("cannot write {}: {}", file.display(), err))
        })?;
        debug!(path = %file.display(), bytes = bytes.len(), "File written");
        Ok(())
    }

    fn delete(&self, file: &Path) -> Result<()> {
        std::fs::remove_file(file).map_err(|err| {
            ScanError::Storage(format!("cannot delete {}: {}", file.display(), err))
        })?;
        debug!(path = %file.display(), "File deleted");
        Ok(())
    }
}
