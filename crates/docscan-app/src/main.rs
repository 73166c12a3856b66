// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Docscan — multi-page document scan driver
//
// Entry point. Initialises logging, builds a capture session from the command
// line, feeds it the given photos as if the camera had taken them, and prints
// the scan outcome as JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use docscan_core::config::ScanConfig;
use docscan_core::error::{Result, ScanError};
use docscan_document::scan::preview::page_corners_in_preview;
use docscan_document::{NoDetection, PreviewBounds};
use docscan_session::{CaptureSession, FsStorage, PageStorage, SessionDriver, SessionState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Photos to scan, one page each, in page order
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the maximum number of pages
    #[arg(long)]
    max_pages: Option<u32>,

    /// Override the JPEG quality (0-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Directory for cropped pages
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Size of the simulated preview view, as WIDTHxHEIGHT
    #[arg(long, default_value = "1080x1920", value_parser = parse_view)]
    view: (f64, f64),
}

fn parse_view(s: &str) -> std::result::Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: f64 = w.trim().parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let h: f64 = h.trim().parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    if !(w > 0.0 && h > 0.0) {
        return Err(format!("view size must be positive, got {w}x{h}"));
    }
    Ok((w, h))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(images = args.images.len(), "Docscan starting");

    match run(args).await {
        Ok(driver) => {
            let Some(outcome) = driver.session().outcome() else {
                tracing::error!(state = driver.session().state().name(), "Scan did not end");
                return ExitCode::FAILURE;
            };
            match serde_json::to_string_pretty(&outcome) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    tracing::error!(error = %e, "Cannot serialise scan outcome");
                    return ExitCode::FAILURE;
                }
            }
            if matches!(driver.session().state(), SessionState::Failed(_)) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Scan could not run");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_json_file(path)?,
        None => ScanConfig::default(),
    };
    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }
    if let Some(quality) = args.quality {
        config.output_quality = quality;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = Some(dir.clone());
    }
    Ok(config)
}

/// Drive a full session over `args.images`. Processing failures end the
/// session in the failed state and still return the driver so its outcome can
/// be reported; only setup problems are returned as errors.
async fn run(args: Args) -> Result<SessionDriver> {
    let config = load_config(&args)?;
    let output_dir = config
        .output_dir
        .clone()
        .unwrap_or_else(FsStorage::default_location);
    let storage: Arc<dyn PageStorage> = Arc::new(FsStorage::new(&output_dir)?);
    let staging = output_dir.join(".captures");
    std::fs::create_dir_all(&staging)?;

    let session = CaptureSession::new(config, Arc::new(NoDetection), storage)?;
    let mut driver = SessionDriver::new(session);
    let (view_w, view_h) = args.view;

    for (index, image) in args.images.iter().enumerate() {
        if !driver.session().capture_enabled() {
            tracing::warn!(image = %image.display(), "Page limit reached; skipping");
            continue;
        }

        let photo = match stage_photo(image, &staging, index) {
            Ok(photo) => photo,
            Err(e) => {
                tracing::warn!(
                    image = %image.display(),
                    error = %e,
                    "Cannot stage photo; skipping"
                );
                continue;
            }
        };
        driver.session_mut().start_capture()?;

        let ready = match driver.photo_captured(photo).await {
            Ok(ready) => ready,
            Err(e) if e.is_misuse() => return Err(e),
            Err(_) => return Ok(driver),
        };

        let session = driver.session_mut();
        let Some(page) = session.current_page() else {
            return Err(ScanError::NoCurrentPage);
        };
        let bounds = PreviewBounds::fit(ready.width, ready.height, view_w, view_h)?;
        let shown = page_corners_in_preview(page, &bounds)?;
        let scale = bounds.scale_factor(ready.height)?;
        session.accept_current_page(&shown, &bounds, scale)?;
    }

    // Every image was unreadable: end the scan the way closing the camera would.
    if driver.session().pages().is_empty() {
        tracing::info!("No page was accepted; cancelling scan");
        driver.session_mut().start_capture()?;
        driver.session_mut().on_cancel_capture()?;
        return Ok(driver);
    }

    if let Err(e) = driver.finish().await {
        if e.is_misuse() {
            return Err(e);
        }
    }
    Ok(driver)
}

/// Copy `image` into the staging directory, standing in for the camera
/// writing a fresh photo. The session deletes it once it is cropped.
fn stage_photo(image: &Path, staging: &Path, index: usize) -> Result<PathBuf> {
    let ext = image
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg");
    let photo = staging.join(format!("capture_{index}.{ext}"));
    std::fs::copy(image, &photo)?;
    tracing::debug!(from = %image.display(), to = %photo.display(), "Photo staged");
    Ok(photo)
}
