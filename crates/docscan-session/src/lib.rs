// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-session — The multi-page capture session.
//
// Holds the capture/edit/accept state machine, durable storage for output
// pages, the assembler that crops every accepted page on finish, and an async
// driver that moves slow work onto blocking workers.

pub mod assembler;
pub mod driver;
pub mod session;
pub mod storage;

pub use assembler::PageAssembler;
pub use driver::SessionDriver;
pub use session::{CaptureSession, PagePreparer, PageReady, SessionState};
pub use storage::{FsStorage, PageStorage};
