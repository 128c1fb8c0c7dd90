//! # wslbash Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the error kinds a single wrapper run can hit and the
//! policy for turning them into process exit codes. The wrapper's own exit
//! code normally mirrors the interpreter's, so every wrapper failure maps to
//! a reserved code that a caller can tell apart from anything the
//! interpreter reported itself.
//!
//! ## Architecture
//!
//! The error system consists of three pieces:
//! - `WrapperError`: a `thiserror` enum with one variant per failure kind.
//! - `Result<T>`: an alias for `anyhow::Result<T>` used by the application
//!   plumbing (config loading, the top-level run) so context can be attached.
//! - `is_transient`: classifies raw I/O errors on the staging file into
//!   "try again" (sharing/lock contention) and "give up".
//!
//! Component APIs (locator, translator, staging, launcher, relay) return
//! `std::result::Result<T, WrapperError>` so the caller can match on the
//! kind. Only `InterpreterNotFound`, `LaunchFailed`, `ChildWait`, `Config`,
//! `Usage`, `UnsupportedPath`, `StagingCreate` and an exhausted `RelayIo` end
//! a run early.
//! `TransientStagingAccess` is absorbed by the retry schedule and `Cleanup`
//! is only ever logged.
//!
//! ## Examples
//!
//! ```rust
//! match err.downcast_ref::<WrapperError>() {
//!     Some(wrapper_err) => std::process::exit(wrapper_err.exit_code()),
//!     None => std::process::exit(EXIT_INTERNAL),
//! }
//! ```
//!
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code used after Ctrl-C stopped the interpreter (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

// Reserved exit codes. Windows exit codes are 32 bits wide, so the wrapper
// uses a band no interpreter status maps to. Unix statuses are truncated to
// 8 bits, so the top of the range (240-246) is used there instead. Those
// values are also ordinary statuses an interpreter can exit with; on Unix a
// code in the band is only unambiguous together with the stderr diagnostic.
#[cfg(windows)]
const EXIT_BASE: i32 = 0x5742_0000;
#[cfg(not(windows))]
const EXIT_BASE: i32 = 240;

/// Exit code for failures that carry no `WrapperError` (unexpected internal errors).
pub const EXIT_INTERNAL: i32 = EXIT_BASE;

/// Custom error type for a wrapper run.
#[derive(Error, Debug)]
pub enum WrapperError {
    #[error("Interpreter not found. Looked in: {}", .candidates.join(", "))]
    InterpreterNotFound { candidates: Vec<String> },

    #[error("Failed to launch interpreter '{}': {source}", .interpreter.display())]
    LaunchFailed {
        interpreter: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Staging file '{}' is temporarily inaccessible: {source}", .path.display())]
    TransientStagingAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to relay output from staging file '{}' after {attempts} attempt(s): {source}", .path.display())]
    RelayIo {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create a staging file in '{}': {source}", .dir.display())]
    StagingCreate {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to delete staging file '{}': {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Lost track of the interpreter process: {source}")]
    ChildWait {
        #[source]
        source: io::Error,
    },

    #[error("Path '{path}' is not a drive-rooted host path (expected e.g. C:\\dir\\file)")]
    UnsupportedPath { path: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid arguments: {0}")]
    Usage(String),
}

impl WrapperError {
    /// Returns the reserved process exit code for this kind of failure.
    ///
    /// `TransientStagingAccess` and `Cleanup` never end a run on their own,
    /// but they still get a code so the mapping is total.
    pub fn exit_code(&self) -> i32 {
        let offset = match self {
            Self::InterpreterNotFound { .. } => 1,
            Self::LaunchFailed { .. } => 2,
            Self::TransientStagingAccess { .. }
            | Self::RelayIo { .. }
            | Self::StagingCreate { .. } => 3,
            Self::ChildWait { .. } => 4,
            Self::Config(_) | Self::UnsupportedPath { .. } => 5,
            Self::Usage(_) => 6,
            Self::Cleanup { .. } => 0,
        };
        EXIT_BASE + offset
    }
}

/// Type alias for Result using anyhow::Error for the application plumbing.
pub type Result<T> = anyhow::Result<T>;

/// Returns `true` if an I/O error on the staging file is worth retrying.
///
/// Sharing and lock violations are what Windows reports while another
/// process (or the OS, just after the writer exits) still holds the file.
pub fn is_transient(err: &io::Error) -> bool {
    // ERROR_SHARING_VIOLATION (32) and ERROR_LOCK_VIOLATION (33).
    #[cfg(windows)]
    {
        if matches!(err.raw_os_error(), Some(32) | Some(33)) {
            return true;
        }
    }
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::PermissionDenied
    )
}
