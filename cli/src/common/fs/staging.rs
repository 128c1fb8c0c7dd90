//! # wslbash Staging File Manager (`common::fs::staging`)
//!
//! File: cli/src/common/fs/staging.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The interpreter and the wrapper do not share a stdout pipe, so the
//! interpreter's output is staged through one file per run that both sides
//! can reach: the wrapper under its host path, the interpreter under the
//! translated path.
//!
//! ## Lifecycle
//!
//! 1. `StagingFile::acquire` creates a new, empty, uniquely named file
//!    (`wslbash-XXXXXX.out`) in the host temp directory, closes the handle
//!    and computes the environment path.
//! 2. The interpreter truncates and appends to it; the relay reads it.
//! 3. `StagingFile::release` deletes it. `release` consumes the value, so it
//!    runs at most once. If the run unwinds before reaching `release`, the
//!    underlying `tempfile::TempPath` deletes the file on drop.
//!
//! Deletion failures are logged and never change the run's exit code.
//!
use crate::common::system::wslpath;
use crate::core::config::PathsConfig;
use crate::core::error::WrapperError;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// The staging file for one run.
#[derive(Debug)]
pub struct StagingFile {
    path: TempPath,
    environment_path: String,
}

impl StagingFile {
    /// Creates the staging file and computes its execution-environment path.
    ///
    /// # Arguments
    ///
    /// * `paths` - Path settings: staging directory override, whether to
    ///   translate, and the mount prefix.
    ///
    /// # Errors
    ///
    /// * `WrapperError::StagingCreate` - The file could not be created.
    /// * `WrapperError::UnsupportedPath` - The host path cannot be translated.
    ///   The file that was just created is deleted before returning.
    pub fn acquire(paths: &PathsConfig) -> Result<Self, WrapperError> {
        let dir = paths
            .staging_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        let file = tempfile::Builder::new()
            .prefix("wslbash-")
            .suffix(".out")
            .tempfile_in(&dir)
            .map_err(|source| WrapperError::StagingCreate {
                dir: dir.clone(),
                source,
            })?;
        // Only the path is kept; the interpreter opens the file itself.
        let path = file.into_temp_path();
        let environment_path = wslpath::environment_path(&path, paths)?;

        debug!(
            "Created staging file {} (environment path: {})",
            path.display(),
            environment_path
        );
        Ok(Self {
            path,
            environment_path,
        })
    }

    /// The file's path on the host.
    pub fn host_path(&self) -> &Path {
        &self.path
    }

    /// The file's path as the interpreter sees it.
    pub fn environment_path(&self) -> &str {
        &self.environment_path
    }

    /// Deletes the staging file, logging (never returning) a failure.
    pub fn release(self) {
        match self.try_release() {
            Ok(()) => debug!("Staging file released."),
            Err(err) => warn!("{}", err),
        }
    }

    /// Deletes the staging file. A file that is already gone counts as released.
    fn try_release(self) -> Result<(), WrapperError> {
        let path = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WrapperError::Cleanup { path, source }),
        }
    }
}
