//! # wslbash Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//! Author: Christi Mahu
//!

//! ## Overview
//!
//! This module groups the filesystem pieces of a run:
//!
//! - **`staging`**: The Staging File Manager. Creates the one temporary file
//!   per run that the interpreter writes into, computes its path in the
//!   execution environment's form, and guarantees it is deleted on every
//!   exit path.
//! - **`shared`**: Opens the staging file for reading in a sharing mode that
//!   never blocks, and is never blocked by, the interpreter still writing it.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::fs::{shared, staging::StagingFile};
//!
//! let staging = StagingFile::acquire(&cfg.paths)?;
//! let file = shared::open_shared_read(staging.host_path())?;
//! staging.release();
//! ```
//!

/// Non-blocking shared-read open of the staging file.
pub mod shared;
/// Staging file lifecycle (create, translate, delete).
pub mod staging;
