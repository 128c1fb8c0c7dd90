//! # wslbash Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//! Author: Christi Mahu
//!

//! ## Overview
//!
//! This module is the root of the building blocks a wrapper run is made of.
//! Each submodule owns one concern and none of them knows about the CLI; the
//! `commands::run` handler wires them together.
//!
//! ## Architecture
//!
//! - **`system`**: Host context capture, interpreter discovery and host path
//!   translation.
//! - **`fs`**: The staging file and the shared-read open used on it.
//! - **`process`**: Command-line building and the process launcher.
//! - **`relay`**: The output relay task that streams the staging file to
//!   stdout while the interpreter runs.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::{fs::staging::StagingFile, process, relay, system};
//!
//! let bash = system::locate::locate_interpreter(&cfg.interpreter.candidates, &host.env)?;
//! let staging = StagingFile::acquire(&cfg.paths)?;
//! let line = process::command_line::build_command_line(&args);
//! ```
//!

/// Staging file lifecycle and shared-read access.
pub mod fs;
/// Command building and interpreter process management.
pub mod process;
/// Staging file → stdout relay (tail strategy and copy fallback).
pub mod relay;
/// Host context, interpreter discovery and path translation.
pub mod system;
