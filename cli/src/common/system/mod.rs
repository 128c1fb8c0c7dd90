//! # wslbash System Utilities Module (`common::system`)
//!
//! File: cli/src/common/system/mod.rs
//! Author: Christi Mahu
//!

//! ## Overview
//!
//! This module gathers everything that depends on the host system's layout
//! rather than on the interpreter run itself:
//!
//! - **`host`**: Captures the explicit host context for one run (working
//!   directory and an environment token table) so nothing downstream reads
//!   ambient process state at arbitrary points.
//! - **`locate`**: Probes the ordered list of interpreter install locations,
//!   expanding environment tokens first. First existing file wins.
//! - **`wslpath`**: Translates drive-rooted host paths into the execution
//!   environment's mount convention (`C:\Temp\x` → `/mnt/c/Temp/x`).
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::system::{host::HostContext, locate, wslpath};
//!
//! let host = HostContext::capture(cfg.launch.working_dir.as_deref())?;
//! let bash = locate::locate_interpreter(&cfg.interpreter.candidates, &host.env)?;
//! let staged = wslpath::translate_host_path(r"C:\Temp\out.txt", "/mnt/")?;
//! ```
//!

/// Explicit host context (working directory, environment token table).
pub mod host;
/// Interpreter executable discovery over an ordered candidate list.
pub mod locate;
/// Host path → execution-environment path translation.
pub mod wslpath;
