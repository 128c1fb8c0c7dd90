//! # wslbash Process Execution Utilities (`common::process`)
//!
//! File: cli/src/common/process/mod.rs
//! Author: Christi Mahu
//!

//! ## Overview
//!
//! This module starts the interpreter and tracks it until it exits.
//!
//! - **`command_line`**: The Command Builder. Joins the passthrough argument
//!   vector into the single command-line string the interpreter receives.
//! - **`launcher`**: The Process Launcher. Starts the interpreter with its
//!   combined stdout+stderr redirected into the staging file, exposes a
//!   liveness check and, once the child is gone, its exit code.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::process::{command_line, launcher::LaunchSpec};
//!
//! let line = command_line::build_command_line(&["-c", "echo hello"]);
//! let spec = LaunchSpec::new(bash, &line, staging.environment_path(), workdir, false);
//! let mut child = spec.launch()?;
//! let code = child.wait().await?;
//! ```
//!

/// Argument vector → single quoted command string.
pub mod command_line;
/// Interpreter start-up, liveness and exit code.
pub mod launcher;
