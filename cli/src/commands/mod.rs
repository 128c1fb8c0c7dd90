//! # wslbash Command Modules
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The wrapper has no subcommands: every invocation is a run of the
//! interpreter. This module holds the handler that drives one run from
//! `main.rs`.
//!
//! - `run`: Locates the interpreter, launches it against a staging file and
//!   relays its output until it exits.
//!

/// The interpreter run handler.
pub mod run;
