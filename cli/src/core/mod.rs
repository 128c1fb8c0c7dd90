//! # wslbash Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module aggregates the core infrastructure shared by every part of
//! the wrapper.
//!
//! ## Architecture
//!
//! - `config`: Configuration loading, path expansion and validation
//! - `error`: The wrapper's error kinds and their exit codes
//!
//! ## Usage
//!
//! ```rust
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{Result, WrapperError}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
