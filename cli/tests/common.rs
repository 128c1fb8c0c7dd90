//! # wslbash Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. The tests drive
//! the compiled `wslbash` binary with `/bin/sh` standing in for the WSL
//! interpreter, selected through a config file named by `WSLBASH_CONFIG`.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// # Get wslbash Command (`wslbash_cmd`)
///
/// Creates an `assert_cmd::Command` for the compiled `wslbash` binary with
/// `RUST_LOG` cleared, so log output on stderr is predictable.
///
/// ## Panics
/// Panics if the `wslbash` binary cannot be found via `Command::cargo_bin`.
pub fn wslbash_cmd() -> Command {
    let mut cmd = Command::cargo_bin("wslbash").expect("Failed to find wslbash binary for testing");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// A scratch directory holding a config file and a staging directory.
pub struct Sandbox {
    pub root: TempDir,
    pub config_path: PathBuf,
    pub staging_dir: PathBuf,
}

impl Sandbox {
    /// Creates a sandbox whose config uses the given interpreter candidates
    /// and relay strategy.
    pub fn new(candidates: &[&str], strategy: &str) -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        let staging_dir = root.path().join("staging");
        fs::create_dir(&staging_dir).expect("Failed to create staging dir");

        let candidates = candidates
            .iter()
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", ");
        let config = format!(
            r#"
[interpreter]
candidates = [{candidates}]

[paths]
translate = false
staging_dir = '{staging}'

[relay]
strategy = "{strategy}"
poll_interval_ms = 20

[[relay.retry]]
attempts = 2
delay_ms = 20
"#,
            staging = staging_dir.display(),
        );
        let config_path = root.path().join("config.toml");
        fs::write(&config_path, config).expect("Failed to write config");

        Self {
            root,
            config_path,
            staging_dir,
        }
    }

    /// A sandbox running `/bin/sh` with the streaming relay.
    pub fn sh() -> Self {
        Self::new(&["/bin/sh"], "tail")
    }

    pub fn dir(&self) -> &Path {
        self.root.path()
    }

    /// A `wslbash` command using this sandbox's config, run from its root.
    pub fn cmd(&self) -> Command {
        let mut cmd = wslbash_cmd();
        cmd.env("WSLBASH_CONFIG", &self.config_path)
            .current_dir(self.root.path());
        cmd
    }

    /// Number of entries left in the staging directory.
    pub fn staging_entries(&self) -> usize {
        fs::read_dir(&self.staging_dir)
            .expect("Failed to read staging dir")
            .count()
    }
}
