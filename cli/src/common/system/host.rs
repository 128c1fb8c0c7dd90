//! # wslbash Host Context (`common::system::host`)
//!
//! File: cli/src/common/system/host.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! A run reads two pieces of ambient process state: the current working
//! directory and the environment. Both are captured exactly once, at
//! startup, into a `HostContext` that is then passed explicitly to the
//! locator and the launcher. Tests build their own context instead of
//! mutating the real process environment.
//!
use crate::core::error::Result;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// A snapshot of environment variables used to expand path tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvTable {
    vars: BTreeMap<String, String>,
}

impl EnvTable {
    /// Captures the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped; they
    /// cannot appear in a UTF-8 candidate path anyway.
    pub fn capture() -> Self {
        Self::from_pairs(
            std::env::vars_os()
                .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?))),
        )
    }

    /// Builds a table from explicit `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Looks up a variable by name.
    ///
    /// Windows treats variable names case-insensitively (`%windir%` and
    /// `%WINDIR%` are the same variable), so on Windows hosts a
    /// case-insensitive match is tried after the exact one.
    pub fn get(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.vars.get(name) {
            return Some(value.as_str());
        }
        if cfg!(windows) {
            return self
                .vars
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str());
        }
        None
    }

    /// The user's home directory as seen by the environment, if any.
    pub fn home_dir(&self) -> Option<&str> {
        self.get("HOME").or_else(|| self.get("USERPROFILE"))
    }
}

/// Explicit host state for one wrapper run.
#[derive(Debug, Clone)]
pub struct HostContext {
    /// Host directory the interpreter is started in.
    pub working_dir: PathBuf,
    /// Environment snapshot used for token expansion.
    pub env: EnvTable,
}

impl HostContext {
    /// Captures the host context.
    ///
    /// # Arguments
    ///
    /// * `working_dir` - Optional configured working directory. When `None`,
    ///   the caller's current directory is used.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the current directory cannot be determined.
    pub fn capture(working_dir: Option<&str>) -> Result<Self> {
        let working_dir = match working_dir {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        debug!("Host working directory: {}", working_dir.display());
        Ok(Self {
            working_dir,
            env: EnvTable::capture(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_table_lookup() {
        let env = EnvTable::from_pairs([("WINDIR", r"C:\Windows"), ("HOME", "/home/me")]);
        assert_eq!(env.get("WINDIR"), Some(r"C:\Windows"));
        assert_eq!(env.get("MISSING"), None);
        assert_eq!(env.home_dir(), Some("/home/me"));
    }

    #[test]
    fn test_env_table_case_handling() {
        let env = EnvTable::from_pairs([("WINDIR", r"C:\Windows")]);
        if cfg!(windows) {
            assert_eq!(env.get("windir"), Some(r"C:\Windows"));
        } else {
            assert_eq!(env.get("windir"), None);
        }
    }

    #[test]
    fn test_capture_uses_configured_working_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_string_lossy().to_string();
        let host = HostContext::capture(Some(&dir)).unwrap();
        assert_eq!(host.working_dir, temp_dir.path());
    }
}
