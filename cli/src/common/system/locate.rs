//! # wslbash Interpreter Locator (`common::system::locate`)
//!
//! File: cli/src/common/system/locate.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Finds the interpreter executable by probing an ordered list of known
//! install locations. Each candidate may contain environment tokens
//! (`${WINDIR}`, `$HOME`, `~`, or the Windows `%WINDIR%` spelling) which are
//! expanded against the run's `EnvTable`. The first candidate that exists as
//! a file wins.
//!
//! A candidate whose tokens cannot be resolved is skipped, not fatal. If no
//! candidate exists, the run is aborted with
//! `WrapperError::InterpreterNotFound` before any staging file or child
//! process is created.
//!
use crate::common::system::host::EnvTable;
use crate::core::error::WrapperError;
use std::path::PathBuf;
use tracing::{debug, info};

/// Rewrites Windows-style `%NAME%` tokens into `${NAME}` so a single
/// expander handles both spellings. A `%` that does not open a well-formed
/// token is kept as-is.
fn percent_tokens_to_dollar(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end)
                if end > 0
                    && after[..end]
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '(' || c == ')') =>
            {
                out.push_str("${");
                out.push_str(&after[..end]);
                out.push('}');
                rest = &after[end + 1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Expands environment tokens in one candidate path.
///
/// Returns `None` if the candidate refers to a variable that is not set.
pub fn expand_candidate(raw: &str, env: &EnvTable) -> Option<PathBuf> {
    let normalized = percent_tokens_to_dollar(raw);
    let expanded = shellexpand::full_with_context(
        &normalized,
        || env.home_dir(),
        |name: &str| {
            env.get(name)
                .map(|value| Some(value.to_string()))
                .ok_or(std::env::VarError::NotPresent)
        },
    );
    match expanded {
        Ok(path) => Some(PathBuf::from(path.into_owned())),
        Err(err) => {
            debug!(
                "Skipping interpreter candidate '{}': variable '{}' is not set",
                raw, err.var_name
            );
            None
        }
    }
}

/// Returns the first candidate that exists on disk.
///
/// # Arguments
///
/// * `candidates` - Ordered candidate paths, possibly containing tokens.
/// * `env` - Environment table used for token expansion.
///
/// # Errors
///
/// Returns `WrapperError::InterpreterNotFound` listing every probed location
/// (expanded where possible) when none exists.
pub fn locate_interpreter(candidates: &[String], env: &EnvTable) -> Result<PathBuf, WrapperError> {
    let mut probed = Vec::with_capacity(candidates.len());
    for raw in candidates {
        let Some(path) = expand_candidate(raw, env) else {
            probed.push(raw.clone());
            continue;
        };
        debug!("Probing interpreter candidate: {}", path.display());
        if path.is_file() {
            info!("Using interpreter: {}", path.display());
            return Ok(path);
        }
        probed.push(path.display().to_string());
    }
    Err(WrapperError::InterpreterNotFound { candidates: probed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    /// Creates `root/<name>` as an empty file.
    fn touch(root: &TempDir, name: &str) -> PathBuf {
        let path = root.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
        path
    }

    fn env_for(root: &TempDir) -> EnvTable {
        EnvTable::from_pairs([("FAKE_ROOT", root.path().to_string_lossy().to_string())])
    }

    #[test]
    fn test_percent_tokens_to_dollar() {
        assert_eq!(
            percent_tokens_to_dollar(r"%windir%\System32\bash.exe"),
            r"${windir}\System32\bash.exe"
        );
        assert_eq!(percent_tokens_to_dollar("100% sure"), "100% sure");
        assert_eq!(percent_tokens_to_dollar("%%"), "%%");
        assert_eq!(percent_tokens_to_dollar("no tokens"), "no tokens");
    }

    #[test]
    fn test_expand_candidate_variants() {
        let env = EnvTable::from_pairs([("WINDIR", "/win"), ("HOME", "/home/me")]);
        assert_eq!(
            expand_candidate("${WINDIR}/System32/bash.exe", &env),
            Some(PathBuf::from("/win/System32/bash.exe"))
        );
        assert_eq!(
            expand_candidate("%WINDIR%/sysnative/bash.exe", &env),
            Some(PathBuf::from("/win/sysnative/bash.exe"))
        );
        assert_eq!(
            expand_candidate("~/bin/bash", &env),
            Some(PathBuf::from("/home/me/bin/bash"))
        );
        assert_eq!(expand_candidate("${NOPE}/bash", &env), None);
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let root = tempdir().unwrap();
        let second = touch(&root, "b/bash");
        touch(&root, "c/bash");
        let candidates = vec![
            "${FAKE_ROOT}/a/bash".to_string(),
            "${FAKE_ROOT}/b/bash".to_string(),
            "${FAKE_ROOT}/c/bash".to_string(),
        ];
        let found = locate_interpreter(&candidates, &env_for(&root)).unwrap();
        assert_eq!(found, second);
    }

    #[test]
    fn test_unresolvable_candidate_is_skipped() {
        let root = tempdir().unwrap();
        let bash = touch(&root, "bash");
        let candidates = vec![
            "${NOT_SET_ANYWHERE}/bash".to_string(),
            "${FAKE_ROOT}/bash".to_string(),
        ];
        assert_eq!(locate_interpreter(&candidates, &env_for(&root)).unwrap(), bash);
    }

    #[test]
    fn test_directory_is_not_an_interpreter() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("bash")).unwrap();
        let candidates = vec!["${FAKE_ROOT}/bash".to_string()];
        assert!(locate_interpreter(&candidates, &env_for(&root)).is_err());
    }

    #[test]
    fn test_not_found_lists_probed_locations() {
        let root = tempdir().unwrap();
        let candidates = vec![
            "${FAKE_ROOT}/missing/bash".to_string(),
            "${ALSO_MISSING}/bash".to_string(),
        ];
        match locate_interpreter(&candidates, &env_for(&root)) {
            Err(WrapperError::InterpreterNotFound { candidates: probed }) => {
                assert_eq!(probed.len(), 2);
                assert!(probed[0].ends_with("bash"));
                assert!(!probed[0].contains("FAKE_ROOT"));
                assert_eq!(probed[1], "${ALSO_MISSING}/bash");
            }
            other => panic!("Expected InterpreterNotFound, got {other:?}"),
        }
    }
}
