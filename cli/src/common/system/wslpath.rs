//! # wslbash Path Translation (`common::system::wslpath`)
//!
//! File: cli/src/common/system/wslpath.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The interpreter runs inside WSL and sees the host's drives under a mount
//! prefix (`/mnt/` by default). The staging file is created on the host, so
//! its path has to be rewritten before it can appear in the interpreter's
//! command line:
//!
//! - `C:\Users\me\AppData\Local\Temp\wslbash-1.out` → `/mnt/c/Users/me/AppData/Local/Temp/wslbash-1.out`
//!
//! Only drive-rooted paths are supported. UNC and network paths
//! (`\\server\share`) are rejected with `WrapperError::UnsupportedPath`.
//! The translation is a pure string transform and is never applied to its
//! own output.
//!
use crate::core::config::PathsConfig;
use crate::core::error::WrapperError;
use std::path::Path;

/// Prefix Windows adds to extended-length ("verbatim") paths.
const VERBATIM_PREFIX: &str = r"\\?\";

/// Translates a drive-rooted host path into the execution environment's form.
///
/// The drive letter is lower-cased, the `X:\` root is replaced by
/// `<mount_prefix>x/`, and every remaining backslash becomes a forward slash.
///
/// # Arguments
///
/// * `host_path` - An absolute host path such as `C:\Temp\out.txt`. An
///   extended-length `\\?\C:\...` prefix is accepted and stripped.
/// * `mount_prefix` - Where the environment mounts host drives (e.g. `/mnt/`).
///
/// # Errors
///
/// Returns `WrapperError::UnsupportedPath` if the input does not start with a
/// drive letter, a colon and a separator.
pub fn translate_host_path(host_path: &str, mount_prefix: &str) -> Result<String, WrapperError> {
    let path = host_path.strip_prefix(VERBATIM_PREFIX).unwrap_or(host_path);
    let bytes = path.as_bytes();

    let rooted = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/');
    if !rooted {
        return Err(WrapperError::UnsupportedPath {
            path: host_path.to_string(),
        });
    }

    let drive = (bytes[0] as char).to_ascii_lowercase();
    // The first three bytes are ASCII, so index 3 is a char boundary.
    let rest = path[3..].replace('\\', "/");
    Ok(format!(
        "{}/{}/{}",
        mount_prefix.trim_end_matches('/'),
        drive,
        rest
    ))
}

/// Produces the path the interpreter should use for a host path.
///
/// When translation is disabled in the configuration (the default on
/// non-Windows hosts, where interpreter and caller share a filesystem), the
/// host path is returned unchanged.
pub fn environment_path(host_path: &Path, paths: &PathsConfig) -> Result<String, WrapperError> {
    let host = host_path
        .to_str()
        .ok_or_else(|| WrapperError::UnsupportedPath {
            path: host_path.to_string_lossy().into_owned(),
        })?;
    if paths.translate {
        translate_host_path(host, &paths.mount_prefix)
    } else {
        Ok(host.to_string())
    }
}
