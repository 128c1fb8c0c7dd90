//! # wslbash Command Builder (`common::process::command_line`)
//!
//! File: cli/src/common/process/command_line.rs
//! Author: Christi Mahu
//!
//! The interpreter receives its arguments as one command-line string. Each
//! argument is separated by a single space, and an argument containing a
//! space is wrapped in double quotes. Embedded double quotes are passed
//! through untouched (no escaping), so an argument that contains both a
//! space and a `"` does not survive the trip intact.
//!

/// Joins `args` into a single command-line string.
///
/// # Examples
///
/// ```rust
/// assert_eq!(build_command_line(&["-c", "echo hello"]), r#"-c "echo hello""#);
/// ```
pub fn build_command_line<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| {
            let arg = arg.as_ref();
            if arg.contains(' ') {
                format!("\"{}\"", arg)
            } else {
                arg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
