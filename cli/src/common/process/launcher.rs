//! # wslbash Process Launcher (`common::process::launcher`)
//!
//! File: cli/src/common/process/launcher.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Starts the interpreter with its combined stdout+stderr stream redirected
//! into the staging file, then tracks it until it exits.
//!
//! ## Architecture
//!
//! The interpreter receives a *redirect line*:
//!
//! ```text
//! [-l] <command line> > '<staging path>' 2>&1
//! ```
//!
//! - `-l` is only present when `interpreter.load_user_profile` is set, so by
//!   default the interpreter does not source the caller's login profile.
//! - `>` truncates the (already empty) staging file, `2>&1` folds stderr in.
//!
//! How the line reaches the interpreter depends on the host:
//!
//! - **Windows**: `bash.exe` is started directly with the raw line as its
//!   command-line tail (no re-quoting by the standard library) and without a
//!   console window.
//! - **Other hosts**: `/bin/sh -c "exec '<interpreter>' <line>"`, so a POSIX
//!   shell applies the redirection. This mirrors what the WSL launcher does
//!   and lets the whole pipeline run natively in tests.
//!
//! In both cases the child is started in the configured host working
//! directory; the execution environment maps it onto its own mount, so
//! relative paths resolve to the same directory the caller is in.
//!
//! Failing to start the child at all is `WrapperError::LaunchFailed`, which
//! carries no exit code and can never be confused with one the child
//! produced.
//!
use crate::core::error::WrapperError;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Quotes a value for a POSIX shell using single quotes.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Builds the line handed to the interpreter: optional login flag, the
/// command line, and the redirection of both output streams into the
/// staging file.
pub fn redirect_line(command_line: &str, staging_path: &str, login: bool) -> String {
    let mut parts = Vec::with_capacity(3);
    if login {
        parts.push("-l".to_string());
    }
    if !command_line.is_empty() {
        parts.push(command_line.to_string());
    }
    parts.push(format!("> {} 2>&1", shell_quote(staging_path)));
    parts.join(" ")
}

/// Everything needed to start the interpreter for one run.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    interpreter: PathBuf,
    working_dir: PathBuf,
    redirect_line: String,
}

impl LaunchSpec {
    /// Creates a launch specification.
    ///
    /// # Arguments
    ///
    /// * `interpreter` - Host path of the interpreter executable.
    /// * `command_line` - The joined passthrough arguments.
    /// * `staging_path` - The staging file's path as the interpreter sees it.
    /// * `working_dir` - Host directory to start the child in.
    /// * `login` - Start the interpreter as a login shell.
    pub fn new(
        interpreter: PathBuf,
        command_line: &str,
        staging_path: &str,
        working_dir: PathBuf,
        login: bool,
    ) -> Self {
        Self {
            interpreter,
            working_dir,
            redirect_line: redirect_line(command_line, staging_path, login),
        }
    }

    #[cfg(windows)]
    fn host_command(&self) -> std::process::Command {
        use std::os::windows::process::CommandExt;
        let mut cmd = std::process::Command::new(&self.interpreter);
        cmd.raw_arg(&self.redirect_line)
            .creation_flags(CREATE_NO_WINDOW);
        cmd
    }

    #[cfg(not(windows))]
    fn host_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new("/bin/sh");
        cmd.arg("-c").arg(self.shell_script());
        cmd
    }

    #[cfg(not(windows))]
    fn shell_script(&self) -> String {
        format!(
            "exec {} {}",
            shell_quote(&self.interpreter.to_string_lossy()),
            self.redirect_line
        )
    }

    /// The full command as it will be started, for diagnostics.
    pub fn display_command(&self) -> String {
        #[cfg(windows)]
        {
            format!("{} {}", self.interpreter.display(), self.redirect_line)
        }
        #[cfg(not(windows))]
        {
            format!("/bin/sh -c {}", shell_quote(&self.shell_script()))
        }
    }

    /// Starts the interpreter.
    ///
    /// The child's stdin is inherited; its own stdout/stderr handles are
    /// discarded because everything it prints is redirected into the
    /// staging file. The child is killed if the handle is dropped before it
    /// exits.
    ///
    /// # Errors
    ///
    /// Returns `WrapperError::LaunchFailed` if the OS refuses to start the
    /// process (missing executable or working directory, permissions, ...).
    pub fn launch(&self) -> Result<LaunchedChild, WrapperError> {
        let mut cmd = self.host_command();
        cmd.current_dir(&self.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let mut cmd = Command::from(cmd);
        cmd.kill_on_drop(true);

        debug!("Launching: {}", self.display_command());
        let child = cmd.spawn().map_err(|source| WrapperError::LaunchFailed {
            interpreter: self.interpreter.clone(),
            source,
        })?;
        info!("Interpreter started (pid {:?})", child.id());
        Ok(LaunchedChild {
            child,
            started: Instant::now(),
            exit_code: None,
        })
    }
}

/// Converts an exit status into the code the wrapper exits with.
///
/// A Unix child killed by a signal reports `128 + signal`, the shell
/// convention.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(1)
}

/// A running (or finished) interpreter process.
#[derive(Debug)]
pub struct LaunchedChild {
    child: Child,
    started: Instant,
    exit_code: Option<i32>,
}

impl LaunchedChild {
    /// Liveness check: has the child exited? Never blocks.
    pub fn has_exited(&mut self) -> Result<bool, WrapperError> {
        if self.exit_code.is_some() {
            return Ok(true);
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit_code = Some(exit_code_of(status));
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(source) => Err(WrapperError::ChildWait { source }),
        }
    }

    /// Waits for the child to exit and returns its exit code.
    pub async fn wait(&mut self) -> Result<i32, WrapperError> {
        if let Some(code) = self.exit_code {
            return Ok(code);
        }
        let status = self
            .child
            .wait()
            .await
            .map_err(|source| WrapperError::ChildWait { source })?;
        let code = exit_code_of(status);
        self.exit_code = Some(code);
        Ok(code)
    }

    /// Kills the child if it is still running, then reaps it.
    pub async fn terminate(&mut self) -> Result<i32, WrapperError> {
        if !self.has_exited()? {
            if let Err(err) = self.child.start_kill() {
                warn!("Failed to kill interpreter: {}", err);
            }
        }
        self.wait().await
    }

    /// Wall-clock time since the child was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
