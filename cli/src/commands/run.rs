//! # wslbash Run Handler
//!
//! File: cli/src/commands/run.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module implements the one thing the wrapper does: run the
//! interpreter with the caller's arguments, relay its output to stdout as it
//! is produced, and hand back its exit code.
//!
//! ## Architecture
//!
//! The run proceeds as follows:
//!
//! 1. Locate the interpreter (`common::system::locate`). Nothing is created
//!    on disk if this fails.
//! 2. Acquire the staging file (`common::fs::staging`).
//! 3. Build the command line and launch the interpreter with its output
//!    redirected into the staging file (`common::process`).
//! 4. Spawn the relay task (`common::relay`) and wait for the child. Ctrl-C
//!    kills the child instead.
//! 5. Signal the relay that the child has exited and join it; the relay
//!    performs its final drain before returning.
//! 6. Release the staging file, whatever happened in steps 3-5.
//!
//! The returned code is the interpreter's, or `EXIT_INTERRUPTED` after
//! Ctrl-C. Wrapper failures are returned as errors carrying a
//! `WrapperError`, which `main` maps to its reserved exit code.
//!
//! ## Usage
//!
//! ```bash
//! # Run a command
//! wslbash -c "ls -la"
//!
//! # Run a script with diagnostics
//! wslbash --verbose ./build.sh --release
//! ```
//!
use crate::{
    common::{
        fs::staging::StagingFile,
        process::{command_line, launcher::LaunchSpec},
        relay::Relay,
        system::{host::HostContext, locate, wslpath},
    },
    core::{
        config::Config,
        error::{Result, EXIT_INTERRUPTED},
    },
};
use anyhow::Context;
use std::fmt::Display;
use std::io;
use std::path::Path;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

/// One wrapper invocation, as parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Arguments passed through to the interpreter, in order.
    pub args: Vec<String>,
    /// Print diagnostics to stdout.
    pub verbose: bool,
}

impl Invocation {
    /// Prints a `wslbash:` diagnostic line when verbose output is enabled.
    fn report(&self, label: &str, value: impl Display) {
        if self.verbose {
            println!("wslbash: {}: {}", label, value);
        }
    }
}

/// # Handle Run (`handle_run`)
///
/// Runs the interpreter for one invocation and returns its exit code.
///
/// ## Arguments
///
/// * `invocation` - Passthrough arguments and the verbosity flag.
/// * `cfg` - The loaded configuration.
/// * `host` - Working directory and environment captured at startup.
///
/// ## Returns
///
/// * `Result<i32>` - The interpreter's exit code (or `EXIT_INTERRUPTED`).
///
/// ## Errors
///
/// Returns an `Err` wrapping a `WrapperError` if the interpreter cannot be
/// found or started, the staging file cannot be created, or the final drain
/// of the staging file fails. The staging file is deleted in every case.
#[instrument(skip_all, fields(args = ?invocation.args))]
pub async fn handle_run(invocation: Invocation, cfg: &Config, host: &HostContext) -> Result<i32> {
    info!("Handling run...");

    let interpreter = locate::locate_interpreter(&cfg.interpreter.candidates, &host.env)?;
    let staging = StagingFile::acquire(&cfg.paths)?;

    let outcome = relay_child(&invocation, cfg, host, &interpreter, &staging).await;
    staging.release();
    outcome
}

/// Launches the interpreter and relays its output until it exits.
async fn relay_child(
    invocation: &Invocation,
    cfg: &Config,
    host: &HostContext,
    interpreter: &Path,
    staging: &StagingFile,
) -> Result<i32> {
    let line = command_line::build_command_line(&invocation.args);
    let spec = LaunchSpec::new(
        interpreter.to_path_buf(),
        &line,
        staging.environment_path(),
        host.working_dir.clone(),
        cfg.interpreter.load_user_profile,
    );

    invocation.report("interpreter", interpreter.display());
    invocation.report("command line", spec.display_command());
    match wslpath::environment_path(&host.working_dir, &cfg.paths) {
        Ok(translated) => invocation.report(
            "working directory",
            format!("{} ({})", host.working_dir.display(), translated),
        ),
        Err(_) => invocation.report("working directory", host.working_dir.display()),
    }
    invocation.report(
        "staging file",
        format!(
            "{} ({})",
            staging.host_path().display(),
            staging.environment_path()
        ),
    );

    let mut child = spec.launch()?;

    let (exited_tx, exited_rx) = oneshot::channel();
    let relay = Relay::new(staging.host_path(), io::stdout(), cfg.relay.options()).spawn(exited_rx);

    // `None` means the run was interrupted.
    let waited = tokio::select! {
        result = child.wait() => result.map(Some),
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping the interpreter.");
            child.terminate().await.map(|_| None)
        }
    };

    // The relay drains once it sees the signal, whatever the wait returned.
    if exited_tx.send(()).is_err() {
        debug!("Relay task already finished.");
    }
    let summary = relay.await.context("Output relay task failed")?;

    let code = waited?.unwrap_or(EXIT_INTERRUPTED);
    let summary = summary?;
    info!(
        "Interpreter exited with code {} after {:?} ({} bytes relayed, {} reads, {} polls)",
        code,
        child.elapsed(),
        summary.bytes,
        summary.reads,
        summary.polls
    );

    invocation.report("exit code", code);
    invocation.report(
        "wall time",
        format!("{:.3}s", child.elapsed().as_secs_f64()),
    );
    Ok(code)
}
