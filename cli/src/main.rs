//! # wslbash Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `wslbash` runs the WSL bash interpreter on behalf of a caller that needs
//! a normal console process: the interpreter's output appears on the
//! wrapper's stdout while it runs, and the wrapper exits with the
//! interpreter's exit code. This file handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on the verbosity flag
//! - Loading configuration and capturing the host context
//! - Mapping the run's outcome to the process exit code
//!
//! ## Architecture
//!
//! The wrapper owns exactly one option, `--verbose`, and only as the literal
//! first argument. Clap parses that prefix alone; everything after it,
//! including `--`, `--help` or another `--verbose`, belongs to the
//! interpreter and is forwarded unchanged.
//!
//! Exit codes:
//! - the interpreter's exit code after a normal run,
//! - `130` after Ctrl-C,
//! - a reserved code per `WrapperError` kind when the wrapper itself fails,
//!   with a diagnostic on stderr. Unusable arguments are `WrapperError::Usage`
//!   rather than clap's exit code 2.
//!
//! ## Examples
//!
//! ```bash
//! # Run a command
//! wslbash -c "uname -a"
//!
//! # Run a script and show diagnostics
//! wslbash --verbose ./build.sh
//! ```
//!
use clap::Parser;
use std::ffi::OsString;
use std::io::Write;
use tracing_subscriber::{fmt, EnvFilter};

// Declare the top-level modules of the CLI crate.
mod commands; // The interpreter run handler
mod common; // Building blocks (locator, staging, launcher, relay)
mod core; // Core infrastructure (errors, config)

use crate::commands::run::{handle_run, Invocation};
use crate::common::system::host::HostContext;
use crate::core::{
    config,
    error::{Result, WrapperError, EXIT_INTERNAL},
};

/// The literal flag the wrapper owns, honored only as the first argument.
const VERBOSE_FLAG: &str = "--verbose";

/// Defines the command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "wslbash",
    about = "Runs the WSL bash interpreter and relays its output and exit code",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Print diagnostics (interpreter, command line, paths, exit code) to stdout.
    #[arg(long)]
    verbose: bool,

    /// Arguments passed to the interpreter unchanged.
    #[arg(skip)]
    args: Vec<String>,
}

impl Cli {
    /// Splits the raw argument vector into the wrapper's own flag and the
    /// passthrough arguments.
    ///
    /// Clap only ever sees the program name and, if present, a leading
    /// `--verbose`. Everything after that is forwarded as given, so `--`,
    /// a second `--verbose` or `--verbose=false` reach the interpreter.
    ///
    /// # Errors
    ///
    /// Returns `WrapperError::Usage` if clap rejects the prefix or a
    /// passthrough argument is not valid Unicode.
    fn parse_args<I, T>(raw: I) -> std::result::Result<Self, WrapperError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut raw = raw.into_iter().map(Into::into);
        let program = raw.next().unwrap_or_else(|| OsString::from("wslbash"));
        let mut rest: Vec<OsString> = raw.collect();

        let mut own = vec![program];
        if rest.first().is_some_and(|arg| arg == VERBOSE_FLAG) {
            own.push(rest.remove(0));
        }
        let mut cli =
            Cli::try_parse_from(own).map_err(|err| WrapperError::Usage(err.to_string()))?;

        cli.args = rest
            .into_iter()
            .map(|arg| {
                arg.into_string().map_err(|arg| {
                    WrapperError::Usage(format!("argument {:?} is not valid Unicode", arg))
                })
            })
            .collect::<std::result::Result<_, _>>()?;
        Ok(cli)
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let cfg = config::load_config()?;
    let host = HostContext::capture(cfg.launch.working_dir.as_deref())?;
    let invocation = Invocation {
        args: cli.args,
        verbose: cli.verbose,
    };
    handle_run(invocation, &cfg, &host).await
}

#[tokio::main]
async fn main() {
    let cli = match Cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(err.exit_code());
        }
    };
    init_logging(cli.verbose);
    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Run failed: {:?}", e);
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<WrapperError>()
                .map_or(EXIT_INTERNAL, WrapperError::exit_code)
        }
    };

    // `process::exit` skips destructors, so flush what was relayed.
    let _ = std::io::stdout().flush();
    std::process::exit(code);
}
