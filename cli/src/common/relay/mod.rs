//! # wslbash Output Relay (`common::relay`)
//!
//! File: cli/src/common/relay/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The relay moves the interpreter's output from the staging file to the
//! wrapper's own stdout while the interpreter is still running, so the caller
//! sees output as it is produced rather than all at once at the end.
//!
//! ## Architecture
//!
//! The relay runs as its own tokio task next to the foreground, which waits
//! on the child. The two only meet at two points:
//!
//! 1. A `oneshot` "child has exited" signal sent by the foreground.
//! 2. The task's `JoinHandle`, which the foreground awaits for the final
//!    summary (or the fatal error).
//!
//! State machine:
//!
//! ```text
//! NotStarted -> Streaming -> Draining -> Done      (strategy = "tail")
//! NotStarted -------------> Draining -> Done      (strategy = "copy")
//! ```
//!
//! - **Streaming**: on every tick of a fixed interval, `StagingTail::poll`
//!   emits the complete lines appended since the last tick. Any error here
//!   only means "no new data this tick".
//! - **Draining**: runs once, after the exit signal. Reads everything past
//!   the cursor with the retry schedule (`retry::retry_transient`) and emits
//!   it, terminating a trailing partial line. A drain that cannot read the
//!   file ends the run with `WrapperError::RelayIo`.
//!
//! The relay cursor lives inside the task's `StagingTail` and nothing else
//! touches it.
//!
//! Each streaming poll stats, opens and reads the staging file and writes to
//! stdout, all blocking calls. They run on tokio's blocking pool
//! (`spawn_blocking`) so a slow disk or a stalled stdout reader never holds
//! up a runtime worker. The tail and the output sit behind a mutex only the
//! relay uses, so they can move between the task and the pool.
//!
//! ## Usage
//!
//! ```rust
//! let (exited_tx, exited_rx) = tokio::sync::oneshot::channel();
//! let relay = Relay::new(staging.host_path(), std::io::stdout(), options).spawn(exited_rx);
//! let code = child.wait().await?;
//! let _ = exited_tx.send(());
//! let summary = relay.await??;
//! ```
//!
pub mod retry;
pub mod tail;

use crate::core::error::{is_transient, WrapperError};
use retry::{retry_transient, RetrySchedule};
use serde::Deserialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tail::StagingTail;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

/// Lifecycle of one relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    NotStarted,
    Streaming,
    Draining,
    Done,
}

/// How the staging file is relayed.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelayStrategy {
    /// Stream lines while the child runs, then drain once.
    #[default]
    Tail,
    /// Copy the whole file after the child exits.
    Copy,
}

/// Runtime relay settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayOptions {
    pub strategy: RelayStrategy,
    pub poll_interval: Duration,
    pub retry: RetrySchedule,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            strategy: RelayStrategy::default(),
            poll_interval: Duration::from_millis(100),
            retry: RetrySchedule::default(),
        }
    }
}

/// What a finished relay did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelaySummary {
    /// Bytes taken from the staging file and written out.
    pub bytes: u64,
    /// Number of times the staging file content was read.
    pub reads: u64,
    /// Number of length checks made while streaming.
    pub polls: u64,
}

/// The staging tail together with the stream it writes to.
struct Sink<W> {
    tail: StagingTail,
    out: W,
}

impl<W: Write> Sink<W> {
    /// Emits new complete lines, returning the bytes written and the cursor.
    fn poll(&mut self) -> std::io::Result<(u64, u64)> {
        let written = self.tail.poll(&mut self.out)?;
        Ok((written, self.tail.cursor()))
    }
}

// A panicked poll leaves the tail consistent: the cursor only moves after a
// successful write.
fn lock<W>(sink: &Mutex<Sink<W>>) -> MutexGuard<'_, Sink<W>> {
    sink.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Relays one staging file into `out`.
pub struct Relay<W> {
    path: PathBuf,
    sink: Arc<Mutex<Sink<W>>>,
    options: RelayOptions,
    state: RelayState,
    bytes: u64,
    polls: u64,
}

impl<W: Write + Send + 'static> Relay<W> {
    pub fn new(path: impl Into<PathBuf>, out: W, options: RelayOptions) -> Self {
        let path = path.into();
        Self {
            sink: Arc::new(Mutex::new(Sink {
                tail: StagingTail::new(path.clone()),
                out,
            })),
            path,
            options,
            state: RelayState::NotStarted,
            bytes: 0,
            polls: 0,
        }
    }

    fn transition(&mut self, next: RelayState) {
        debug!("Relay state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Runs the relay as a background task.
    pub fn spawn(
        self,
        exited: oneshot::Receiver<()>,
    ) -> JoinHandle<Result<RelaySummary, WrapperError>> {
        tokio::spawn(self.run(exited))
    }

    /// Streams (for `tail`) until `exited` fires or its sender is dropped,
    /// then drains the file once.
    ///
    /// # Errors
    ///
    /// Returns `WrapperError::RelayIo` if the final drain cannot read the
    /// staging file within the retry schedule.
    pub async fn run(
        mut self,
        mut exited: oneshot::Receiver<()>,
    ) -> Result<RelaySummary, WrapperError> {
        match self.options.strategy {
            RelayStrategy::Tail => self.stream(&mut exited).await,
            RelayStrategy::Copy => {
                // A dropped sender also means the child is gone.
                let _ = exited.await;
            }
        }
        self.drain().await?;
        self.transition(RelayState::Done);

        let summary = RelaySummary {
            bytes: self.bytes,
            reads: lock(&self.sink).tail.reads(),
            polls: self.polls,
        };
        debug!("Relay finished: {:?}", summary);
        Ok(summary)
    }

    async fn stream(&mut self, exited: &mut oneshot::Receiver<()>) {
        self.transition(RelayState::Streaming);
        let mut ticker = interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = &mut *exited => break,
                _ = ticker.tick() => self.poll_once().await,
            }
        }
    }

    async fn poll_once(&mut self) {
        self.polls += 1;
        let sink = Arc::clone(&self.sink);
        let polled = tokio::task::spawn_blocking(move || {
            let mut sink = lock(&sink);
            sink.poll()
        })
        .await;
        match polled {
            Ok(Ok((0, _))) => {}
            Ok(Ok((written, cursor))) => {
                self.bytes += written;
                trace!("Relayed {} bytes (cursor {})", written, cursor);
            }
            Ok(Err(err)) if is_transient(&err) => {
                trace!("Staging file busy, skipping this poll: {}", err);
            }
            Ok(Err(err)) => {
                warn!("Failed to poll staging file {}: {}", self.path.display(), err);
            }
            Err(err) => {
                warn!("Staging poll task failed: {}", err);
            }
        }
    }

    // Runs once, after the child is gone; its reads stay on this task.
    async fn drain(&mut self) -> Result<(), WrapperError> {
        self.transition(RelayState::Draining);
        debug!(
            "Draining {} (up to {} attempts over {:?})",
            self.path.display(),
            self.options.retry.max_attempts(),
            self.options.retry.total_budget()
        );
        let sink = &self.sink;
        let rest = retry_transient(&self.options.retry, &self.path, || {
            lock(sink).tail.read_remaining()
        })
        .await?;

        let mut guard = lock(&self.sink);
        let Sink { tail, out } = &mut *guard;
        let written = tail
            .finish(&rest, out)
            .map_err(|source| WrapperError::RelayIo {
                path: self.path.clone(),
                attempts: 1,
                source,
            })?;
        drop(guard);
        self.bytes += written;
        Ok(())
    }
}
