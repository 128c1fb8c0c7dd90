//! # wslbash Staging Retry Schedule (`common::relay::retry`)
//!
//! File: cli/src/common/relay/retry.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Right after the interpreter exits, the host may still hold the staging
//! file open for a moment, and reads fail with sharing or lock violations.
//! This module retries such reads on an escalating backoff schedule before
//! giving up.
//!
//! ## Architecture
//!
//! - `RetryStep`: one configured stage (`attempts` retries, each preceded by
//!   a `delay_ms` pause). The default is three stages: 3 x 1s, 3 x 5s and
//!   3 x 10s, a 48 second budget in total.
//! - `RetrySchedule`: the flattened list of delays.
//! - `retry_transient`: runs a synchronous operation, sleeping through the
//!   schedule whenever it fails with an error `is_transient` accepts. Any
//!   other error, or running out of delays, becomes `WrapperError::RelayIo`.
//!
//! The sleeps are `tokio::time::sleep`, so tests drive the schedule with a
//! paused clock instead of waiting in real time.
//!
use crate::core::error::{is_transient, WrapperError};
use serde::Deserialize;
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// One stage of the backoff schedule.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RetryStep {
    /// Number of retries in this stage.
    pub attempts: u32,
    /// Pause before each retry, in milliseconds.
    pub delay_ms: u64,
}

/// Most retries a configured schedule may add up to.
pub const MAX_RETRY_ATTEMPTS: u64 = 100;

/// Longest a configured schedule may sleep in total.
pub const MAX_RETRY_BUDGET: Duration = Duration::from_secs(600);

/// The default schedule: 3 x 1s, then 3 x 5s, then 3 x 10s.
pub fn default_retry_steps() -> Vec<RetryStep> {
    vec![
        RetryStep { attempts: 3, delay_ms: 1_000 },
        RetryStep { attempts: 3, delay_ms: 5_000 },
        RetryStep { attempts: 3, delay_ms: 10_000 },
    ]
}

/// The flattened retry delays, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySchedule {
    delays: Vec<Duration>,
}

impl RetrySchedule {
    pub fn from_steps(steps: &[RetryStep]) -> Self {
        let delays = steps
            .iter()
            .flat_map(|step| {
                std::iter::repeat(Duration::from_millis(step.delay_ms)).take(step.attempts as usize)
            })
            .collect();
        Self { delays }
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Total time spent sleeping if every retry fails. Saturates instead of
    /// overflowing.
    pub fn total_budget(&self) -> Duration {
        self.delays
            .iter()
            .fold(Duration::ZERO, |total, delay| total.saturating_add(*delay))
    }

    /// The initial attempt plus one per retry.
    pub fn max_attempts(&self) -> u32 {
        self.delays.len() as u32 + 1
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self::from_steps(&default_retry_steps())
    }
}

/// Runs `op`, retrying transient failures according to `schedule`.
///
/// # Arguments
///
/// * `schedule` - Delays to sleep between attempts.
/// * `path` - The staging file, used in logs and errors.
/// * `op` - The synchronous I/O operation to attempt.
///
/// # Errors
///
/// Returns `WrapperError::RelayIo` carrying the last I/O error and the number
/// of attempts made, either immediately for a non-transient error or once
/// every delay has been used up.
pub async fn retry_transient<T, F>(
    schedule: &RetrySchedule,
    path: &Path,
    mut op: F,
) -> Result<T, WrapperError>
where
    F: FnMut() -> io::Result<T>,
{
    let mut delays = schedule.delays().iter();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let err = match op() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_transient(&err) {
            return Err(WrapperError::RelayIo {
                path: path.to_path_buf(),
                attempts,
                source: err,
            });
        }
        let Some(delay) = delays.next() else {
            return Err(WrapperError::RelayIo {
                path: path.to_path_buf(),
                attempts,
                source: err,
            });
        };
        let transient = WrapperError::TransientStagingAccess {
            path: path.to_path_buf(),
            source: err,
        };
        debug!(
            "{} (attempt {}/{}, retrying in {:?})",
            transient,
            attempts,
            schedule.max_attempts(),
            delay
        );
        tokio::time::sleep(*delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn locked() -> io::Error {
        io::Error::from(io::ErrorKind::WouldBlock)
    }

    #[test]
    fn test_default_schedule() {
        let schedule = RetrySchedule::default();
        assert_eq!(schedule.delays().len(), 9);
        assert_eq!(schedule.delays()[0], Duration::from_secs(1));
        assert_eq!(schedule.delays()[3], Duration::from_secs(5));
        assert_eq!(schedule.delays()[8], Duration::from_secs(10));
        assert_eq!(schedule.total_budget(), Duration::from_secs(48));
        assert_eq!(schedule.max_attempts(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let schedule = RetrySchedule::default();
        let mut calls = 0;
        let start = Instant::now();
        let value = retry_transient(&schedule, Path::new("staging.out"), || {
            calls += 1;
            if calls <= 2 {
                Err(locked())
            } else {
                Ok("done")
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "done");
        assert_eq!(calls, 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_schedule() {
        let schedule = RetrySchedule::default();
        let start = Instant::now();
        let result: Result<(), _> =
            retry_transient(&schedule, Path::new("staging.out"), || Err(locked())).await;

        match result {
            Err(WrapperError::RelayIo { attempts, .. }) => assert_eq!(attempts, 10),
            other => panic!("Expected RelayIo, got {other:?}"),
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= schedule.total_budget());
        assert!(elapsed < schedule.total_budget() + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_fails_immediately() {
        let schedule = RetrySchedule::default();
        let start = Instant::now();
        let result: Result<(), _> = retry_transient(&schedule, Path::new("staging.out"), || {
            Err(io::Error::from(io::ErrorKind::NotFound))
        })
        .await;

        assert!(matches!(result, Err(WrapperError::RelayIo { attempts: 1, .. })));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_custom_steps() {
        let schedule = RetrySchedule::from_steps(&[
            RetryStep { attempts: 2, delay_ms: 50 },
            RetryStep { attempts: 0, delay_ms: 999 },
            RetryStep { attempts: 1, delay_ms: 200 },
        ]);
        assert_eq!(
            schedule.delays(),
            &[
                Duration::from_millis(50),
                Duration::from_millis(50),
                Duration::from_millis(200)
            ]
        );
        assert_eq!(schedule.total_budget(), Duration::from_millis(300));
    }

    #[test]
    fn test_total_budget_saturates() {
        let schedule = RetrySchedule::from_steps(&[RetryStep {
            attempts: 3,
            delay_ms: u64::MAX,
        }]);
        assert_eq!(schedule.max_attempts(), 4);
        assert_eq!(schedule.total_budget(), Duration::MAX);
    }
}
