//! # wslbash Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module loads, expands and validates the wrapper's configuration. The
//! wrapper owns no command-line options besides `--verbose` (everything else
//! is passed to the interpreter), so all tunables live in a TOML file.
//!
//! ## Architecture
//!
//! Configuration sources (first match wins):
//! 1. The file named by the `WSLBASH_CONFIG` environment variable. It must exist.
//! 2. The per-user `config.toml` in the platform config directory
//!    (e.g. `%APPDATA%\wslbash\wslbash\config\config.toml`).
//! 3. Default values defined in the code.
//!
//! Every field has a default, so a file only needs the keys it overrides.
//! Unknown keys are rejected.
//!
//! ## Examples
//!
//! ```toml
//! [interpreter]
//! candidates = ['${WINDIR}\System32\bash.exe']
//! load_user_profile = false
//!
//! [paths]
//! translate = true
//! mount_prefix = "/mnt/"
//!
//! [launch]
//! working_dir = "~/projects"
//!
//! [relay]
//! strategy = "tail"
//! poll_interval_ms = 100
//!
//! [[relay.retry]]
//! attempts = 3
//! delay_ms = 1000
//! ```
//!
use crate::common::relay::retry::{
    default_retry_steps, RetrySchedule, RetryStep, MAX_RETRY_ATTEMPTS, MAX_RETRY_BUDGET,
};
use crate::common::relay::{RelayOptions, RelayStrategy};
use crate::core::error::{Result, WrapperError};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "WSLBASH_CONFIG";

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Where to find the interpreter and how to start it.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InterpreterConfig {
    /// Ordered install locations; the first existing one is used.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,
    /// Start the interpreter as a login shell so it sources the user's profile.
    #[serde(default)]
    pub load_user_profile: bool,
}

/// Host ↔ execution-environment path handling.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Translate host paths into the environment's mount convention.
    #[serde(default = "default_translate")]
    pub translate: bool,
    /// Where the environment mounts host drives.
    #[serde(default = "default_mount_prefix")]
    pub mount_prefix: String,
    /// Directory for staging files (defaults to the host temp directory).
    #[serde(default)]
    pub staging_dir: Option<String>,
}

/// How the child process is started.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LaunchConfig {
    /// Host working directory for the child (defaults to the caller's).
    #[serde(default)]
    pub working_dir: Option<String>,
}

/// Output relay tuning.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// `tail` streams while the child runs; `copy` copies after it exits.
    #[serde(default)]
    pub strategy: RelayStrategy,
    /// Interval between staging file length checks while streaming.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Backoff steps used when the staging file is transiently locked.
    #[serde(default = "default_retry_steps")]
    pub retry: Vec<RetryStep>,
}

fn default_candidates() -> Vec<String> {
    if cfg!(windows) {
        vec![
            r"${WINDIR}\SysWow64\bash.exe".to_string(),
            r"${WINDIR}\sysnative\bash.exe".to_string(),
            r"${WINDIR}\System32\bash.exe".to_string(),
        ]
    } else {
        vec!["/bin/bash".to_string(), "/usr/bin/bash".to_string()]
    }
}
fn default_translate() -> bool {
    cfg!(windows)
}
fn default_mount_prefix() -> String {
    "/mnt/".to_string()
}
fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            load_user_profile: false,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            translate: default_translate(),
            mount_prefix: default_mount_prefix(),
            staging_dir: None,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            strategy: RelayStrategy::default(),
            poll_interval_ms: default_poll_interval_ms(),
            retry: default_retry_steps(),
        }
    }
}

impl RelayConfig {
    /// Converts the file representation into runtime relay options.
    pub fn options(&self) -> RelayOptions {
        RelayOptions {
            strategy: self.strategy,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            retry: RetrySchedule::from_steps(&self.retry),
        }
    }
}

/// Loads the effective configuration.
///
/// # Errors
///
/// Returns an `Err` (wrapping `WrapperError::Config`) if `WSLBASH_CONFIG`
/// points to a missing file, a file cannot be read or parsed, or the result
/// fails validation.
pub fn load_config() -> Result<Config> {
    let mut config = match find_config_path()? {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            load_config_from_path(&path)?
        }
        None => {
            debug!("No configuration file found, using defaults.");
            Config::default()
        }
    };
    expand_config_paths(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", config);
    Ok(config)
}

fn find_config_path() -> Result<Option<PathBuf>> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
        let path = PathBuf::from(explicit);
        if !path.is_file() {
            return Err(anyhow!(WrapperError::Config(format!(
                "{} points to '{}', which is not a file",
                CONFIG_ENV_VAR,
                path.display()
            ))));
        }
        return Ok(Some(path));
    }
    if let Some(proj_dirs) = ProjectDirs::from("com", "wslbash", "wslbash") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.is_file() {
            return Ok(Some(config_path));
        }
        debug!("User configuration file not found at {}", config_path.display());
    }
    Ok(None)
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        anyhow!(WrapperError::Config(format!(
            "failed to read '{}': {}",
            path.display(),
            e
        )))
    })?;
    toml::from_str(&content).map_err(|e| {
        anyhow!(WrapperError::Config(format!(
            "failed to parse '{}': {}",
            path.display(),
            e
        )))
    })
}

fn expand_config_paths(config: &mut Config) {
    if let Some(dir) = config.launch.working_dir.as_mut() {
        *dir = shellexpand::tilde(dir).into_owned();
        debug!("Expanded working directory: {}", dir);
    }
    if let Some(dir) = config.paths.staging_dir.as_mut() {
        *dir = shellexpand::tilde(dir).into_owned();
        debug!("Expanded staging directory: {}", dir);
    }
}

fn validate_config(config: &Config) -> Result<()> {
    let invalid = |message: &str| -> Result<()> {
        Err(anyhow!(WrapperError::Config(message.to_string())))
    };
    if config.interpreter.candidates.is_empty() {
        return invalid("interpreter.candidates must list at least one location");
    }
    if config.paths.translate && config.paths.mount_prefix.trim().is_empty() {
        return invalid("paths.mount_prefix cannot be empty when paths.translate is enabled");
    }
    if config.relay.poll_interval_ms == 0 {
        return invalid("relay.poll_interval_ms must be greater than zero");
    }
    if config.relay.retry.is_empty() {
        return invalid("relay.retry must contain at least one step");
    }
    if config.relay.retry.iter().any(|step| step.attempts == 0) {
        return invalid("relay.retry steps must have at least one attempt");
    }
    // Checked before the schedule is flattened into one delay per retry.
    let retries: u64 = config
        .relay
        .retry
        .iter()
        .map(|step| u64::from(step.attempts))
        .sum();
    if retries > MAX_RETRY_ATTEMPTS {
        return Err(anyhow!(WrapperError::Config(format!(
            "relay.retry adds up to {} attempts, the limit is {}",
            retries, MAX_RETRY_ATTEMPTS
        ))));
    }
    let budget = RetrySchedule::from_steps(&config.relay.retry).total_budget();
    if budget > MAX_RETRY_BUDGET {
        return Err(anyhow!(WrapperError::Config(format!(
            "relay.retry sleeps for {:?} in total, the limit is {:?}",
            budget, MAX_RETRY_BUDGET
        ))));
    }
    if let Some(dir) = &config.launch.working_dir {
        if !Path::new(dir).is_dir() {
            return Err(anyhow!(WrapperError::Config(format!(
                "launch.working_dir '{}' is not a directory",
                dir
            ))));
        }
    }
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.interpreter.candidates.is_empty());
        assert!(!config.interpreter.load_user_profile);
        assert_eq!(config.paths.mount_prefix, "/mnt/");
        assert_eq!(config.paths.translate, cfg!(windows));
        assert_eq!(config.relay.strategy, RelayStrategy::Tail);
        assert_eq!(config.relay.poll_interval_ms, 100);
        assert_eq!(
            config.relay.options().retry.total_budget(),
            Duration::from_secs(48)
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_file_equals_defaults() {
        let config: Config = toml::from_str("").expect("Failed to parse TOML");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_deserialize_basic_toml() {
        let toml_content = r#"
            [interpreter]
            candidates = ["/opt/bash", "/bin/bash"]
            load_user_profile = true

            [paths]
            translate = false
            staging_dir = "~/staging"

            [relay]
            strategy = "copy"
            poll_interval_ms = 25

            [[relay.retry]]
            attempts = 2
            delay_ms = 50
        "#;

        let config: Config = toml::from_str(toml_content).expect("Failed to parse TOML");

        assert_eq!(config.interpreter.candidates, vec!["/opt/bash", "/bin/bash"]);
        assert!(config.interpreter.load_user_profile);
        assert!(!config.paths.translate);
        assert_eq!(config.paths.mount_prefix, "/mnt/"); // Default
        assert_eq!(config.paths.staging_dir.as_deref(), Some("~/staging")); // Not yet expanded
        assert_eq!(config.relay.strategy, RelayStrategy::Copy);

        let options = config.relay.options();
        assert_eq!(options.poll_interval, Duration::from_millis(25));
        assert_eq!(options.retry.delays(), &[Duration::from_millis(50); 2]);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[relay]\nbogus = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_path_expansion() {
        let mut config = Config {
            paths: PathsConfig {
                staging_dir: Some("/absolute/staging".to_string()),
                ..Default::default()
            },
            launch: LaunchConfig {
                working_dir: Some("~".to_string()),
            },
            ..Default::default()
        };
        expand_config_paths(&mut config);
        assert!(!config.launch.working_dir.as_deref().unwrap().starts_with('~'));
        assert_eq!(config.paths.staging_dir.as_deref(), Some("/absolute/staging"));
    }

    #[test]
    fn test_validate_config_rejects_zero_poll_interval() {
        let config = Config {
            relay: RelayConfig {
                poll_interval_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn test_validate_config_rejects_bad_retry_schedule() {
        let empty = Config {
            relay: RelayConfig {
                retry: vec![],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&empty).is_err());

        let zero_attempts = Config {
            relay: RelayConfig {
                retry: vec![RetryStep {
                    attempts: 0,
                    delay_ms: 10,
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&zero_attempts).is_err());
    }

    #[test]
    fn test_validate_config_rejects_unbounded_retry_schedule() {
        let with_steps = |retry: Vec<RetryStep>| Config {
            relay: RelayConfig {
                retry,
                ..Default::default()
            },
            ..Default::default()
        };

        let endless_delay = with_steps(vec![RetryStep {
            attempts: 3,
            delay_ms: u64::MAX,
        }]);
        let err = validate_config(&endless_delay).unwrap_err();
        assert!(err.to_string().contains("in total"));

        let too_many = with_steps(vec![RetryStep {
            attempts: u32::MAX,
            delay_ms: 1,
        }]);
        let err = validate_config(&too_many).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WrapperError>(),
            Some(WrapperError::Config(_))
        ));
        assert!(err.to_string().contains("attempts"));

        let at_limit = with_steps(vec![
            RetryStep {
                attempts: 50,
                delay_ms: 6_000,
            },
            RetryStep {
                attempts: 50,
                delay_ms: 6_000,
            },
        ]);
        assert!(validate_config(&at_limit).is_ok());
    }

    #[test]
    fn test_validate_config_rejects_empty_candidates() {
        let config = Config {
            interpreter: InterpreterConfig {
                candidates: vec![],
                load_user_profile: false,
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WrapperError>(),
            Some(WrapperError::Config(_))
        ));
    }

    #[test]
    fn test_validate_config_working_dir_must_exist() {
        let temp_dir = tempdir().unwrap();
        let mut config = Config {
            launch: LaunchConfig {
                working_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());

        config.launch.working_dir = Some(
            temp_dir
                .path()
                .join("missing")
                .to_string_lossy()
                .to_string(),
        );
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_config_from_path_reports_parse_errors() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("config.toml");
        fs::write(&file_path, "[relay\n").unwrap();
        let err = load_config_from_path(&file_path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WrapperError>(),
            Some(WrapperError::Config(_))
        ));
    }
}
