use anyhow::Result;
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::job::JobBackoff;

/// Rejected configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Seconds value that cannot be represented as a `Duration`
    /// (negative, NaN, infinite or too large).
    #[error("{field} must be a finite, non-negative number of seconds (got {value})")]
    InvalidDuration { field: &'static str, value: f64 },
}

/// Job backoff parameters, as stored in `config.toml`.
///
/// Defaults follow the `backoff` crate's exponential defaults with a 30s job
/// threshold. Missing keys fall back to those defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobBackoffConfig {
    /// First retry interval in seconds (e.g. 0.5 = 500ms).
    pub initial_interval_secs: f64,
    /// Growth factor applied after each fast failure.
    pub multiplier: f64,
    /// Jitter as a fraction of the current interval (0.5 = +/-50%).
    pub randomization_factor: f64,
    /// Upper bound on the (pre-jitter) retry interval in seconds.
    pub max_interval_secs: f64,
    /// Attempts that ran at least this long reset the backoff. Zero is
    /// accepted and pins every retry to the initial interval.
    pub min_job_interval_secs: f64,
    /// Cap on attempts (including the first) for the retry loops; `None`
    /// retries until success.
    pub max_attempts: Option<u32>,
}

impl Default for JobBackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval_secs: 0.5,
            multiplier: 1.5,
            randomization_factor: 0.5,
            max_interval_secs: 60.0,
            min_job_interval_secs: 30.0,
            max_attempts: None,
        }
    }
}

fn secs(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { field, value })
}

impl JobBackoffConfig {
    /// Build a [`JobBackoff`] on the system clock.
    pub fn build(&self) -> Result<JobBackoff, ConfigError> {
        let initial = secs("initial_interval_secs", self.initial_interval_secs)?;
        let max_interval = secs("max_interval_secs", self.max_interval_secs)?;
        let min_job_interval = secs("min_job_interval_secs", self.min_job_interval_secs)?;

        if min_job_interval.is_zero() {
            tracing::warn!("min_job_interval_secs is 0; every retry will use the initial interval");
        }

        let inner = ExponentialBackoff {
            current_interval: initial,
            initial_interval: initial,
            randomization_factor: self.randomization_factor,
            multiplier: self.multiplier,
            max_interval,
            ..ExponentialBackoff::default()
        };
        Ok(JobBackoff::new(inner).with_min_job_interval(min_job_interval))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("job-backoff")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Read and parse a config file.
pub fn load_from(path: &Path) -> Result<JobBackoffConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: JobBackoffConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Load configuration from the XDG config file, creating it with defaults if
/// none exists.
pub fn load_or_init() -> Result<JobBackoffConfig> {
    load_or_init_at(&config_path()?)
}

/// Load configuration from `path`, writing the defaults there first if the
/// file does not exist.
pub fn load_or_init_at(path: &Path) -> Result<JobBackoffConfig> {
    if !path.exists() {
        let default_cfg = JobBackoffConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(path)
}
