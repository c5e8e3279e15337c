//! Environment-driven configuration
//!
//! All settings come from `GPU_POOL_*` variables with defaults suitable for
//! a backend running on localhost.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::poller::{OverlapPolicy, PollerConfig, RefreshStyle};

pub const DEFAULT_URL: &str = "http://127.0.0.1:8000/api/workstations";
pub const DEFAULT_REFRESH_MS: u64 = 30_000;
pub const DEFAULT_MAX_POINTS: usize = 200;
pub const DEFAULT_HISTORY: usize = 2048;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: expected a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },

    #[error("{var}: unknown value {value:?}, expected one of {expected}")]
    UnknownChoice {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub url: String,
    pub refresh_interval: Duration,
    pub max_points: usize,
    pub history_capacity: usize,
    pub request_timeout: Duration,
    /// SVG file rewritten after every poll (CLI only)
    pub chart_path: Option<PathBuf>,
    pub overlap: OverlapPolicy,
    pub refresh_style: RefreshStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_MS),
            max_points: DEFAULT_MAX_POINTS,
            history_capacity: DEFAULT_HISTORY,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            chart_path: None,
            overlap: OverlapPolicy::default(),
            refresh_style: RefreshStyle::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            url: get("GPU_POOL_URL").unwrap_or_else(|| DEFAULT_URL.to_string()),
            refresh_interval: Duration::from_millis(positive(
                "GPU_POOL_REFRESH_MS",
                get("GPU_POOL_REFRESH_MS"),
                DEFAULT_REFRESH_MS,
            )?),
            max_points: positive("GPU_POOL_MAX_POINTS", get("GPU_POOL_MAX_POINTS"), DEFAULT_MAX_POINTS)?,
            history_capacity: positive("GPU_POOL_HISTORY", get("GPU_POOL_HISTORY"), DEFAULT_HISTORY)?,
            request_timeout: Duration::from_millis(positive(
                "GPU_POOL_TIMEOUT_MS",
                get("GPU_POOL_TIMEOUT_MS"),
                DEFAULT_TIMEOUT_MS,
            )?),
            chart_path: get("GPU_POOL_CHART").map(PathBuf::from),
            overlap: match get("GPU_POOL_OVERLAP").as_deref() {
                None | Some("last-completion") => OverlapPolicy::LastCompletionWins,
                Some("last-issued") => OverlapPolicy::LastIssuedWins,
                Some(other) => {
                    return Err(ConfigError::UnknownChoice {
                        var: "GPU_POOL_OVERLAP",
                        value: other.to_string(),
                        expected: "last-completion, last-issued",
                    })
                }
            },
            refresh_style: match get("GPU_POOL_REFRESH_STYLE").as_deref() {
                None | Some("keep-stale") => RefreshStyle::KeepStale,
                Some("reset-to-loading") => RefreshStyle::ResetToLoading,
                Some(other) => {
                    return Err(ConfigError::UnknownChoice {
                        var: "GPU_POOL_REFRESH_STYLE",
                        value: other.to_string(),
                        expected: "keep-stale, reset-to-loading",
                    })
                }
            },
        };
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn poller(&self) -> PollerConfig {
        PollerConfig {
            overlap: self.overlap,
            refresh: self.refresh_style,
        }
    }
}

fn positive<N>(var: &'static str, raw: Option<String>, default: N) -> Result<N, ConfigError>
where
    N: std::str::FromStr + PartialEq + Default,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: N = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.clone(),
    })?;
    if value == N::default() {
        return Err(ConfigError::Zero { var });
    }
    Ok(value)
}
