use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::{mlog_debug, Error, Result};

pub const DEFAULT_EXECUTOR_COUNT: usize = 4;
pub const DEFAULT_WAIT_QUEUE_LIMIT: usize = 32;
pub const DEFAULT_BUSY_RETRY_LIMIT: u32 = 5;
pub const DEFAULT_BUSY_RETRY_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_TIMEOUT_RETRY_LIMIT: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u32 = 5000;
pub const DEFAULT_LPN_REQUEST_TIMEOUT_MS: u32 = 10000;

/// Tunables of the configurator and its executor pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Number of jobs that may run in parallel (different nodes only).
    pub executor_count: usize,
    /// Jobs that may wait for a free executor.
    pub wait_queue_limit: usize,
    /// Request re-issues while the stack reports no free resources.
    pub busy_retry_limit: u32,
    pub busy_retry_interval_ms: u64,
    /// Request re-issues after a task timed out waiting for its status.
    pub timeout_retry_limit: u32,
    /// Stack-level response timeout for regular nodes.
    pub request_timeout_ms: u32,
    /// Stack-level response timeout for low power nodes.
    pub lpn_request_timeout_ms: u32,
    /// Drop a job whose submission fails instead of handing it back.
    pub auto_destroy_on_submit_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executor_count: DEFAULT_EXECUTOR_COUNT,
            wait_queue_limit: DEFAULT_WAIT_QUEUE_LIMIT,
            busy_retry_limit: DEFAULT_BUSY_RETRY_LIMIT,
            busy_retry_interval_ms: DEFAULT_BUSY_RETRY_INTERVAL_MS,
            timeout_retry_limit: DEFAULT_TIMEOUT_RETRY_LIMIT,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            lpn_request_timeout_ms: DEFAULT_LPN_REQUEST_TIMEOUT_MS,
            auto_destroy_on_submit_failure: true,
        }
    }
}

impl Config {
    pub fn busy_retry_interval(&self) -> Duration {
        Duration::from_millis(self.busy_retry_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.executor_count == 0 {
            return Err(Error::InvalidConfiguration);
        }
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| {
            mlog_debug!("Config parse failed: {}", e);
            Error::InvalidConfiguration
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        mlog_debug!("Config::load_from path={}", path.display());
        if !path.exists() {
            mlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|_| Error::NotFound)?;
        let config = Self::from_toml_str(&text)?;
        mlog_debug!(
            "Config loaded: executors={}, wait_queue={}, busy_retry={}x{}ms, timeout_retry={}",
            config.executor_count,
            config.wait_queue_limit,
            config.busy_retry_limit,
            config.busy_retry_interval_ms,
            config.timeout_retry_limit
        );
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).map_err(|_| Error::InvalidConfiguration)?;
        fs::write(path, text).map_err(|_| Error::Fail)?;
        mlog_debug!("Config saved to {}", path.display());
        Ok(())
    }
}
