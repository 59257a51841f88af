//! Configuration Module
//!
//! Handles loading and validating the cache configuration from environment
//! variables. The struct is built once at startup and passed by reference
//! into the cache core and the replay scheduler; there is no ambient lookup.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CacheError, Result};

// == Cache Config ==
/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults. Construction through [`CacheConfig::from_env`] validates the
/// result; callers assembling the struct by hand should run
/// [`CacheConfig::validate`] before wiring it in.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether puts are appended to the durable buffer
    pub buffer_persistence: bool,
    /// Path of the durable buffer log file
    pub buffer_path: PathBuf,
    /// Opaque namespace handed to the backing-store port
    pub store_namespace: String,
    /// Interval between replay cycles draining the buffer
    pub replay_interval: Duration,
    /// TTL applied to keys without an override
    pub default_ttl: Duration,
    /// Per-key TTL overrides (exact keys or `prefix*` patterns)
    pub ttl_overrides: HashMap<String, Duration>,
    /// Interval between background expiry sweeps
    pub sweep_interval: Duration,
    /// Whether buffer appends fsync before returning
    pub durable_sync: bool,
    /// Whether shutdown runs a final drain of the buffer
    pub drain_on_shutdown: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `BUFFER_PERSISTENCE` - Enable durable buffering (default: false)
    /// - `BUFFER_PATH` - Buffer log file path (default: resilient-cache.buf)
    /// - `STORE_NAMESPACE` - Backing-store namespace (default: resilient-cache)
    /// - `REPLAY_INTERVAL` - Replay cycle interval in seconds (default: 10)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `TTL_OVERRIDES` - Comma-separated `key=seconds` pairs
    /// - `SWEEP_INTERVAL` - Expiry sweep interval in seconds (default: 1)
    /// - `DURABLE_SYNC` - fsync each buffer append (default: true)
    /// - `DRAIN_ON_SHUTDOWN` - Drain the buffer on shutdown (default: true)
    pub fn from_env() -> Result<Self> {
        let config = Self {
            buffer_persistence: env_flag("BUFFER_PERSISTENCE", false),
            buffer_path: env::var("BUFFER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("resilient-cache.buf")),
            store_namespace: env::var("STORE_NAMESPACE")
                .unwrap_or_else(|_| "resilient-cache".to_string()),
            replay_interval: env_secs("REPLAY_INTERVAL", 10),
            default_ttl: env_secs("DEFAULT_TTL", 300),
            ttl_overrides: parse_overrides(&env::var("TTL_OVERRIDES").unwrap_or_default())?,
            sweep_interval: env_secs("SWEEP_INTERVAL", 1),
            durable_sync: env_flag("DURABLE_SYNC", true),
            drain_on_shutdown: env_flag("DRAIN_ON_SHUTDOWN", true),
        };
        config.validate()?;
        Ok(config)
    }

    // == Validation ==
    /// Rejects invalid configuration at load time.
    ///
    /// Fails on a non-positive default TTL, a non-positive replay or sweep
    /// interval, and malformed override entries (empty key or zero duration).
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "default TTL must be positive".to_string(),
            ));
        }
        if self.replay_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "replay interval must be positive".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "sweep interval must be positive".to_string(),
            ));
        }
        for (key, ttl) in &self.ttl_overrides {
            if key.is_empty() {
                return Err(CacheError::InvalidConfig(
                    "TTL override key must not be empty".to_string(),
                ));
            }
            if ttl.is_zero() {
                return Err(CacheError::InvalidConfig(format!(
                    "TTL override for '{}' must be positive",
                    key
                )));
            }
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            buffer_persistence: false,
            buffer_path: PathBuf::from("resilient-cache.buf"),
            store_namespace: "resilient-cache".to_string(),
            replay_interval: Duration::from_secs(10),
            default_ttl: Duration::from_secs(300),
            ttl_overrides: HashMap::new(),
            sweep_interval: Duration::from_secs(1),
            durable_sync: true,
            drain_on_shutdown: true,
        }
    }
}

// == Env Helpers ==
fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: u64) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// Parses `key=seconds` pairs separated by commas, e.g.
/// `session:*=30,user:7=600`.
fn parse_overrides(raw: &str) -> Result<HashMap<String, Duration>> {
    let mut overrides = HashMap::new();
    for pair in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let (key, secs) = pair.split_once('=').ok_or_else(|| {
            CacheError::InvalidConfig(format!("malformed TTL override '{}'", pair))
        })?;
        let secs: u64 = secs.trim().parse().map_err(|_| {
            CacheError::InvalidConfig(format!("malformed TTL override '{}'", pair))
        })?;
        overrides.insert(key.trim().to_string(), Duration::from_secs(secs));
    }
    Ok(overrides)
}
