//! Bridge configuration parsing from environment variables.

use std::env;
use std::time::Duration;

use crate::bridge::DEFAULT_TIMEOUT;
use crate::scheduler::DEFAULT_INTERVAL;

/// Default Carbon plaintext listener address.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:2003";

/// Graphite bridge environment configuration.
///
/// `address` and `timeout` are construction-time identity of the bridge;
/// `interval` and `prefix` are per-schedule parameters passed to `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphiteConfig {
    pub address: String,
    pub timeout: Duration,
    pub interval: Duration,
    pub prefix: String,
}

impl Default for GraphiteConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            prefix: String::new(),
        }
    }
}

impl GraphiteConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            address: env::var("GRAPHITE_ADDRESS").unwrap_or(defaults.address),
            timeout: env_secs("GRAPHITE_TIMEOUT_SECS").unwrap_or(defaults.timeout),
            interval: env_secs("GRAPHITE_INTERVAL_SECS").unwrap_or(defaults.interval),
            prefix: env::var("GRAPHITE_PREFIX").unwrap_or(defaults.prefix),
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
}
