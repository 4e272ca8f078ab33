use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{millis, ConfigError};

pub const DEFAULT_NAMESPACE: &str = "distributed_lock";
pub const DEFAULT_LEASE: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings applied to every lock handle a manager hands out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Prefix of every lock key: `<namespace>:<name>`.
    pub namespace: String,
    /// Lease set on acquisition and on every re-entry or renewal.
    #[serde(rename = "lease_ms", with = "millis")]
    pub lease: Duration,
    /// Sleep between attempts while waiting.
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,
    /// How long `lock()` waits before failing with a timeout.
    #[serde(rename = "wait_timeout_ms", with = "millis")]
    pub wait_timeout: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        LockConfig {
            namespace: DEFAULT_NAMESPACE.to_string(),
            lease: DEFAULT_LEASE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl LockConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("lock namespace must not be empty".into()));
        }
        if self.lease.as_millis() == 0 {
            return Err(ConfigError::Invalid(
                "lock lease must be at least one millisecond".into(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("lock poll interval must not be zero".into()));
        }
        Ok(())
    }
}
