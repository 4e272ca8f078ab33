//! Configuration for locks, queues and the store connection.
//!
//! Every struct deserializes with defaults for missing fields, so a config
//! file only needs to name what it overrides:
//!
//! ```
//! use redis_coordination::CoordinationConfig;
//! use std::time::Duration;
//!
//! let config = CoordinationConfig::from_json_str(
//!     r#"{ "redis_url": "redis://cache:6379/2", "lock": { "lease_ms": 5000 } }"#,
//! ).unwrap();
//!
//! assert_eq!(config.redis_url, "redis://cache:6379/2");
//! assert_eq!(config.lock.lease, Duration::from_secs(5));
//! assert_eq!(config.lock.poll_interval, Duration::from_millis(10));
//! ```

mod error;
pub(crate) mod millis;

pub use error::ConfigError;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::lock::LockConfig;
use crate::queue::QueueConfig;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";

/// Aggregate configuration for one store and the primitives built on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConfig {
    pub redis_url: String,
    pub lock: LockConfig,
    pub queue: QueueConfig,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        CoordinationConfig {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            lock: LockConfig::default(),
            queue: QueueConfig::default(),
        }
    }
}

impl CoordinationConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: CoordinationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redis_url.trim().is_empty() {
            return Err(ConfigError::Invalid("redis_url must not be empty".into()));
        }
        self.lock.validate()?;
        self.queue.validate()
    }
}
