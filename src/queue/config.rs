use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

pub const DEFAULT_QUEUE_NAMESPACE: &str = "queue";
pub const DEFAULT_DELAYED_NAMESPACE: &str = "delayed_queue";

/// Key prefixes for the two collections backing a queue name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Prefix of the FIFO list: `<namespace>:<name>`.
    pub namespace: String,
    /// Prefix of the time-ordered set: `<delayed_namespace>:<name>`.
    pub delayed_namespace: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            namespace: DEFAULT_QUEUE_NAMESPACE.to_string(),
            delayed_namespace: DEFAULT_DELAYED_NAMESPACE.to_string(),
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.trim().is_empty() || self.delayed_namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("queue namespaces must not be empty".into()));
        }
        if self.namespace == self.delayed_namespace {
            return Err(ConfigError::Invalid(
                "queue and delayed queue namespaces must differ".into(),
            ));
        }
        Ok(())
    }
}
