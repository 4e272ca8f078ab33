use thiserror::Error;

use crate::config::ConfigError;
use crate::script::StoreError;

/// Error type for queue operations. Store failures are passed through
/// unchanged; the queue never retries.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("invalid queue name {0:?}")]
    InvalidName(String),
    #[error("invalid queue configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("queue payload could not be (de)serialized: {0}")]
    Payload(#[from] serde_json::Error),
}

impl From<ConfigError> for QueueError {
    fn from(err: ConfigError) -> Self {
        QueueError::InvalidConfig(err.to_string())
    }
}
