use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::script::StoreError;

/// Error type for lock operations.
///
/// Release never produces one of these: `unlock` reports its outcome as a
/// `bool` and logs the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The lock name was empty or blank.
    #[error("invalid lock name {0:?}")]
    InvalidName(String),
    /// Lease or poll settings were unusable.
    #[error("invalid lock configuration: {0}")]
    InvalidConfig(String),
    /// The store could not be reached or rejected a script.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// `lock()` gave up after its wait timeout; the critical section was not entered.
    #[error("timed out after {waited:?} waiting for lock {key}")]
    Timeout { key: String, waited: Duration },
    /// An interruptible wait observed its cancel flag before acquiring.
    #[error("interrupted while waiting for lock {key}")]
    Interrupted { key: String },
}

impl From<ConfigError> for LockError {
    fn from(err: ConfigError) -> Self {
        LockError::InvalidConfig(err.to_string())
    }
}
