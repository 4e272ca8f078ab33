use thiserror::Error;

/// Failure reaching the store or executing a script against it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached, or the connection dropped mid-call.
    #[error("store connection failed: {0}")]
    Connection(String),
    /// The store rejected or failed the script.
    #[error("script {script} failed: {message}")]
    Backend {
        script: &'static str,
        message: String,
    },
    /// A key holds a value of a different type than the script expects.
    #[error("key {key} holds the wrong kind of value")]
    WrongType { key: String },
    /// The script returned something its caller cannot interpret.
    #[error("script {script} returned an unexpected reply: {reply}")]
    UnexpectedReply {
        script: &'static str,
        reply: String,
    },
    /// Keys or arguments did not match what the script expects.
    #[error("script {script} called with invalid arguments: {message}")]
    InvalidArgument {
        script: &'static str,
        message: String,
    },
    /// An in-process store mutex was poisoned.
    #[error("store state poisoned during {0}")]
    Poisoned(&'static str),
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Backend {
                script: "redis",
                message: err.to_string(),
            }
        }
    }
}
