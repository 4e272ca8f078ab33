//! Script executor implementations.

mod in_memory;
#[cfg(feature = "redis")]
mod redis_executor;

pub use in_memory::InMemoryStore;
#[cfg(feature = "redis")]
pub use redis_executor::RedisScriptExecutor;
