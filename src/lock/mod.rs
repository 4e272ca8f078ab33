//! Reentrant distributed lock over atomic store scripts.
//!
//! ```text
//!            try_lock (fresh)                unlock
//!  Unheld ─────────────────────▶ HeldFresh ────────────▶ Unheld (key deleted)
//!     │
//!     │      try_lock (same thread already holds)      unlock
//!     └─────────────────────────▶ HeldReentrant ──────▶ Unheld (key kept)
//! ```
//!
//! A key nobody releases expires when its lease runs out.

mod cancel;
mod config;
mod distributed;
mod error;
mod guard;
#[allow(clippy::module_inception)]
mod lock;
mod lock_manager;
pub(crate) mod scripts;

pub use cancel::CancelFlag;
pub use config::{
    LockConfig, DEFAULT_LEASE, DEFAULT_NAMESPACE, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT,
};
pub use distributed::DistributedLock;
pub use error::LockError;
pub use guard::LockGuard;
pub use lock::Lock;
pub use lock_manager::LockManager;
