//! Ownership tokens for lock holders.
//!
//! A token has the shape `host:thread:serial`. The `host:thread:` prefix is
//! the owner prefix; two tokens with the same prefix belong to the same thread
//! of the same process and may re-enter each other's locks.

mod serial;

pub use serial::{SerialCounter, SERIAL_MAX};

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use if_addrs::IfAddr;

static GLOBAL_SERIAL: SerialCounter = SerialCounter::new(SERIAL_MAX);
static NEXT_THREAD_SEQ: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_SEQ: Cell<u64> = const { Cell::new(0) };
}

/// Process-unique number of the calling thread, assigned on first use.
fn current_thread_seq() -> u64 {
    THREAD_SEQ.with(|seq| {
        if seq.get() == 0 {
            seq.set(NEXT_THREAD_SEQ.fetch_add(1, Ordering::Relaxed));
        }
        seq.get()
    })
}

/// First non-loopback IPv4 address, or `127.0.0.1`.
pub fn local_host_address() -> String {
    if_addrs::get_if_addrs()
        .ok()
        .and_then(|addrs| {
            addrs
                .into_iter()
                .find(|iface| !iface.is_loopback() && matches!(iface.addr, IfAddr::V4(_)))
                .and_then(|iface| match iface.addr {
                    IfAddr::V4(addr) => Some(addr.ip.to_string()),
                    _ => None,
                })
        })
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

/// Proof of lock ownership.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityToken {
    host: String,
    thread: String,
    serial: u64,
}

impl IdentityToken {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn thread(&self) -> &str {
        &self.thread
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// `host:thread:`, including the trailing separator so that thread `1`
    /// never matches thread `12`.
    pub fn owner_prefix(&self) -> String {
        format!("{}:{}:", self.host, self.thread)
    }

    /// Whether a stored lock value was written by the same host and thread.
    pub fn same_owner(&self, stored: &str) -> bool {
        stored.starts_with(&self.owner_prefix())
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.host, self.thread, self.serial)
    }
}

/// Mints [`IdentityToken`]s for the calling thread.
///
/// The thread segment is `<pid>.<seq>`, so threads of different processes on
/// the same host never share an owner prefix.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    host: String,
    pid: u32,
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider {
    pub fn new() -> Self {
        Self::with_host(local_host_address())
    }

    /// Use a fixed host segment instead of probing network interfaces.
    pub fn with_host(host: impl Into<String>) -> Self {
        IdentityProvider {
            host: host.into(),
            pid: std::process::id(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// A fresh token for the calling thread.
    pub fn next_token(&self) -> IdentityToken {
        IdentityToken {
            host: self.host.clone(),
            thread: format!("{}.{}", self.pid, current_thread_seq()),
            serial: GLOBAL_SERIAL.next(),
        }
    }
}
