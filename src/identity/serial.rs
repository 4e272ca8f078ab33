use std::sync::atomic::{AtomicU64, Ordering};

/// Largest serial handed out before wrapping back to 1.
pub const SERIAL_MAX: u64 = 999_999;

/// Monotonic serial number in `1..=max` that wraps around.
pub struct SerialCounter {
    current: AtomicU64,
    max: u64,
}

impl SerialCounter {
    pub const fn new(max: u64) -> Self {
        SerialCounter {
            current: AtomicU64::new(0),
            max,
        }
    }

    pub fn next(&self) -> u64 {
        let max = self.max.max(1);
        let previous = self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(if n >= max { 1 } else { n + 1 })
            })
            .unwrap_or(0);
        if previous >= max {
            1
        } else {
            previous + 1
        }
    }
}
