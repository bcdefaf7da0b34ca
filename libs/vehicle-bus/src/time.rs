//! Time provider abstraction for bus timestamps
//!
//! The bus stamps readings and change events; the action layer compares those
//! stamps against the same clock, so both sides must share one provider.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Time provider trait for generating timestamps
pub trait TimeProvider: Send + Sync + 'static {
    /// Get current timestamp in nanoseconds
    fn now_nanos(&self) -> i64;

    /// Get current timestamp in milliseconds
    fn now_millis(&self) -> i64 {
        self.now_nanos() / 1_000_000
    }
}

static LAST_SYSTEM_NANOS: AtomicI64 = AtomicI64::new(0);

/// System time provider using local clock
///
/// Strictly increasing across calls within the process, so an event stamped
/// after a reference point always compares newer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_nanos(&self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        let previous = LAST_SYSTEM_NANOS
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(previous + 1)
    }
}

/// Fixed time provider for testing
///
/// Returns a predetermined timestamp, useful for deterministic tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedTimeProvider {
    timestamp_nanos: i64,
}

impl FixedTimeProvider {
    /// Create a new fixed time provider with the given timestamp
    pub fn new(timestamp_nanos: i64) -> Self {
        Self { timestamp_nanos }
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now_nanos(&self) -> i64 {
        self.timestamp_nanos
    }
}

/// Fake clock that advances by a fixed step on every read
#[derive(Debug)]
pub struct TickingTimeProvider {
    next: AtomicI64,
    step: i64,
}

impl TickingTimeProvider {
    pub fn new(start_nanos: i64, step_nanos: i64) -> Self {
        Self {
            next: AtomicI64::new(start_nanos),
            step: step_nanos.max(1),
        }
    }
}

impl Default for TickingTimeProvider {
    fn default() -> Self {
        Self::new(1_000_000_000, 1_000)
    }
}

impl TimeProvider for TickingTimeProvider {
    fn now_nanos(&self) -> i64 {
        self.next.fetch_add(self.step, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_time_provider_strictly_increases() {
        let provider = SystemTimeProvider;
        let mut last = provider.now_nanos();
        for _ in 0..1000 {
            let next = provider.now_nanos();
            assert!(next > last);
            last = next;
        }
        assert!(provider.now_millis() > 1_600_000_000_000);
    }

    #[test]
    fn test_fixed_time_provider() {
        let provider = FixedTimeProvider::new(1_700_000_000_000_000_000);

        assert_eq!(provider.now_nanos(), 1_700_000_000_000_000_000);
        assert_eq!(provider.now_millis(), 1_700_000_000_000); // Always returns same value
    }

    #[test]
    fn test_ticking_time_provider() {
        let provider = TickingTimeProvider::new(100, 10);
        assert_eq!(provider.now_nanos(), 100);
        assert_eq!(provider.now_nanos(), 110);
        assert_eq!(TickingTimeProvider::new(0, 0).step, 1);
    }
}
