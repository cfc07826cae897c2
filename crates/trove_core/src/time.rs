//! Injectable time source.
//!
//! Timestamps drive record metadata, queue entry ids, and retry backoff
//! gates, so the engine takes its clock as a dependency. Production code
//! uses [`SystemTimeSource`]; tests use [`ManualTime`] to make drains and
//! backoff behavior deterministic.

use crate::TimestampMs;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of wall-clock time in milliseconds since the Unix epoch.
pub trait TimeSource: Send + Sync {
    /// The current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> TimestampMs;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> TimestampMs {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as TimestampMs)
            .unwrap_or(0)
    }
}

/// A manually-advanced clock for tests.
///
/// # Example
///
/// ```rust
/// use trove_core::{ManualTime, TimeSource};
///
/// let clock = ManualTime::new(1_000);
/// assert_eq!(clock.now_ms(), 1_000);
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1_500);
/// ```
#[derive(Debug, Default)]
pub struct ManualTime {
    now: AtomicI64,
}

impl ManualTime {
    /// Creates a clock starting at the given time.
    #[must_use]
    pub fn new(start: TimestampMs) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Sets the current time.
    pub fn set(&self, now: TimestampMs) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Advances the current time by `delta` milliseconds.
    pub fn advance(&self, delta: TimestampMs) {
        self.now.fetch_add(delta, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTime {
    fn now_ms(&self) -> TimestampMs {
        self.now.load(Ordering::SeqCst)
    }
}
