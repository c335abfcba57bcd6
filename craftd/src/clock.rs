//! Injectable time source
//!
//! Every rate limit, retry delay, settle delay, and timeout in the crate is
//! computed against a [`Clock`] rather than `Instant::now()` directly, so the
//! state machines can be driven deterministically in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::debug;

/// Monotonic millisecond time source
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since some fixed origin
    fn now_ms(&self) -> u64;
}

/// Wall-clock implementation backed by `Instant`
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        debug!("SystemClock::new: called");
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Hand-advanced clock for tests
///
/// Shared via `Arc`, so a test can hold one handle and advance time while the
/// component under test reads the same instant.
#[derive(Default)]
pub struct ManualClock {
    ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { ms: AtomicU64::new(0) })
    }

    /// Move time forward
    pub fn advance(&self, delta_ms: u64) {
        let now = self.ms.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms;
        debug!(delta_ms, now, "ManualClock::advance");
    }

    /// Jump to an absolute time (must not move backwards)
    pub fn set(&self, ms: u64) {
        debug!(ms, "ManualClock::set");
        self.ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::SeqCst)
    }
}
