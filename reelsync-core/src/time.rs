//! Injectable time sources.
//!
//! Drift-correction throttling and notice expiry read time through
//! [`TimeProvider`] so tests can advance a virtual clock instead of sleeping.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time since an arbitrary, provider-specific origin.
pub trait TimeProvider: Debug {
    fn now(&self) -> Duration;
}

/// Wall-clock backed provider for production hosts
#[derive(Debug, Clone)]
pub struct SystemTimeProvider {
    origin: Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock. Clones share the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct VirtualTimeProvider {
    nanos: Arc<AtomicU64>,
}

impl VirtualTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos
            .fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, to: Duration) {
        self.nanos.store(to.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl TimeProvider for VirtualTimeProvider {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}
