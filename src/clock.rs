use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of logical time for the limiters.
///
/// The accounting algorithms take an explicit `now` parameter so they stay
/// deterministic; a `Clock` is what the registry reads to produce that value.
/// Successive readings must be non-decreasing.
pub trait Clock {
    /// Current logical time in seconds.
    fn now_secs(&self) -> u64;
}

/// Wall-clock seconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs()
    }
}

/// Externally advanced clock for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_secs: u64) -> Self {
        Self {
            now: AtomicU64::new(start_secs),
        }
    }

    /// Set the current time. Setting it backwards will surface as
    /// `NonMonotonicClock` from any limiter that already saw a later value.
    pub fn set(&self, secs: u64) {
        self.now.store(secs, Ordering::Relaxed);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

impl<C: Clock> Clock for &C {
    fn now_secs(&self) -> u64 {
        (*self).now_secs()
    }
}
