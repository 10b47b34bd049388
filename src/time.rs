//! Time sources for the cooperative control loop.

use core::time::Duration;

/// Something which records the elapsed real time.
///
/// This uses shared references because the slider, its axes and the shutter
/// all read the same clock.
pub trait SystemClock {
    /// Time passed since a clock-specific origin (usually power-on).
    fn elapsed(&self) -> Duration;
}

impl<C: SystemClock + ?Sized> SystemClock for &C {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }
}

/// A point on a [`SystemClock`] after which something becomes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Duration);

impl Deadline {
    /// Deadline `delay` after `now`.
    #[inline]
    pub fn after(now: Duration, delay: Duration) -> Self {
        Self(now.saturating_add(delay))
    }

    /// Whether the deadline has been reached at `now`.
    #[inline]
    pub fn is_due(self, now: Duration) -> bool {
        now >= self.0
    }

    /// Time left until the deadline, zero once due.
    #[inline]
    pub fn remaining(self, now: Duration) -> Duration {
        self.0.saturating_sub(now)
    }
}

/// A monotonically non-decreasing clock backed by the operating system.
///
/// Requires the `std` feature.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct OperatingSystemClock {
    created_at: std::time::Instant,
}

#[cfg(feature = "std")]
impl OperatingSystemClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "std")]
impl Default for OperatingSystemClock {
    fn default() -> Self {
        Self {
            created_at: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl SystemClock for OperatingSystemClock {
    fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// A clock that only moves when told to.
///
/// Useful for simulation and host-side tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_us: core::cell::Cell<u64>,
}

impl ManualClock {
    /// Create a clock at time zero.
    pub const fn new() -> Self {
        Self {
            now_us: core::cell::Cell::new(0),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let by_us = u64::try_from(by.as_micros()).unwrap_or(u64::MAX);
        self.now_us.set(self.now_us.get().saturating_add(by_us));
    }

    /// Move the clock forward by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl SystemClock for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::from_micros(self.now_us.get())
    }
}
