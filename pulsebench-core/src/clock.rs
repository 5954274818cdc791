//! Measurement Clock
//!
//! All timing in the engine goes through the `Clock` trait so measured phases
//! can be driven by a deterministic clock in tests. The production clock is a
//! monotonic wall-clock with nanosecond resolution.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic nanosecond time source for the execution engine.
pub trait Clock: Send + Sync {
    /// Current reading in nanoseconds since an arbitrary, fixed origin.
    fn now_ns(&self) -> u64;
}

/// Production clock backed by `std::time::Instant`.
///
/// Readings are nanoseconds since the clock was constructed, which keeps the
/// values small enough that `u64` arithmetic never overflows in practice.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: std::time::Instant,
}

impl MonotonicClock {
    /// Create a clock anchored at the current instant.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_ns(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Deterministic clock that advances by a fixed step on every reading.
///
/// With a step of `s`, every timed invocation observes an elapsed time of
/// exactly `s` nanoseconds, which makes statistical output fully predictable.
#[derive(Debug)]
pub struct FixedStepClock {
    step_ns: u64,
    ticks: AtomicU64,
}

impl FixedStepClock {
    /// Create a clock that advances `step_ns` per reading.
    pub fn new(step_ns: u64) -> Self {
        Self {
            step_ns,
            ticks: AtomicU64::new(0),
        }
    }

    /// Number of readings taken so far.
    pub fn readings(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Clock for FixedStepClock {
    fn now_ns(&self) -> u64 {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        tick.saturating_mul(self.step_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert!(b >= a);
    }

    #[test]
    fn fixed_step_clock_is_deterministic() {
        let clock = FixedStepClock::new(100);
        assert_eq!(clock.now_ns(), 0);
        assert_eq!(clock.now_ns(), 100);
        assert_eq!(clock.now_ns(), 200);
        assert_eq!(clock.readings(), 3);
    }

    #[test]
    fn fixed_step_elapsed_between_readings_is_constant() {
        let clock = FixedStepClock::new(42);
        for _ in 0..10 {
            let start = clock.now_ns();
            let end = clock.now_ns();
            assert_eq!(end - start, 42);
        }
    }
}
