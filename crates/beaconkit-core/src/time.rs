//! Monotonic millisecond-epoch clocks.
//!
//! Event timestamps (spec: "later `track*` calls produce timestamps >=
//! earlier ones") are produced through this trait rather than calling
//! `SystemTime::now()` directly, so tests can substitute a deterministic
//! clock without relying on real wall-clock resolution.

use std::sync::atomic::{AtomicI64, Ordering};

/// A source of millisecond-epoch timestamps.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// The host's real clock.
///
/// On `wasm32` this reads `Date.now()` via `js-sys` (no `clock_gettime`
/// syscall is available in the browser sandbox); elsewhere it reads
/// `SystemTime::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(target_arch = "wasm32")]
impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        js_sys::Date::now() as i64
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// A clock that never goes backwards and never repeats within one process.
///
/// Wraps an inner [`Clock`] and clamps its readings to be strictly greater
/// than the previous reading, guaranteeing the monotonicity invariant even
/// when the underlying clock has coarse resolution (real wall clocks can
/// report the same millisecond for two calls in quick succession).
pub struct MonotonicClock<C> {
    inner: C,
    last: AtomicI64,
}

impl<C: Clock> MonotonicClock<C> {
    /// Wrap `inner`, starting the monotonic floor at `i64::MIN`.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            last: AtomicI64::new(i64::MIN),
        }
    }
}

impl<C: Clock> Clock for MonotonicClock<C> {
    fn now_ms(&self) -> i64 {
        let reading = self.inner.now_ms();
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = if reading > prev { reading } else { prev + 1 };
            match self
                .last
                .compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(i64);
    impl Clock for FixedClock {
        fn now_ms(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn monotonic_clock_never_repeats_under_a_stuck_inner_clock() {
        let clock = MonotonicClock::new(FixedClock(1_000));
        let a = clock.now_ms();
        let b = clock.now_ms();
        let c = clock.now_ms();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn monotonic_clock_tracks_an_advancing_inner_clock() {
        struct Advancing(AtomicI64);
        impl Clock for Advancing {
            fn now_ms(&self) -> i64 {
                self.0.fetch_add(10, Ordering::SeqCst)
            }
        }
        let clock = MonotonicClock::new(Advancing(AtomicI64::new(0)));
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b > a);
    }
}
