//! Bounded gate over concurrently live engine contexts
//!
//! Engine contexts are memory heavy and the corpus has tens of thousands of
//! files, so only a fixed number of runs may hold a context at once. A run
//! takes a [`Permit`] before its body starts; dropping the permit frees the
//! slot, whichever way the run ends.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Slots per unit of available parallelism
pub const DEFAULT_MULTIPLIER: usize = 2;

/// A counting semaphore with scoped release
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    capacity: usize,
    in_use: Mutex<usize>,
    released: Condvar,
}

impl ConcurrencyLimiter {
    /// Create a limiter with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            in_use: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    /// `multiplier` slots per hardware thread
    pub fn for_available_parallelism(multiplier: usize) -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(threads.saturating_mul(multiplier))
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Block until a slot is free and take it
    pub fn acquire(&self) -> Permit<'_> {
        let mut in_use = self.lock();
        while *in_use >= self.capacity {
            in_use = self
                .released
                .wait(in_use)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *in_use += 1;
        Permit { limiter: self }
    }

    fn release(&self) {
        let mut in_use = self.lock();
        *in_use = in_use.saturating_sub(1);
        self.released.notify_one();
    }

    // The counter is a plain integer, so a poisoned lock still holds a
    // consistent value.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.in_use.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::for_available_parallelism(DEFAULT_MULTIPLIER)
    }
}

/// One held slot; released on drop
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct Permit<'a> {
    limiter: &'a ConcurrencyLimiter,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_coerced() {
        assert_eq!(ConcurrencyLimiter::new(0).capacity(), 1);
    }

    #[test]
    fn test_default_scales_with_parallelism() {
        let threads = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        assert_eq!(ConcurrencyLimiter::default().capacity(), threads * 2);
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let limiter = ConcurrencyLimiter::new(1);
        let acquired = AtomicBool::new(false);

        std::thread::scope(|scope| {
            let held = limiter.acquire();
            scope.spawn(|| {
                let _permit = limiter.acquire();
                acquired.store(true, Ordering::SeqCst);
            });
            std::thread::sleep(Duration::from_millis(20));
            assert!(!acquired.load(Ordering::SeqCst));
            drop(held);
        });

        assert!(acquired.load(Ordering::SeqCst));
        assert_eq!(*limiter.lock(), 0);
    }

    #[test]
    fn test_permit_released_on_panic() {
        let limiter = ConcurrencyLimiter::new(1);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = limiter.acquire();
            panic!("run aborted");
        }));
        assert!(result.is_err());
        assert_eq!(*limiter.lock(), 0);
    }

    #[test]
    fn test_concurrent_holders_never_exceed_capacity() {
        let limiter = ConcurrencyLimiter::new(3);
        let live = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..24 {
                scope.spawn(|| {
                    let _permit = limiter.acquire();
                    let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(2));
                    live.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }
}
