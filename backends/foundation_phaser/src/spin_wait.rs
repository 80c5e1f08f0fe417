//! Exponential backoff for threads polling a phase generation.
//!
//! The first rounds issue growing batches of CPU `spin_loop` hints
//! (1, 2, 4, ...). Once the configured limit is reached every further
//! [`SpinWait::snooze`] yields the thread to the OS scheduler instead, so a
//! long phase does not starve other runnable work.

use core::hint;
use std::thread;

use crate::config::SpinConfig;

/// Backoff state for a single wait.
///
/// # Examples
///
/// ```
/// use foundation_phaser::{SpinConfig, SpinWait};
///
/// let mut backoff = SpinWait::with_config(SpinConfig::new().spin_limit(2));
/// backoff.snooze();
/// backoff.snooze();
/// assert!(backoff.is_yielding());
/// ```
#[derive(Debug)]
pub struct SpinWait {
    counter: u32,
    limit: u32,
}

impl SpinWait {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::with_config(SpinConfig::new())
    }

    #[inline]
    #[must_use]
    pub const fn with_config(config: SpinConfig) -> Self {
        Self {
            counter: 0,
            limit: config.get_spin_limit(),
        }
    }

    /// Waits a little, longer on each call until the limit, then yields.
    #[inline]
    pub fn snooze(&mut self) {
        if self.counter >= self.limit {
            thread::yield_now();
            return;
        }

        // Exponential backoff: 1, 2, 4, 8, ...
        let spins = 1u32 << self.counter.min(31);
        for _ in 0..spins {
            hint::spin_loop();
        }

        self.counter += 1;
    }

    /// Returns how many spinning rounds have run so far.
    #[inline]
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Returns `true` once `snooze` has switched to yielding.
    #[inline]
    #[must_use]
    pub fn is_yielding(&self) -> bool {
        self.counter >= self.limit
    }

    #[inline]
    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

impl Default for SpinWait {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
