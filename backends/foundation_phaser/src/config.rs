//! Tuning knobs for the busy-waiting phaser.

/// Default number of exponential backoff rounds before a spinning waiter
/// starts yielding its time slice. Six rounds is 63 `spin_loop` hints.
pub const DEFAULT_SPIN_LIMIT: u32 = 6;

/// Configuration for [`crate::SpinPhaser`] waiters.
///
/// # Examples
///
/// ```
/// use foundation_phaser::{SpinConfig, SpinPhaser};
///
/// // Yield on every poll, never burn cycles on `spin_loop` hints.
/// let config = SpinConfig::new().spin_limit(0);
/// let phaser = SpinPhaser::with_config(4, config);
/// assert_eq!(phaser.participant_count(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinConfig {
    spin_limit: u32,
}

impl SpinConfig {
    /// Creates a configuration with [`DEFAULT_SPIN_LIMIT`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            spin_limit: DEFAULT_SPIN_LIMIT,
        }
    }

    /// Sets how many backoff rounds run before the waiter yields.
    ///
    /// Values above 31 are clamped when spinning.
    #[must_use]
    pub const fn spin_limit(mut self, rounds: u32) -> Self {
        self.spin_limit = rounds;
        self
    }

    #[must_use]
    pub const fn get_spin_limit(&self) -> u32 {
        self.spin_limit
    }
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self::new()
    }
}
