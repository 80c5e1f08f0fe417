//! Stress test framework for phasers.
//!
//! Provides configurable phase-synchronized testing with:
//! - Thread count control
//! - Phase count control
//! - Success rate tracking
//! - Per-phase generation checks

use core::time::Duration;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use foundation_phaser::Phaser;

pub mod config;

pub use config::StressConfig;

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressResult {
    /// Per-thread phases whose operation succeeded and whose release
    /// reported the expected generation
    pub successes: usize,
    /// Per-thread phases that failed either check
    pub failures: usize,
    /// Total time taken for the test
    pub duration: Duration,
    /// Number of threads used
    pub thread_count: usize,
    /// Number of phases each thread ran
    pub phases: usize,
}

impl StressResult {
    /// Returns the total number of per-thread phases.
    #[must_use]
    pub const fn total_operations(&self) -> usize {
        self.successes + self.failures
    }

    /// Returns the success rate as a value between 0.0 and 1.0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total_operations() == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_operations() as f64
        }
    }

    /// Returns completed phases per second.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn phases_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.phases as f64 / secs
        }
    }
}

/// Phase-synchronized stress test harness.
///
/// Spawns one thread per participant. Each thread runs the operation for the
/// current phase and then arrives at the phaser, for every configured phase.
pub struct StressHarness {
    config: StressConfig,
}

impl StressHarness {
    /// Creates a new stress test harness with the given configuration.
    #[must_use]
    pub const fn new(config: StressConfig) -> Self {
        Self { config }
    }

    /// Runs a stress test over `phaser` with the given operation closure.
    ///
    /// The closure receives:
    /// - `thread_id`: Index of the thread (`0..thread_count`)
    /// - `phase`: Phase number, counted from 0 for this run
    ///
    /// Returns `true` on success, `false` on failure. A phase also counts as
    /// a failure when the generation reported on release is not the one the
    /// phase should have produced.
    ///
    /// # Examples
    ///
    /// ```
    /// use foundation_phaser::BlockingPhaser;
    /// use foundation_testing::stress::{StressConfig, StressHarness};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let counter = Arc::new(AtomicUsize::new(0));
    /// let config = StressConfig::new().threads(4).phases(100);
    /// let phaser = Arc::new(BlockingPhaser::new(4));
    ///
    /// let counter_clone = Arc::clone(&counter);
    /// let result = StressHarness::new(config).run(phaser, move |_thread_id, _phase| {
    ///     counter_clone.fetch_add(1, Ordering::Relaxed);
    ///     true
    /// });
    ///
    /// assert_eq!(counter.load(Ordering::Relaxed), 400); // 4 threads * 100 phases
    /// assert_eq!(result.successes, 400);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the phaser's participant count differs from the configured
    /// thread count, or if any worker thread panics.
    pub fn run<P, F>(self, phaser: Arc<P>, operation: F) -> StressResult
    where
        P: Phaser + 'static,
        F: Fn(usize, usize) -> bool + Send + Sync + 'static,
    {
        let thread_count = self.config.get_thread_count();
        let phases = self.config.get_phases();
        assert_eq!(
            phaser.participant_count(),
            thread_count,
            "phaser participants must match the configured thread count"
        );

        let start = Instant::now();
        let first_generation = phaser.generation();
        let operation = Arc::new(operation);

        let successes = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(thread_count);

        for thread_id in 0..thread_count {
            let phaser = Arc::clone(&phaser);
            let operation = Arc::clone(&operation);
            let successes = Arc::clone(&successes);
            let failures = Arc::clone(&failures);

            let handle = thread::spawn(move || {
                for (phase, expected) in (first_generation + 1..).take(phases).enumerate() {
                    let succeeded = operation(thread_id, phase);
                    let released = phaser.arrive_and_wait();

                    if succeeded && released.generation() == expected {
                        successes.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });

            handles.push(handle);
        }

        // Wait for all threads to complete
        for handle in handles {
            handle.join().expect("Thread panicked during stress test");
        }

        let result = StressResult {
            successes: successes.load(Ordering::Relaxed),
            failures: failures.load(Ordering::Relaxed),
            duration: start.elapsed(),
            thread_count,
            phases,
        };

        tracing::debug!(
            successes = result.successes,
            failures = result.failures,
            elapsed = ?result.duration,
            "stress run finished"
        );
        result
    }
}
