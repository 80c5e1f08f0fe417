//! Reusable stress testing infrastructure for Foundation phasers.
//!
//! This crate provides:
//! - **Stress test framework**: Configurable phase-synchronized runs
//! - **Common scenarios**: Lockstep rounds, workers leaving early
//! - **Criterion benchmarks**: Comparing spin, blocking and elastic phasers
//!
//! # Examples
//!
//! ```rust
//! use foundation_phaser::SpinPhaser;
//! use foundation_testing::stress::{StressConfig, StressHarness};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let config = StressConfig::new()
//!     .threads(4)
//!     .phases(250);
//!
//! let counter = Arc::new(AtomicUsize::new(0));
//! let harness = StressHarness::new(config);
//!
//! let counter_clone = Arc::clone(&counter);
//! let results = harness.run(Arc::new(SpinPhaser::new(4)), move |_thread_id, _phase| {
//!     counter_clone.fetch_add(1, Ordering::Relaxed);
//!     true
//! });
//!
//! assert_eq!(results.successes, 1000); // 4 threads * 250 phases
//! assert!(results.success_rate() > 0.99);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Common for testing crates

pub mod scenarios;
pub mod stress;

// Re-export commonly used items
pub use stress::{StressConfig, StressHarness, StressResult};
