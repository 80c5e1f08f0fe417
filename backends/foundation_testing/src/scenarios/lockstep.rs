//! Lockstep rounds with boundary-crossing detection.
//!
//! Every thread bumps a shared arrival tally right before it arrives. When a
//! thread starts phase `k` (counted from 0), all `threads * k` bumps of the
//! earlier phases must be visible and its own bump for phase `k` must not be
//! there yet, so the tally lies in `[threads * k, threads * (k + 1))`. A value
//! outside that window means some thread was released early or ran ahead
//! into a later phase.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use foundation_phaser::Phaser;

use crate::stress::{StressConfig, StressHarness, StressResult};

/// Runs lockstep rounds over `phaser` and counts boundary violations as
/// failures.
///
/// # Examples
///
/// ```
/// use foundation_phaser::SpinPhaser;
/// use foundation_testing::scenarios::run_lockstep;
/// use foundation_testing::stress::StressConfig;
/// use std::sync::Arc;
///
/// let config = StressConfig::new().threads(3).phases(200);
/// let result = run_lockstep(Arc::new(SpinPhaser::new(3)), config);
/// assert_eq!(result.failures, 0);
/// ```
///
/// # Panics
///
/// Panics if the phaser's participant count differs from the configured
/// thread count.
#[must_use]
pub fn run_lockstep<P>(phaser: Arc<P>, config: StressConfig) -> StressResult
where
    P: Phaser + 'static,
{
    let threads = config.get_thread_count();
    let tally = Arc::new(AtomicUsize::new(0));

    StressHarness::new(config).run(phaser, move |_thread_id, phase| {
        let seen = tally.load(Ordering::Acquire);
        let in_window = seen >= threads * phase && seen < threads * (phase + 1);
        tally.fetch_add(1, Ordering::AcqRel);
        in_window
    })
}
