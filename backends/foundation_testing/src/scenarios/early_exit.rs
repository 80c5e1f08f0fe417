//! Workers with uneven amounts of work sharing one phaser.
//!
//! Worker `i` has `work[i]` phases to run. Finished workers stop
//! participating in one of these ways:
//!
//! - [`run_with_departures`]: every worker leaves through
//!   [`foundation_phaser::Participant::arrive_and_drop`] once its work is done.
//! - [`run_with_elastic_departures`]: the same departures on an
//!   [`ElasticPhaser`], whose callback keeps whatever count they leave.
//! - [`run_with_elastic_resize`]: the [`ElasticPhaser`] completion callback
//!   shrinks the group to the workers that still have work, and finished
//!   workers just return.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use foundation_phaser::{enlist, BlockingPhaser, ElasticPhaser, Phaser, KEEP_PARTICIPANTS};

/// What an early-exit run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarlyExitReport {
    /// Phases each worker completed, in worker order
    pub phases_per_worker: Vec<usize>,
    /// Phaser generation once every worker has finished
    pub final_generation: u64,
    /// Participant count once every worker has finished
    pub final_participants: usize,
    /// Completion callback runs, zero for phasers without a callback
    pub completion_calls: usize,
}

/// Runs the workers on a [`BlockingPhaser`], each departing when done.
///
/// The departure counts as the worker's arrival in the phase after its last
/// one, so the final generation is `max(work) + 1`.
///
/// # Panics
///
/// Panics if a worker thread panics.
#[must_use]
pub fn run_with_departures(work: &[usize]) -> EarlyExitReport {
    let phaser = Arc::new(BlockingPhaser::new(work.len()));
    let phases_per_worker = join_all(depart_when_done(Arc::clone(&phaser), work));

    EarlyExitReport {
        phases_per_worker,
        final_generation: phaser.generation(),
        final_participants: phaser.participant_count(),
        completion_calls: 0,
    }
}

/// Runs the workers on an [`ElasticPhaser`], each departing when done.
///
/// Phases closed by a departure still run the callback, so it runs once
/// for each of the `max(work) + 1` phases.
///
/// # Panics
///
/// Panics if a worker thread panics.
#[must_use]
pub fn run_with_elastic_departures(work: &[usize]) -> EarlyExitReport {
    let calls = Arc::new(AtomicUsize::new(0));
    let callback_calls = Arc::clone(&calls);
    let phaser = Arc::new(ElasticPhaser::new(work.len(), move || {
        callback_calls.fetch_add(1, Ordering::Relaxed);
        KEEP_PARTICIPANTS
    }));
    let phases_per_worker = join_all(depart_when_done(Arc::clone(&phaser), work));

    EarlyExitReport {
        phases_per_worker,
        final_generation: phaser.generation(),
        final_participants: phaser.participant_count(),
        completion_calls: calls.load(Ordering::Relaxed),
    }
}

fn depart_when_done<P: Phaser + 'static>(
    phaser: Arc<P>,
    work: &[usize],
) -> Vec<thread::JoinHandle<usize>> {
    enlist(phaser)
        .into_iter()
        .zip(work.iter().copied())
        .map(|(participant, phases)| {
            thread::spawn(move || {
                for _ in 0..phases {
                    participant.arrive_and_wait();
                }
                participant.arrive_and_drop();
                phases
            })
        })
        .collect()
}

/// Runs the workers on an [`ElasticPhaser`] sized by the callback.
///
/// After phase `k` completes the callback returns how many workers have
/// more than `k + 1` phases of work, which is exactly who arrives next.
///
/// # Panics
///
/// Panics if a worker thread panics.
#[must_use]
pub fn run_with_elastic_resize(work: &[usize]) -> EarlyExitReport {
    let remaining: Arc<[usize]> = work.into();
    let completed = Arc::new(AtomicUsize::new(0));

    let callback_work = Arc::clone(&remaining);
    let callback_completed = Arc::clone(&completed);
    let active_at_start = work.iter().filter(|&&phases| phases > 0).count();

    let phaser = Arc::new(ElasticPhaser::new(active_at_start, move || {
        let next_phase = callback_completed.fetch_add(1, Ordering::Relaxed) + 1;
        let active = callback_work
            .iter()
            .filter(|&&phases| phases > next_phase)
            .count();
        isize::try_from(active).unwrap_or(isize::MAX)
    }));

    let handles: Vec<_> = remaining
        .iter()
        .copied()
        .map(|phases| {
            let phaser = Arc::clone(&phaser);
            thread::spawn(move || {
                for _ in 0..phases {
                    phaser.arrive_and_wait();
                }
                phases
            })
        })
        .collect();

    let phases_per_worker = join_all(handles);
    EarlyExitReport {
        phases_per_worker,
        final_generation: phaser.generation(),
        final_participants: phaser.participant_count(),
        completion_calls: completed.load(Ordering::Relaxed),
    }
}

fn join_all(handles: Vec<thread::JoinHandle<usize>>) -> Vec<usize> {
    handles
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .collect()
}
