//! Phaser whose waiters park on a condition variable.
//!
//! Arrivals use the same lock-free countdown as [`crate::SpinPhaser`]; only
//! threads that have to wait touch the mutex. The closing thread reopens the
//! phase while holding that mutex, so a waiter that has checked the
//! generation under the lock is guaranteed to be parked before the
//! notification goes out.

use core::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::errors::PhaserResult;
use crate::phaser::{PhaseWaitResult, Phaser};
use crate::state::{Arrival, Departure, PhaseState};

/// Mutex and condition variable pair that parks waiters between phases.
///
/// The mutex guards no data of its own: it only orders generation checks
/// against generation bumps.
pub(crate) struct Parker {
    lock: Mutex<()>,
    released: Condvar,
}

impl Parker {
    pub(crate) const fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            released: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until `state` has moved past `generation`.
    ///
    /// Spurious wakeups are absorbed by re-checking the generation.
    pub(crate) fn park(&self, state: &PhaseState, generation: u64) {
        let guard = self.lock();
        let guard = self
            .released
            .wait_while(guard, |_| state.generation() == generation)
            .unwrap_or_else(PoisonError::into_inner);
        drop(guard);
    }

    /// Reopens the phase under the lock and wakes every parked waiter.
    pub(crate) fn release(&self, state: &PhaseState, next_participants: Option<usize>) -> u64 {
        let guard = self.lock();
        let generation = state.reopen(next_participants);
        drop(guard);

        self.released.notify_all();
        generation
    }
}

/// A cyclic barrier whose waiters sleep instead of spinning.
///
/// # Examples
///
/// ```
/// use foundation_phaser::BlockingPhaser;
/// use std::sync::Arc;
/// use std::thread;
///
/// let phaser = Arc::new(BlockingPhaser::new(4));
///
/// let handles: Vec<_> = (0..4)
///     .map(|i| {
///         let phaser = Arc::clone(&phaser);
///         thread::spawn(move || {
///             println!("worker {i} before the phase boundary");
///             phaser.arrive_and_wait();
///             println!("worker {i} after the phase boundary");
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(phaser.generation(), 1);
/// ```
pub struct BlockingPhaser {
    state: PhaseState,
    parker: Parker,
}

impl BlockingPhaser {
    /// Creates a phaser that waits for `participants` threads each phase.
    ///
    /// A count of zero creates a barrier that never blocks.
    #[must_use]
    pub const fn new(participants: usize) -> Self {
        Self {
            state: PhaseState::new(participants),
            parker: Parker::new(),
        }
    }

    /// See [`Phaser::try_arrive_and_wait`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::PhaserError::ArrivalOverflow`] on an extra arrival.
    pub fn try_arrive_and_wait(&self) -> PhaserResult<PhaseWaitResult> {
        match self.state.arrive()? {
            Arrival::Vacuous => Ok(PhaseWaitResult::new(self.state.generation(), false)),
            Arrival::Closing { .. } => Ok(PhaseWaitResult::new(
                self.parker.release(&self.state, None),
                true,
            )),
            Arrival::Waiting { generation } => {
                self.parker.park(&self.state, generation);
                Ok(PhaseWaitResult::new(generation.wrapping_add(1), false))
            }
        }
    }

    /// See [`Phaser::try_arrive_and_drop`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::PhaserError::ArrivalOverflow`] on an extra arrival.
    pub fn try_arrive_and_drop(&self) -> PhaserResult<()> {
        if let Departure::Closing { .. } = self.state.depart()? {
            self.parker.release(&self.state, None);
        }
        Ok(())
    }

    /// Arrives and sleeps until every participant has arrived or dropped.
    ///
    /// # Panics
    ///
    /// Panics if more threads arrive in a phase than there are participants.
    pub fn arrive_and_wait(&self) -> PhaseWaitResult {
        Phaser::arrive_and_wait(self)
    }

    /// Counts as this thread's arrival and removes it from later phases.
    ///
    /// # Panics
    ///
    /// Panics if more threads arrive in a phase than there are participants.
    pub fn arrive_and_drop(&self) {
        Phaser::arrive_and_drop(self);
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.state.participants()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.generation()
    }
}

impl Phaser for BlockingPhaser {
    fn try_arrive_and_wait(&self) -> PhaserResult<PhaseWaitResult> {
        BlockingPhaser::try_arrive_and_wait(self)
    }

    fn try_arrive_and_drop(&self) -> PhaserResult<()> {
        BlockingPhaser::try_arrive_and_drop(self)
    }

    fn participant_count(&self) -> usize {
        BlockingPhaser::participant_count(self)
    }

    fn generation(&self) -> u64 {
        BlockingPhaser::generation(self)
    }
}

impl fmt::Debug for BlockingPhaser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingPhaser")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    /// WHY: Validates construction
    /// WHAT: A new phaser reports its participants and generation zero
    #[test]
    fn test_new() {
        let phaser = BlockingPhaser::new(4);
        assert_eq!(phaser.participant_count(), 4);
        assert_eq!(phaser.generation(), 0);
    }

    /// WHY: A barrier with no participants is always open
    /// WHAT: Arrivals return immediately without touching the generation
    #[test]
    fn test_zero_participants() {
        let phaser = BlockingPhaser::new(0);
        for _ in 0..3 {
            assert_eq!(phaser.arrive_and_wait().generation(), 0);
        }
    }

    /// WHY: Exactly one thread closes each phase
    /// WHAT: Across four threads and one phase there is a single leader
    #[test]
    fn test_single_leader_per_phase() {
        let phaser = Arc::new(BlockingPhaser::new(4));
        let leaders = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let phaser = Arc::clone(&phaser);
                let leaders = Arc::clone(&leaders);
                thread::spawn(move || {
                    let result = phaser.arrive_and_wait();
                    if result.is_leader() {
                        leaders.fetch_add(1, Ordering::Relaxed);
                    }
                    result.generation()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(leaders.load(Ordering::Relaxed), 1);
    }

    /// WHY: A parked waiter must be woken by a departure that closes the phase
    /// WHAT: Main waits while a second thread drops; main is released
    #[test]
    fn test_drop_releases_parked_waiter() {
        let phaser = Arc::new(BlockingPhaser::new(2));

        let dropper = Arc::clone(&phaser);
        let handle = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(20));
            dropper.arrive_and_drop();
        });

        let result = phaser.arrive_and_wait();
        handle.join().unwrap();

        assert_eq!(result.generation(), 1);
        assert_eq!(phaser.participant_count(), 1);
    }

    /// WHY: Debug output is used when logging phaser state
    /// WHAT: Debug formatting shows the shared phase counters
    #[test]
    fn test_debug() {
        let debug = format!("{:?}", BlockingPhaser::new(2));
        assert!(debug.contains("BlockingPhaser"));
        assert!(debug.contains("participants: 2"));
    }
}
