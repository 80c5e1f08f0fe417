//! Blocking phaser whose group can shrink or grow between phases.
//!
//! Whenever a phase completes, the closing thread runs a completion callback
//! before anyone is released. A non-negative return value becomes the
//! participant count of the next phase; a negative one keeps the current
//! count. Workers that finish their share early can therefore stop
//! participating without a new barrier being built.

use core::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

use crate::blocking::Parker;
use crate::errors::PhaserResult;
use crate::logs;
use crate::phaser::{PhaseWaitResult, Phaser};
use crate::state::{Arrival, Departure, PhaseState};

/// Completion callback return value that leaves the participant count alone.
pub const KEEP_PARTICIPANTS: isize = -1;

type Completion = Box<dyn FnMut() -> isize + Send>;

/// A cyclic barrier with a per-phase completion callback.
///
/// The callback runs on whichever thread closes the phase, so it must not
/// rely on thread identity, and it must not arrive at the phaser it belongs
/// to (such an arrival is reported as
/// [`crate::PhaserError::ArrivalOverflow`]). Returning a count larger than
/// the number of threads that will actually arrive blocks the next phase
/// forever.
///
/// If the callback panics, the phase is still released with the participant
/// count unchanged, and the panic then continues on the closing thread.
///
/// # Examples
///
/// ```
/// use foundation_phaser::{ElasticPhaser, KEEP_PARTICIPANTS};
/// use std::sync::Arc;
/// use std::thread;
///
/// // Two workers for the first phase, then only one.
/// let mut phases = 0;
/// let phaser = Arc::new(ElasticPhaser::new(2, move || {
///     phases += 1;
///     if phases == 1 { 1 } else { KEEP_PARTICIPANTS }
/// }));
///
/// let short = Arc::clone(&phaser);
/// let handle = thread::spawn(move || {
///     short.arrive_and_wait();
/// });
///
/// phaser.arrive_and_wait();
/// handle.join().unwrap();
///
/// assert_eq!(phaser.participant_count(), 1);
/// phaser.arrive_and_wait();
/// assert_eq!(phaser.generation(), 2);
/// ```
pub struct ElasticPhaser {
    state: PhaseState,
    parker: Parker,
    on_phase_complete: Mutex<Completion>,
}

impl ElasticPhaser {
    /// Creates a phaser that runs `on_phase_complete` at every phase boundary.
    pub fn new<F>(participants: usize, on_phase_complete: F) -> Self
    where
        F: FnMut() -> isize + Send + 'static,
    {
        Self {
            state: PhaseState::new(participants),
            parker: Parker::new(),
            on_phase_complete: Mutex::new(Box::new(on_phase_complete) as Completion),
        }
    }

    /// Creates a phaser whose callback always keeps the participant count,
    /// which behaves exactly like [`crate::BlockingPhaser`].
    #[must_use]
    pub fn fixed(participants: usize) -> Self {
        Self::new(participants, || KEEP_PARTICIPANTS)
    }

    /// See [`Phaser::try_arrive_and_wait`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::PhaserError::ArrivalOverflow`] on an extra arrival.
    ///
    /// # Panics
    ///
    /// Resumes a panic raised by the completion callback on the closing thread.
    pub fn try_arrive_and_wait(&self) -> PhaserResult<PhaseWaitResult> {
        match self.state.arrive()? {
            Arrival::Vacuous => Ok(PhaseWaitResult::new(self.state.generation(), false)),
            Arrival::Closing { .. } => Ok(PhaseWaitResult::new(self.release(), true)),
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
    ///
    /// # Panics
    ///
    /// Resumes a panic raised by the completion callback on the closing thread.
    pub fn try_arrive_and_drop(&self) -> PhaserResult<()> {
        if let Departure::Closing { .. } = self.state.depart()? {
            self.release();
        }
        Ok(())
    }

    /// Arrives and sleeps until every participant has arrived or dropped.
    ///
    /// # Panics
    ///
    /// Panics if more threads arrive in a phase than there are participants,
    /// or if this thread closed the phase and the completion callback panicked.
    pub fn arrive_and_wait(&self) -> PhaseWaitResult {
        Phaser::arrive_and_wait(self)
    }

    /// Counts as this thread's arrival and removes it from later phases.
    ///
    /// # Panics
    ///
    /// Panics if more threads arrive in a phase than there are participants,
    /// or if this thread closed the phase and the completion callback panicked.
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

    /// Runs the completion callback, then reopens the phase with the
    /// participant count it asked for.
    fn release(&self) -> u64 {
        let outcome = {
            let mut on_phase_complete = self
                .on_phase_complete
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            panic::catch_unwind(AssertUnwindSafe(|| (*on_phase_complete)()))
        };

        match outcome {
            Ok(directive) => {
                // Negative directives fail the conversion and keep the count.
                let next_participants = usize::try_from(directive).ok();
                if let Some(next) = next_participants {
                    logs::debug!(
                        from = self.state.participants(),
                        to = next,
                        "completion callback resized the group"
                    );
                }
                self.parker.release(&self.state, next_participants)
            }
            Err(payload) => {
                logs::error!(
                    generation = self.state.generation(),
                    "completion callback panicked, releasing phase unchanged"
                );
                self.parker.release(&self.state, None);
                panic::resume_unwind(payload)
            }
        }
    }
}

impl Phaser for ElasticPhaser {
    fn try_arrive_and_wait(&self) -> PhaserResult<PhaseWaitResult> {
        ElasticPhaser::try_arrive_and_wait(self)
    }

    fn try_arrive_and_drop(&self) -> PhaserResult<()> {
        ElasticPhaser::try_arrive_and_drop(self)
    }

    fn participant_count(&self) -> usize {
        ElasticPhaser::participant_count(self)
    }

    fn generation(&self) -> u64 {
        ElasticPhaser::generation(self)
    }
}

impl fmt::Debug for ElasticPhaser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticPhaser")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhaserError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, OnceLock, Weak};
    use std::thread;

    /// WHY: The default callback must reproduce fixed membership
    /// WHAT: `fixed` keeps the participant count across phases
    #[test]
    fn test_fixed_keeps_count() {
        let phaser = ElasticPhaser::fixed(1);
        for expected in 1..=3 {
            assert_eq!(phaser.arrive_and_wait().generation(), expected);
            assert_eq!(phaser.participant_count(), 1);
        }
    }

    /// WHY: A non-negative return overrides the count regardless of its old value
    /// WHAT: Returning 3 after a one-thread phase makes the next phase wait for three
    #[test]
    fn test_callback_grows_group() {
        let mut calls = 0;
        let phaser = Arc::new(ElasticPhaser::new(1, move || {
            calls += 1;
            if calls == 1 {
                3
            } else {
                KEEP_PARTICIPANTS
            }
        }));

        assert!(phaser.arrive_and_wait().is_leader());
        assert_eq!(phaser.participant_count(), 3);

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let phaser = Arc::clone(&phaser);
                thread::spawn(move || phaser.arrive_and_wait().generation())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
        assert_eq!(phaser.participant_count(), 3);
    }

    /// WHY: A negative return means "no change"
    /// WHAT: Returning -1 leaves the count as the drop left it
    #[test]
    fn test_negative_return_keeps_dropped_count() {
        let phaser = ElasticPhaser::new(3, || -1);
        phaser.arrive_and_drop();
        phaser.arrive_and_drop();
        assert_eq!(phaser.participant_count(), 1);

        assert!(phaser.arrive_and_wait().is_leader());
        assert_eq!(phaser.participant_count(), 1);
    }

    /// WHY: A departure that closes the phase must run the callback too
    /// WHAT: The parked waiter is released by a peer's drop and the callback's count applies
    #[test]
    fn test_drop_closing_phase_runs_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let phaser = Arc::new(ElasticPhaser::new(2, move || {
            counter.fetch_add(1, Ordering::Relaxed);
            2
        }));

        let waiter = Arc::clone(&phaser);
        let handle = thread::spawn(move || waiter.arrive_and_wait());

        while phaser.state.arrivals() != 1 {
            thread::yield_now();
        }
        phaser.arrive_and_drop();

        let released = handle.join().unwrap();
        assert!(!released.is_leader());
        assert_eq!(released.generation(), 1);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(phaser.participant_count(), 2);
        assert_eq!(phaser.generation(), 1);
    }

    /// WHY: Shrinking to zero must open the barrier for good
    /// WHAT: After a callback returns 0, arrivals never block
    #[test]
    fn test_callback_shrinks_to_zero() {
        let phaser = ElasticPhaser::new(1, || 0);
        assert_eq!(phaser.arrive_and_wait().generation(), 1);
        assert_eq!(phaser.participant_count(), 0);

        let result = phaser.arrive_and_wait();
        assert!(!result.is_leader());
        assert_eq!(result.generation(), 1);
    }

    /// WHY: The callback runs exactly once per completed phase
    /// WHAT: Four threads over ten phases invoke it ten times
    #[test]
    fn test_callback_once_per_phase() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let phaser = Arc::new(ElasticPhaser::new(4, move || {
            counter.fetch_add(1, Ordering::Relaxed);
            KEEP_PARTICIPANTS
        }));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let phaser = Arc::clone(&phaser);
                thread::spawn(move || {
                    for _ in 0..10 {
                        phaser.arrive_and_wait();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(calls.load(Ordering::Relaxed), 10);
        assert_eq!(phaser.generation(), 10);
    }

    /// WHY: A panicking callback must not strand the other participants
    /// WHAT: The waiter is released and the closer sees the panic
    #[test]
    fn test_callback_panic_releases_waiters() {
        let phaser = Arc::new(ElasticPhaser::new(2, || panic!("completion failed")));

        let waiter = Arc::clone(&phaser);
        let handle = thread::spawn(move || {
            panic::catch_unwind(AssertUnwindSafe(|| waiter.arrive_and_wait().generation()))
        });
        let mine = panic::catch_unwind(AssertUnwindSafe(|| phaser.arrive_and_wait().generation()));
        let theirs = handle.join().unwrap();

        // Exactly one side closed the phase and carried the panic.
        assert!(mine.is_err() ^ theirs.is_err());
        assert_eq!(mine.or(theirs).ok(), Some(1));
        assert_eq!(phaser.generation(), 1);
        assert_eq!(phaser.participant_count(), 2);
    }

    /// WHY: Re-entering the phaser from its own callback is misuse
    /// WHAT: The reentrant arrival is reported instead of deadlocking
    #[test]
    fn test_reentrant_callback_is_reported() {
        let slot: Arc<OnceLock<Weak<ElasticPhaser>>> = Arc::new(OnceLock::new());
        let observed: Arc<Mutex<Option<PhaserResult<PhaseWaitResult>>>> =
            Arc::new(Mutex::new(None));

        let callback_slot = Arc::clone(&slot);
        let callback_observed = Arc::clone(&observed);
        let phaser = Arc::new(ElasticPhaser::new(1, move || {
            if let Some(phaser) = callback_slot.get().and_then(Weak::upgrade) {
                *callback_observed.lock().unwrap() = Some(phaser.try_arrive_and_wait());
            }
            KEEP_PARTICIPANTS
        }));
        slot.set(Arc::downgrade(&phaser)).unwrap();

        assert_eq!(phaser.arrive_and_wait().generation(), 1);
        assert_eq!(
            *observed.lock().unwrap(),
            Some(Err(PhaserError::ArrivalOverflow { generation: 0 }))
        );
    }
}
