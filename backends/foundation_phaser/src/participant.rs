//! Owned participation tokens.
//!
//! A [`Participant`] turns the "never arrive after dropping" obligation into
//! a move: [`Participant::arrive_and_drop`] consumes the handle. A handle
//! that goes out of scope without departing (for instance while its thread
//! unwinds from a panic) departs on its way out, so the remaining
//! participants are not left waiting for it.

use std::sync::Arc;

use crate::logs;
use crate::phaser::{PhaseWaitResult, Phaser};

/// One thread's membership in a phaser.
///
/// # Examples
///
/// ```
/// use foundation_phaser::{enlist, BlockingPhaser};
/// use std::sync::Arc;
/// use std::thread;
///
/// let phaser = Arc::new(BlockingPhaser::new(3));
///
/// let handles: Vec<_> = enlist(Arc::clone(&phaser))
///     .into_iter()
///     .enumerate()
///     .map(|(id, participant)| {
///         thread::spawn(move || {
///             participant.arrive_and_wait();
///             if id == 0 {
///                 participant.arrive_and_drop();
///                 return;
///             }
///             participant.arrive_and_wait();
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// // Handles still held when their thread ends depart on drop.
/// assert_eq!(phaser.participant_count(), 0);
/// ```
pub struct Participant<P: Phaser> {
    phaser: Arc<P>,
    departed: bool,
}

impl<P: Phaser> Participant<P> {
    /// Wraps one existing participant slot of `phaser`.
    ///
    /// The handle does not register anything: the phaser's participant
    /// count must already include it.
    #[must_use]
    pub fn new(phaser: Arc<P>) -> Self {
        Self {
            phaser,
            departed: false,
        }
    }

    /// Arrives at the current phase and waits for it to complete.
    ///
    /// # Panics
    ///
    /// Panics if more threads arrive in a phase than there are participants.
    pub fn arrive_and_wait(&self) -> PhaseWaitResult {
        self.phaser.arrive_and_wait()
    }

    /// Arrives at the current phase and gives up this participant slot.
    ///
    /// # Panics
    ///
    /// Panics if more threads arrive in a phase than there are participants.
    pub fn arrive_and_drop(mut self) {
        self.departed = true;
        self.phaser.arrive_and_drop();
    }

    /// The phaser this handle participates in.
    #[must_use]
    pub fn phaser(&self) -> &Arc<P> {
        &self.phaser
    }
}

impl<P: Phaser> Drop for Participant<P> {
    fn drop(&mut self) {
        if self.departed {
            return;
        }

        logs::debug!(
            generation = self.phaser.generation(),
            "participant dropped without departing"
        );
        if let Err(err) = self.phaser.try_arrive_and_drop() {
            logs::error!(%err, "participant could not depart on drop");
        }
    }
}

/// Creates one [`Participant`] per slot the phaser currently has.
#[must_use]
pub fn enlist<P: Phaser>(phaser: Arc<P>) -> Vec<Participant<P>> {
    (0..phaser.participant_count())
        .map(|_| Participant::new(Arc::clone(&phaser)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockingPhaser, SpinPhaser};
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;

    /// WHY: `enlist` hands out exactly the current membership
    /// WHAT: One handle per participant
    #[test]
    fn test_enlist_matches_participants() {
        let phaser = Arc::new(SpinPhaser::new(5));
        assert_eq!(enlist(Arc::clone(&phaser)).len(), 5);
    }

    /// WHY: Consuming departure must not depart a second time on drop
    /// WHAT: `arrive_and_drop` reduces the count by exactly one
    #[test]
    fn test_arrive_and_drop_departs_once() {
        let phaser = Arc::new(SpinPhaser::new(2));
        let participant = Participant::new(Arc::clone(&phaser));

        participant.arrive_and_drop();
        assert_eq!(phaser.participant_count(), 1);
    }

    /// WHY: Workers holding only a handle still need to inspect the phaser
    /// WHAT: `phaser()` exposes the shared instance and its live state
    #[test]
    fn test_handle_exposes_its_phaser() {
        let phaser = Arc::new(SpinPhaser::new(2));
        let mut participants = enlist(Arc::clone(&phaser));
        let first = participants.pop().unwrap();
        let second = participants.pop().unwrap();

        assert!(Arc::ptr_eq(first.phaser(), &phaser));
        second.arrive_and_drop();
        assert_eq!(first.phaser().participant_count(), 1);

        first.arrive_and_wait();
        assert_eq!(first.phaser().generation(), 1);
    }

    /// WHY: Letting a handle fall out of scope must not strand peers
    /// WHAT: Dropping an unused handle departs, releasing the waiting peer
    #[test]
    fn test_drop_without_departing_releases_peer() {
        let phaser = Arc::new(BlockingPhaser::new(2));
        let mut participants = enlist(Arc::clone(&phaser));
        let stay = participants.pop().unwrap();
        let leave = participants.pop().unwrap();

        let handle = thread::spawn(move || stay.arrive_and_wait().generation());
        drop(leave);

        assert_eq!(handle.join().unwrap(), 1);
        assert_eq!(phaser.participant_count(), 0);
    }

    /// WHY: A worker that panics mid-phase must leave the group
    /// WHAT: The unwinding handle departs and the other worker finishes
    #[test]
    fn test_panicking_worker_departs() {
        let phaser = Arc::new(BlockingPhaser::new(2));
        let mut participants = enlist(Arc::clone(&phaser));
        let survivor = participants.pop().unwrap();
        let doomed = participants.pop().unwrap();

        let crashed = thread::spawn(move || {
            panic::catch_unwind(AssertUnwindSafe(move || {
                doomed.arrive_and_wait();
                panic!("worker failed");
            }))
            .is_err()
        });

        let generations: Vec<_> = (0..3).map(|_| survivor.arrive_and_wait().generation()).collect();

        assert!(crashed.join().unwrap());
        assert_eq!(generations, vec![1, 2, 3]);
        assert_eq!(phaser.participant_count(), 1);
    }
}
