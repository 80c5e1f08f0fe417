//! The capability every phaser exposes.

use crate::errors::PhaserResult;

/// Result returned from a phaser's `arrive_and_wait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseWaitResult {
    generation: u64,
    is_leader: bool,
}

impl PhaseWaitResult {
    #[inline]
    pub(crate) const fn new(generation: u64, is_leader: bool) -> Self {
        Self {
            generation,
            is_leader,
        }
    }

    /// Generation the caller was released into.
    ///
    /// Every participant of a phase observes the same value, exactly one
    /// more than the generation current when they arrived. An arrival on a
    /// barrier with no participants reports the current generation.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` if this thread's arrival completed the phase.
    #[inline]
    #[must_use]
    pub const fn is_leader(&self) -> bool {
        self.is_leader
    }
}

/// A cyclic rendezvous barrier.
///
/// Each phase completes once every current participant has either arrived
/// with [`Phaser::arrive_and_wait`] or left with [`Phaser::arrive_and_drop`].
/// The barrier then reopens for the next phase on its own.
///
/// # Caller obligations
///
/// - A thread that called `arrive_and_drop` must not arrive again. Use
///   [`crate::Participant`] to have the compiler enforce this.
/// - A participant that never arrives blocks every other participant
///   forever. There is no timeout and no cancellation.
/// - A phaser must not be dropped while threads are waiting on it; sharing
///   it through an `Arc` makes this hold automatically.
///
/// Extra arrivals within a phase are detected and reported as
/// [`crate::PhaserError::ArrivalOverflow`]; the non-`try_` methods panic
/// with that error instead.
pub trait Phaser: Send + Sync {
    /// Arrives at the current phase and waits for it to complete.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PhaserError::ArrivalOverflow`] if the phase has
    /// already received all of its arrivals.
    fn try_arrive_and_wait(&self) -> PhaserResult<PhaseWaitResult>;

    /// Arrives at the current phase and leaves the group for good.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PhaserError::ArrivalOverflow`] if the phase has
    /// already received all of its arrivals.
    fn try_arrive_and_drop(&self) -> PhaserResult<()>;

    /// Number of threads each phase currently waits for.
    fn participant_count(&self) -> usize;

    /// Number of phases completed so far.
    fn generation(&self) -> u64;

    /// Arrives at the current phase and waits for it to complete.
    ///
    /// # Panics
    ///
    /// Panics if the phase has already received all of its arrivals.
    fn arrive_and_wait(&self) -> PhaseWaitResult {
        match self.try_arrive_and_wait() {
            Ok(result) => result,
            Err(err) => panic!("{err}"),
        }
    }

    /// Arrives at the current phase and leaves the group for good.
    ///
    /// # Panics
    ///
    /// Panics if the phase has already received all of its arrivals.
    fn arrive_and_drop(&self) {
        if let Err(err) = self.try_arrive_and_drop() {
            panic!("{err}");
        }
    }
}
