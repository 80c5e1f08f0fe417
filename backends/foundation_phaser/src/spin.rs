//! Busy-waiting phaser built only from atomics.
//!
//! Waiters poll the phase generation with exponential backoff and then yield
//! on every further poll. There is no lock anywhere, so this suits phases
//! that are sub-microsecond and participant counts no larger than the number
//! of cores. For longer phases use [`crate::BlockingPhaser`].

use core::fmt;

use crate::config::SpinConfig;
use crate::errors::PhaserResult;
use crate::phaser::{PhaseWaitResult, Phaser};
use crate::spin_wait::SpinWait;
use crate::state::{Arrival, Departure, PhaseState};

/// A cyclic barrier whose waiters spin instead of parking.
///
/// # Examples
///
/// ```
/// use foundation_phaser::SpinPhaser;
/// use std::sync::Arc;
/// use std::thread;
///
/// let phaser = Arc::new(SpinPhaser::new(3));
///
/// let handles: Vec<_> = (0..3)
///     .map(|_| {
///         let phaser = Arc::clone(&phaser);
///         thread::spawn(move || {
///             for _ in 0..10 {
///                 phaser.arrive_and_wait();
///             }
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(phaser.generation(), 10);
/// ```
pub struct SpinPhaser {
    state: PhaseState,
    config: SpinConfig,
}

impl SpinPhaser {
    /// Creates a phaser that waits for `participants` threads each phase.
    ///
    /// A count of zero creates a barrier that never blocks.
    ///
    /// Waiters use [`SpinConfig::new`], so they issue
    /// [`crate::DEFAULT_SPIN_LIMIT`] rounds of `spin_loop` hints before they
    /// start yielding. Use [`SpinPhaser::with_config`] with
    /// `SpinConfig::new().spin_limit(0)` to yield on every poll.
    #[must_use]
    pub const fn new(participants: usize) -> Self {
        Self::with_config(participants, SpinConfig::new())
    }

    #[must_use]
    pub const fn with_config(participants: usize, config: SpinConfig) -> Self {
        Self {
            state: PhaseState::new(participants),
            config,
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
            Arrival::Closing { .. } => Ok(PhaseWaitResult::new(self.state.reopen(None), true)),
            Arrival::Waiting { generation } => {
                let mut backoff = SpinWait::with_config(self.config);
                while self.state.generation() == generation {
                    backoff.snooze();
                }
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
            self.state.reopen(None);
        }
        Ok(())
    }

    /// Arrives and spins until every participant has arrived or dropped.
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

impl Phaser for SpinPhaser {
    fn try_arrive_and_wait(&self) -> PhaserResult<PhaseWaitResult> {
        SpinPhaser::try_arrive_and_wait(self)
    }

    fn try_arrive_and_drop(&self) -> PhaserResult<()> {
        SpinPhaser::try_arrive_and_drop(self)
    }

    fn participant_count(&self) -> usize {
        SpinPhaser::participant_count(self)
    }

    fn generation(&self) -> u64 {
        SpinPhaser::generation(self)
    }
}

impl fmt::Debug for SpinPhaser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinPhaser")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish()
    }
}
