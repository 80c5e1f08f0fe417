//! The counting protocol shared by every phaser.
//!
//! A phase is tracked with three atomics:
//!
//! - `participants`: how many threads each phase waits for.
//! - `arrivals`: how many of them have not arrived yet in the current phase.
//! - `generation`: how many phases have completed.
//!
//! The generation, not the arrival countdown, is the completion signal. The
//! countdown is refilled on every phase, so a waiter that only watched it
//! could not tell "still counting down" from "already refilled for the next
//! round". Waiters snapshot the generation before arriving and are released
//! once it moves.
//!
//! The closing thread refills `arrivals` before it bumps `generation` with
//! release ordering, so anyone who acquires the new generation also sees the
//! refilled countdown and every write made by any participant before it
//! arrived.

use core::fmt;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::errors::{PhaserError, PhaserResult};
use crate::logs;

/// What an arrival did to the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arrival {
    /// There are no participants: the barrier is permanently open.
    Vacuous,
    /// The caller's decrement hit zero; it must reopen the phase.
    Closing { generation: u64 },
    /// Other participants are outstanding; wait until the generation moves.
    Waiting { generation: u64 },
}

/// What a departure did to the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Departure {
    Vacuous,
    Closing { generation: u64 },
    Departed,
}

pub(crate) struct PhaseState {
    participants: AtomicUsize,
    arrivals: AtomicUsize,
    generation: AtomicU64,
}

impl PhaseState {
    pub(crate) const fn new(participants: usize) -> Self {
        Self {
            participants: AtomicUsize::new(participants),
            arrivals: AtomicUsize::new(participants),
            generation: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn participants(&self) -> usize {
        self.participants.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Arrivals still outstanding in the current phase.
    #[cfg(test)]
    pub(crate) fn arrivals(&self) -> usize {
        self.arrivals.load(Ordering::Acquire)
    }

    /// Counts the caller's arrival in the current phase.
    pub(crate) fn arrive(&self) -> PhaserResult<Arrival> {
        if self.participants() == 0 {
            return Ok(Arrival::Vacuous);
        }

        let generation = self.generation();
        if self.count_down(generation)? == 0 {
            Ok(Arrival::Closing { generation })
        } else {
            Ok(Arrival::Waiting { generation })
        }
    }

    /// Counts the caller's arrival and removes it from all later phases.
    ///
    /// The participant count drops before the countdown does, so whichever
    /// thread closes the phase refills the countdown without the departed
    /// thread in it.
    pub(crate) fn depart(&self) -> PhaserResult<Departure> {
        if self
            .participants
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_err()
        {
            return Ok(Departure::Vacuous);
        }

        let generation = self.generation();
        match self.count_down(generation) {
            Ok(remaining) => {
                logs::debug!(generation, remaining, "participant departed");
                if remaining == 0 {
                    Ok(Departure::Closing { generation })
                } else {
                    Ok(Departure::Departed)
                }
            }
            Err(err) => {
                self.participants.fetch_add(1, Ordering::AcqRel);
                Err(err)
            }
        }
    }

    /// Starts the next phase and returns its generation.
    ///
    /// `next_participants` overrides the participant count first when set.
    /// Must only be called by the thread whose arrival closed the phase.
    pub(crate) fn reopen(&self, next_participants: Option<usize>) -> u64 {
        let participants = match next_participants {
            Some(count) => {
                self.participants.store(count, Ordering::Release);
                count
            }
            None => self.participants(),
        };

        self.arrivals.store(participants, Ordering::Release);
        // Wraps after 2^64 phases, which no process lives to see.
        let generation = self.generation.fetch_add(1, Ordering::AcqRel).wrapping_add(1);

        logs::debug!(generation, participants, "phase released");
        generation
    }

    /// Decrements the countdown, refusing to go below zero.
    fn count_down(&self, generation: u64) -> PhaserResult<usize> {
        match self
            .arrivals
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(previous) => Ok(previous - 1),
            Err(_) => {
                logs::warning!(generation, "arrival found an exhausted countdown");
                Err(PhaserError::ArrivalOverflow { generation })
            }
        }
    }
}

impl fmt::Debug for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseState")
            .field("participants", &self.participants.load(Ordering::Relaxed))
            .field("arrivals", &self.arrivals.load(Ordering::Relaxed))
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}
