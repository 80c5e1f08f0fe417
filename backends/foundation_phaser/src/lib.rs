//! Cyclic rendezvous barriers ("phasers") for OS threads.
//!
//! A phaser lets a group of threads repeatedly meet at a phase boundary:
//! nobody proceeds into phase *k + 1* until every participant has arrived at
//! phase *k* or left the group. Three variants share one counting protocol:
//!
//! - [`SpinPhaser`]: lock-free, waiters spin with backoff and then yield.
//! - [`BlockingPhaser`]: waiters park on a condition variable.
//! - [`ElasticPhaser`]: blocking, plus a completion callback that may resize
//!   the group between phases.
//!
//! All of them implement [`Phaser`], and [`Participant`] handles make the
//! "never arrive after dropping" rule a compile-time one.
//!
//! A release from phase *k* happens-after every participant's arrival in
//! phase *k*, so writes made before arriving are visible to every thread
//! once it is released.
//!
//! There is no timeout or cancellation: a participant that never arrives
//! blocks the rest indefinitely.
//!
//! # Features
//!
//! - `standard` (default): warning and error logs through `tracing`.
//! - `debug_trace`: adds debug logs for every phase release.

mod blocking;
mod config;
mod elastic;
mod errors;
mod logs;
mod participant;
mod phaser;
mod spin;
mod spin_wait;
mod state;

pub use blocking::BlockingPhaser;
pub use config::{SpinConfig, DEFAULT_SPIN_LIMIT};
pub use elastic::{ElasticPhaser, KEEP_PARTICIPANTS};
pub use errors::{PhaserError, PhaserResult};
pub use participant::{enlist, Participant};
pub use phaser::{PhaseWaitResult, Phaser};
pub use spin::SpinPhaser;
pub use spin_wait::SpinWait;
