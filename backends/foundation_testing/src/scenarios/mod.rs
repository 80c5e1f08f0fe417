//! Common coordination patterns built on phasers.
//!
//! - Lockstep rounds that detect threads crossing a phase boundary early
//! - Workers with uneven work leaving the group as they finish, on fixed and
//!   elastic phasers

pub mod early_exit;
pub mod lockstep;

pub use early_exit::{
    run_with_departures, run_with_elastic_departures, run_with_elastic_resize, EarlyExitReport,
};
pub use lockstep::run_lockstep;
