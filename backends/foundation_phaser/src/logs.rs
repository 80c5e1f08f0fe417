//! Feature-gated wrappers over `tracing` so phase bookkeeping never shows
//! up in builds that did not ask for it.
//!
//! Each macro compiles to a no-op unless its `log_*` feature is enabled.

macro_rules! debug {
    ($($t:tt)*) => {
        if cfg!(feature = "log_debug") {
            tracing::debug!($($t)*);
        }
    };
}

macro_rules! warning {
    ($($t:tt)*) => {
        if cfg!(feature = "log_warnings") {
            tracing::warn!($($t)*);
        }
    };
}

macro_rules! error {
    ($($t:tt)*) => {
        if cfg!(feature = "log_errors") {
            tracing::error!($($t)*);
        }
    };
}

pub(crate) use debug;
pub(crate) use error;
pub(crate) use warning;
