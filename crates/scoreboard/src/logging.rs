//! Library-level logging that stays silent unless asked for.
//!
//! With the `logging` feature the macros below expand to the matching
//! `tracing` macro. Without it they expand to nothing, so the store and
//! client code can log freely without forcing a subscriber on consumers.
//! Because of that, call them as statements only, never as a match arm
//! value (`Err(e) => { warn!(..); }`, not `Err(e) => warn!(..)`).
//!
//! ```rust,ignore
//! use crate::logging::{debug, info};
//!
//! info!(path = %path.display(), "opening document store");
//! debug!(name_key = %key, delta, "upserting score");
//! ```

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

/// Degraded but recoverable situations: fallbacks, rollbacks, drift.
#[cfg(feature = "logging")]
macro_rules! log_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub(crate) use log_debug as debug;
pub(crate) use log_info as info;
pub(crate) use log_warn as warn;
