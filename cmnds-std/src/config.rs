//! Process-wide diagnostics configuration.
//!
//! Debug output is on by default and switched off when the environment
//! variable [`ENV_VAR`] is set to `production`. [`set_debug`] overrides the
//! environment at runtime.
//!
//! Diagnostics are emitted through `tracing` when the `tracing` feature is
//! enabled; without it the toggle is kept but nothing is logged.

use std::sync::{
    LazyLock,
    atomic::{AtomicBool, Ordering},
};

/// Environment variable consulted for the default debug state.
pub const ENV_VAR: &str = "CMNDS_ENV";

static DEBUG: LazyLock<AtomicBool> = LazyLock::new(|| AtomicBool::new(default_debug()));

fn default_debug() -> bool {
    !matches!(std::env::var(ENV_VAR).as_deref(), Ok("production"))
}

/// Enables or disables debug diagnostics for the whole process.
pub fn set_debug(enabled: bool) {
    DEBUG.store(enabled, Ordering::Release);
}

/// Returns whether debug diagnostics are enabled.
pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Acquire)
}

#[cfg(feature = "tracing")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        if $crate::config::debug_enabled() {
            ::tracing::debug!($($arg)*);
        }
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_log;
