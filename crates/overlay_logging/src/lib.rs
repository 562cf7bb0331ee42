#![deny(missing_docs)]
//! Shared logging utilities for the overlay workspace.
//!
//! This crate provides the `overlay_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the watcher's current poll tick.
    static POLL_TICK: Cell<u64> = const { Cell::new(0) };
}

/// Sets the poll tick for the current thread.
/// This should be called by the pipeline loop once per watcher probe.
pub fn set_poll_tick(tick: u64) {
    POLL_TICK.with(|v| v.set(tick));
}

/// Retrieves the poll tick for the current thread.
/// Returns 0 if the tick has not been set.
pub fn get_poll_tick() -> u64 {
    POLL_TICK.with(|v| v.get())
}

/// Logs a trace-level message, prefixed with the current poll tick so one
/// probe cycle's work can be correlated across modules.
#[macro_export]
macro_rules! overlay_trace {
    ($($arg:tt)*) => {{
        log::trace!("[tick {}] {}", $crate::get_poll_tick(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! overlay_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message, prefixed with the current poll tick.
#[macro_export]
macro_rules! overlay_debug {
    ($($arg:tt)*) => {{
        log::debug!("[tick {}] {}", $crate::get_poll_tick(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! overlay_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! overlay_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
