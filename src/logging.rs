//! Logging configuration for refract
//!
//! This module provides utilities for initializing and configuring logging
//! using the `log` and `env_logger` crates.
//!
//! # Log Levels
//!
//! The pass engine uses log levels as follows:
//!
//! - `error!` - Actual errors that should always be shown
//! - `warn!` - Warnings that may indicate problems (e.g. a printer sink failing)
//! - `info!` - High-level progress (lifecycle transitions)
//! - `debug!` - Schedule construction and per-pass execution
//! - `trace!` - Cache hits/misses and invalidation detail
//!
//! # Environment Variable
//!
//! Set `RUST_LOG` to control logging at runtime:
//!
//! ```bash
//! RUST_LOG=debug refract-opt main.rfr   # Show scheduled passes as they run
//! RUST_LOG=refract::passes=trace ...    # Cache-level detail for the engine only
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging with sensible defaults (Warn level).
///
/// This only initializes once; subsequent calls are no-ops.
/// Use this in binaries and test entry points.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

/// Initialize logging with a specific level.
///
/// This only initializes once; subsequent calls are no-ops.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {}:{} - {}",
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize logging from the RUST_LOG environment variable.
///
/// If RUST_LOG is not set, defaults to Warn level.
/// This only initializes once; subsequent calls are no-ops.
pub fn init_from_env() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    });
}

/// Initialize logging for tests.
///
/// Uses test-friendly output format and suppresses most output unless
/// RUST_LOG is explicitly set.
pub fn init_test() {
    // try_init() doesn't panic if already initialized
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        // Multiple calls should not panic
        init_test();
        init_test();
        init_test();
    }
}
