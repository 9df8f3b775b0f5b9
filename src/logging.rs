//! Logger set-up for the `tessera` binary and tests.
//!
//! Loads, reloads and saves are logged at info level. Per-object detail
//! (regions skipped during fan-out, respawn scheduling, stale respawns,
//! orphaned indicators) is logged at debug level and only shown for this
//! crate, so verbose runs inside a Bevy app are not flooded by the engine.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Filter applied when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> String {
    if verbose {
        format!("{},{}={}", LevelFilter::Info, env!("CARGO_CRATE_NAME"), LevelFilter::Debug)
    } else {
        LevelFilter::Info.to_string()
    }
}

/// Initialises the global logger with millisecond timestamps.
///
/// `verbose` raises this crate to debug level. `RUST_LOG` overrides
/// either default. Calling it again is a no-op.
pub fn init(verbose: bool) {
    let env = Env::default().default_filter_or(default_filter(verbose));
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();

    // Only fails when a logger is already installed.
    if builder.try_init().is_err() {
        log::debug!("logger already initialised");
    }
}
