//! Logging setup and crash reporting for the command-line tool.
//!
//! Library code emits through `tracing` spans and `log` records; only the
//! binary installs a subscriber.

pub mod panic_hook;

pub use panic_hook::install_panic_hook;

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count. `RUST_LOG` wins when set.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install a stderr subscriber. Calling it twice is a no-op.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
