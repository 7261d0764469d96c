//! Log output setup.
//!
//! Library code only emits `tracing` events. Binaries call [`init`] once to
//! route them to stderr, keeping stdout free for JSON results.

use tracing::Level;

/// Parses a level name, falling back to `WARN` for anything unrecognized.
pub fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::WARN)
}

/// Installs a stderr fmt subscriber at the given maximum level.
///
/// Returns `false` if a global subscriber was already set.
pub fn init(level: &str) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
