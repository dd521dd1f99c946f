//! Tracing initialization.
//!
//! Diagnostics go to stderr so they never mix with the move report. The level
//! follows `-v`/`-q`; `RUST_LOG`, when set, takes precedence.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Maps CLI verbosity to a level filter.
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbosity, quiet).into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0, false), LevelFilter::WARN);
        assert_eq!(level_for(2, false), LevelFilter::DEBUG);
        assert_eq!(level_for(9, false), LevelFilter::TRACE);
        assert_eq!(level_for(3, true), LevelFilter::ERROR);
    }
}
