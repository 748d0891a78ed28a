// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Maps `-q` / `-v` counts to a level (0=WARN, 1=INFO, 2=DEBUG, 3+=TRACE).
pub fn level_for(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// Explicit `-v`/`-q` win; otherwise `RUST_LOG` if it parses; otherwise WARN.
pub fn filter_for(verbose: u8, quiet: bool, rust_log: Option<&str>) -> EnvFilter {
    let from_flags = || EnvFilter::new(level_for(verbose, quiet).as_str());
    if verbose > 0 || quiet {
        return from_flags();
    }
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(from_flags)
}

/// Installs the stderr subscriber. Stdout stays reserved for tables and JSON.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbose, quiet, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(3, true), Level::ERROR);
        assert_eq!(level_for(0, false), Level::WARN);
        assert_eq!(level_for(1, false), Level::INFO);
        assert_eq!(level_for(2, false), Level::DEBUG);
        assert_eq!(level_for(9, false), Level::TRACE);
    }

    #[test]
    fn rust_log_applies_without_flags() {
        let f = filter_for(0, false, Some("invoicewatch=debug"));
        assert_eq!(f.max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(filter_for(0, false, None).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn flags_override_rust_log() {
        assert_eq!(filter_for(0, true, Some("trace")).max_level_hint(), Some(LevelFilter::ERROR));
        assert_eq!(filter_for(1, false, Some("trace")).max_level_hint(), Some(LevelFilter::INFO));
    }
}
