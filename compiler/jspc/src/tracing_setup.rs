//! Logging initialization for the `jspc` binary.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Verbosity requested on the command line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (_, true) => Verbosity::Verbose,
            (true, false) => Verbosity::Quiet,
            (false, false) => Verbosity::Normal,
        }
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn default_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `verbosity`. Safe to call more than once;
/// only the first call has an effect.
pub fn init_tracing(verbosity: Verbosity) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_level(true))
            .with(filter)
            .init();
    });
}
