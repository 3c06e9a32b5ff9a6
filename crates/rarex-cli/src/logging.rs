//! Logging setup for the CLI.
//!
//! Library events are emitted through `tracing`; this installs a
//! `tracing-subscriber` that writes them to stderr so stdout stays clean for
//! listings, member contents and JSON.
//!
//! `RUST_LOG` takes precedence over the defaults:
//!
//! ```bash
//! RUST_LOG=rarex_core=trace rarex extract archive.rar out/
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "warn,rarex=debug,rarex_core=debug";

/// Builds the filter used when `RUST_LOG` is not set.
fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::new(if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    })
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .without_time()
            .compact(),
    );

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters() {
        assert_eq!(default_filter(false).to_string(), "warn");
        assert!(default_filter(true).to_string().contains("rarex_core=debug"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
