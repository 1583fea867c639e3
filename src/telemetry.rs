//! Logging setup

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` forces `debug`.
/// Logs go to stderr so `--json` output on stdout stays parseable.
pub fn init(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // try_init: a second call (tests, embedding) keeps the first subscriber
    let _ = if logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
