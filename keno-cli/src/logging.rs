use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LogFormat;

const LOG_ENV: &str = "KENO_LOG";

/// Installs the global subscriber. Filter comes from `KENO_LOG`, falling back to `info`.
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    // a second init (tests) keeps the first subscriber
    let _ = result;
}
