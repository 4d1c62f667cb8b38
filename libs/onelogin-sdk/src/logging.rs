use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter, e.g. `debug` or
/// `onelogin_sdk=trace,onelogin_http=info`.
pub const LOG_LEVEL_ENV: &str = "OL_LOG_LEVEL";

const DEFAULT_FILTER: &str = "info";

/// Build the filter from `OL_LOG_LEVEL`, falling back to `info` when the
/// variable is unset or does not parse.
#[must_use]
pub fn env_filter() -> EnvFilter {
    match std::env::var(LOG_LEVEL_ENV) {
        Ok(raw) if !raw.trim().is_empty() => {
            EnvFilter::try_new(raw.trim()).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
        _ => EnvFilter::new(DEFAULT_FILTER),
    }
}

/// Install a global fmt subscriber filtered by `OL_LOG_LEVEL`.
///
/// Returns `false` when a global subscriber was already installed; calling
/// this more than once is harmless.
#[must_use]
pub fn init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}
