use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "passerelle=warn";

/// Installs the stderr fmt subscriber. An invalid `filter` falls back to
/// [`DEFAULT_LOG_FILTER`]; a second call is a no-op.
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
