use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// RUST_LOG wins when set; otherwise `default_filter` (normally
/// `LogSettings::filter`) is used. Safe to call once per process;
/// a second call is a no-op because `try_init` refuses to reinstall.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
