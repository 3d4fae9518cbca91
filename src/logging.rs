use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Verbosity comes from `RUST_LOG` (default `info`). Set `LOG_FORMAT=json` for
/// structured output; the default is the human-readable formatter.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
