//! Logger bootstrap for hosts and demos

/// Initialize the logging system
///
/// `default_filter` applies unless `RUST_LOG` is set. Calling this twice is
/// harmless; the second call only reports that a logger already exists.
pub fn init(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    if let Err(e) = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
    {
        eprintln!("Warning: Could not initialize logger: {}", e);
    }
}
