use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter directives, e.g. `SHAKER_LOG=shaker_core=debug`
pub const LOG_FILTER_ENV: &str = "SHAKER_LOG";
/// Path of an extra debug-level log file
pub const LOG_FILE_ENV: &str = "SHAKER_LOG_FILE";

pub fn init_tracing() {
    init_tracing_with_service("shaker", "info");
}

/// Installs the global subscriber: a stderr layer filtered by `SHAKER_LOG`
/// (falling back to `default_filter`) and, when `SHAKER_LOG_FILE` is set, a
/// plain-text file layer at debug level. A second call is a no-op.
pub fn init_tracing_with_service(service_name: &str, default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let file_layer = std::env::var(LOG_FILE_ENV).ok().and_then(|log_path| {
        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
            ),
            Err(e) => {
                eprintln!("Cannot open log file {}: {}", log_path, e);
                None
            }
        }
    });

    if registry.with(file_layer).try_init().is_ok() {
        tracing::debug!("Tracing initialised for {}", service_name);
    }
}
