use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Installs a JSON-formatted stdout subscriber plus a daily-rolling file
/// sink under `logs/<service>.log`. Returns the file appender's
/// [`tracing_appender::non_blocking::WorkerGuard`], which must be kept
/// alive for the lifetime of the process (drop it only at shutdown).
pub fn init_tracing(service: &str, log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    let level_filter = match log_level.to_lowercase().as_str() {
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let file_appender = tracing_appender::rolling::daily("logs", format!("{service}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_filter(EnvFilter::from_default_env().add_directive(level_filter.into()));

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_current_span(true)
        .with_filter(EnvFilter::from_default_env().add_directive(level_filter.into()));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}
