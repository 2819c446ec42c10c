use fenrir_core::LoggingConfig;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, Registry};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` raises the configured
/// level to `debug`. Calling this twice keeps the first subscriber.
pub fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.format.as_str() {
        "json" => {
            let subscriber = Registry::default()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_current_span(true));
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        "compact" => {
            let subscriber = Registry::default()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().compact());
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        _ => {
            let subscriber = Registry::default()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().pretty());
            tracing::subscriber::set_global_default(subscriber).ok();
        }
    }
}
