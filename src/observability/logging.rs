//! Tracing subscriber setup for the `ctc-decode` binary.

use tracing::info;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Configuration for log output.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter, overridden by `RUST_LOG` when set.
    pub log_level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
    /// Include thread ids in each event.
    pub thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json: false,
            thread_ids: false,
        }
    }
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr so decoded text on stdout stays clean.
pub fn init_tracing(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = Registry::default().with(env_filter);

    if config.json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(config.thread_ids),
            )
            .try_init()?;
    } else {
        subscriber
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(config.thread_ids),
            )
            .try_init()?;
    }

    info!(level = %config.log_level, json = config.json, "Tracing initialized");
    Ok(())
}
