//! Tracing subscriber setup. `log` records from the library are bridged
//! into the same subscriber.

use shopfloor::config::LoggingConfig;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

pub type InitError = Box<dyn std::error::Error + Send + Sync>;

pub fn init_logging(config: &LoggingConfig) -> Result<(), InitError> {
    LogTracer::init()?;

    let filter = build_filter(&config.filter);
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))?;
    } else {
        tracing::subscriber::set_global_default(registry.with(fmt::layer()))?;
    }
    Ok(())
}

fn build_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}' ({}), falling back to info", directives, e);
        EnvFilter::new("info")
    })
}
