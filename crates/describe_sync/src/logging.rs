use std::env;
use std::io;
use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogFormat;

/// Overrides `RUST_LOG` for this tool only.
pub const LOG_FILTER_ENV: &str = "DESCRIBE_SYNC_LOG";

static LOGGING_INSTALLED: OnceLock<LogFormat> = OnceLock::new();

/// Errors that can arise while standing up structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid logging filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global stderr subscriber.
///
/// The first call wins; later calls return the format chosen by that first call.
pub fn init_logging(format: LogFormat) -> Result<LogFormat, LoggingError> {
    if let Some(installed) = LOGGING_INSTALLED.get() {
        return Ok(*installed);
    }

    install_logging(format)?;
    Ok(*LOGGING_INSTALLED.get_or_init(|| format))
}

fn install_logging(format: LogFormat) -> Result<(), LoggingError> {
    let filter = build_filter(env::var(LOG_FILTER_ENV).ok())?;

    let layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .event_format(
                tracing_subscriber::fmt::format()
                    .json()
                    .with_timer(LocalTime::rfc_3339())
                    .with_level(true)
                    .with_target(true),
            )
            .with_writer(io::stderr)
            .with_ansi(false)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .event_format(
                tracing_subscriber::fmt::format()
                    .with_timer(LocalTime::rfc_3339())
                    .with_level(true)
                    .with_target(false)
                    .with_ansi(false),
            )
            .with_writer(io::stderr)
            .with_ansi(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;
    Ok(())
}

fn build_filter(spec: Option<String>) -> Result<EnvFilter, ParseError> {
    if let Some(spec) = spec {
        if !spec.trim().is_empty() {
            return EnvFilter::try_new(spec);
        }
    }

    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new("info"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_is_used() {
        let filter = build_filter(Some("describe_sync=debug".to_string())).unwrap();
        assert!(filter.to_string().contains("describe_sync=debug"));
    }

    #[test]
    fn rejects_malformed_filter() {
        assert!(build_filter(Some("describe_sync=notalevel".to_string())).is_err());
    }

    #[test]
    fn second_init_is_a_no_op() {
        let first = init_logging(LogFormat::Text).unwrap();
        let second = init_logging(LogFormat::Json).unwrap();
        assert_eq!(first, second);
    }
}
