// Path: crates/telemetry/src/init.rs
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

/// Directive used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// How events are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Single-line human readable text.
    Compact,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Compact
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("log bridge already installed: {0}")]
    LogBridge(#[from] tracing_log::log::SetLoggerError),
    #[error("global subscriber already installed: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Initializes the global `tracing` subscriber for structured JSON logging.
pub fn init_tracing() -> Result<(), TelemetryError> {
    init_tracing_with(LogFormat::Json)
}

/// Installs a stderr subscriber filtered by `RUST_LOG` and routes `log`
/// records into it. Fails if called twice in one process.
pub fn init_tracing_with(format: LogFormat) -> Result<(), TelemetryError> {
    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_initialisation_is_refused() {
        init_tracing_with(LogFormat::Compact).unwrap();
        tracing::info!(target: "telemetry", "installed");
        assert!(matches!(
            init_tracing(),
            Err(TelemetryError::LogBridge(_))
        ));
        assert_eq!(LogFormat::from_json_flag(true), LogFormat::Json);
    }
}
