//! Logging initialization.

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};

use thiserror::Error;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use super::config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global tracing subscriber described by `config`.
///
/// `RUST_LOG` is not consulted; the filter comes from `logging.level`.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LoggingError::InvalidFilter(e.to_string()))?;

    let (writer, is_terminal) = make_writer(&config.output)?;
    let layer = match config.format {
        LogFormat::Text => text_layer(config, writer, is_terminal),
        LogFormat::Json => json_layer(config, writer),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

fn make_writer(output: &str) -> Result<(BoxMakeWriter, bool), LoggingError> {
    match output {
        "stdout" => Ok((BoxMakeWriter::new(io::stdout), io::stdout().is_terminal())),
        "stderr" => Ok((BoxMakeWriter::new(io::stderr), io::stderr().is_terminal())),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| LoggingError::FileOpen(path.to_string(), e))?;
            Ok((BoxMakeWriter::new(file), false))
        }
    }
}

fn text_layer(config: &LoggingConfig, writer: BoxMakeWriter, is_terminal: bool) -> BoxedLayer {
    let layer = fmt::layer()
        .with_ansi(config.color && is_terminal)
        .with_target(config.target)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer);

    if config.timestamps {
        layer.boxed()
    } else {
        layer.without_time().boxed()
    }
}

fn json_layer(config: &LoggingConfig, writer: BoxMakeWriter) -> BoxedLayer {
    let layer = fmt::layer()
        .json()
        .with_target(config.target)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer);

    if config.timestamps {
        layer.boxed()
    } else {
        layer.without_time().boxed()
    }
}

/// Errors that can occur during logging initialization.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// Invalid log filter string.
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    /// Failed to open log file.
    #[error("Failed to open log file '{0}': {1}")]
    FileOpen(String, #[source] io::Error),

    /// A global subscriber was already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = LoggingConfig {
            level: "scoreboard=loudest".into(),
            ..LoggingConfig::default()
        };
        assert!(matches!(init(&config), Err(LoggingError::InvalidFilter(_))));
    }

    #[test]
    fn test_unwritable_log_file_is_reported() {
        let config = LoggingConfig {
            output: "/nonexistent-dir/scoreboard/server.log".into(),
            ..LoggingConfig::default()
        };
        assert!(matches!(init(&config), Err(LoggingError::FileOpen(..))));
    }
}
