//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Failed to load the logging configuration.
    #[error("Invalid logging configuration: {0}")]
    Config(#[from] envprops::ConfigError),
}
