//! Structured logging setup.
//!
//! The logging configuration is itself loaded with envprops, so a process can
//! pick its log level and format from the same environment and properties
//! file as the rest of its settings.
//!
//! # Example
//!
//! ```rust,ignore
//! use envprops_telemetry::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env(None)?;
//! init_logging(&config)?;
//!
//! tracing::info!(service = "billing", "Configuration loaded");
//! ```

use envprops::{ConfigLoader, Configurable};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Configurable)]
pub struct LogConfig {
    /// Whether logging is enabled.
    #[envprops(name = "LOG_ENABLED", default = "true")]
    pub enabled: bool,

    /// Log filter directives (e.g., "info", "envprops=debug").
    #[envprops(name = "LOG_LEVEL", default = "info")]
    pub level: String,

    /// Whether to output JSON format.
    #[envprops(name = "LOG_JSON", default = "true")]
    pub json_format: bool,

    /// Whether to include span events (enter, exit, close).
    #[envprops(name = "LOG_SPAN_EVENTS", default = "false")]
    pub span_events: bool,

    /// Whether to include file/line info.
    #[envprops(name = "LOG_FILE_LINE", default = "false")]
    pub file_line_info: bool,

    /// Whether to include thread IDs.
    #[envprops(name = "LOG_THREAD_IDS", default = "false")]
    pub thread_ids: bool,

    /// Whether to include target (module path).
    #[envprops(name = "LOG_TARGET", default = "true")]
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// Loads the configuration from the process environment and
    /// `app.properties`, keys optionally prefixed.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::Config` if a value does not parse.
    pub fn from_env(prefix: Option<&str>) -> TelemetryResult<Self> {
        Self::load_with(&ConfigLoader::new().with_prefix(prefix.unwrap_or_default()))
    }

    /// Loads the configuration with a prepared loader, starting from the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::Config` if a value does not parse.
    pub fn load_with(loader: &ConfigLoader) -> TelemetryResult<Self> {
        let mut config = Self::default();
        loader.load(&mut config)?;
        Ok(config)
    }
}

/// Initializes the logging subsystem.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the filter is invalid or a global
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    tracing_subscriber::registry()
        .with(fmt_layer(config).with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Builds the formatting layer, JSON or pretty, without a filter.
fn fmt_layer(config: &LogConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);

    if config.json_format {
        layer.json().boxed()
    } else {
        layer.pretty().boxed()
    }
}

/// Creates an env filter from a string.
///
/// # Errors
///
/// Returns error if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use envprops::{MapSource, ValueOrigin};

    fn loader(env: MapSource) -> ConfigLoader {
        ConfigLoader::new().with_env(env).without_properties()
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert!(config.json_format);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert!(!config.json_format);
        assert!(config.span_events);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_declared_defaults_match_default_impl() {
        let config = LogConfig::load_with(&loader(MapSource::new())).unwrap();
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_load_from_env() {
        let env = MapSource::new()
            .with("LOG_LEVEL", "envprops=debug")
            .with("LOG_JSON", "f")
            .with("LOG_THREAD_IDS", "1");
        let config = LogConfig::load_with(&loader(env)).unwrap();

        assert_eq!(config.level, "envprops=debug");
        assert!(!config.json_format);
        assert!(config.thread_ids);
        assert!(config.include_target);
    }

    #[test]
    fn test_load_with_prefix() {
        let env = MapSource::new()
            .with("BILLING_LOG_LEVEL", "warn")
            .with("LOG_LEVEL", "trace");
        let report = loader(env)
            .with_prefix("BILLING")
            .load_with_report(&mut LogConfig::default())
            .unwrap();

        assert_eq!(report.field("level").unwrap().key, "BILLING_LOG_LEVEL");
        assert_eq!(report.origin_of("level"), Some(ValueOrigin::Environment));
        assert_eq!(report.origin_of("json_format"), Some(ValueOrigin::Default));
    }

    #[test]
    fn test_load_invalid_bool() {
        let env = MapSource::new().with("LOG_JSON", "sometimes");
        let err = LogConfig::load_with(&loader(env)).unwrap_err();
        assert!(matches!(err, TelemetryError::Config(_)));
        assert!(err.to_string().contains("LOG_JSON"));
    }

    #[test]
    fn test_create_env_filter_valid() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("envprops=debug,warn").is_ok());
    }

    #[test]
    fn test_create_env_filter_invalid() {
        assert!(create_env_filter("envprops=notalevel").is_err());
    }

    #[test]
    fn test_fmt_layer_builds_both_formats() {
        let _json = fmt_layer(&LogConfig::default());
        let _pretty = fmt_layer(&LogConfig::development());
    }

    #[test]
    fn test_init_rejects_invalid_level_before_installing() {
        let config = LogConfig {
            level: "envprops=notalevel".to_string(),
            ..LogConfig::default()
        };
        let err = init_logging(&config).unwrap_err();
        assert!(matches!(err, TelemetryError::LoggingInit(_)));
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..Default::default()
        };

        // Should return Ok even when disabled
        let result = init_logging(&config);
        assert!(result.is_ok());
    }
}
