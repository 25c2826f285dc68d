//! Structured logging for envprops applications.
//!
//! This crate sets up a `tracing-subscriber` registry whose level and output
//! format come from the same sources as the rest of an application's
//! configuration:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `LOG_ENABLED` | `true` | Install a subscriber at all |
//! | `LOG_LEVEL` | `info` | `EnvFilter` directives |
//! | `LOG_JSON` | `true` | JSON output, otherwise pretty |
//! | `LOG_SPAN_EVENTS` | `false` | Emit span open/close events |
//! | `LOG_FILE_LINE` | `false` | Include source file and line |
//! | `LOG_THREAD_IDS` | `false` | Include thread IDs |
//! | `LOG_TARGET` | `true` | Include the module path |
//!
//! # Example
//!
//! ```rust,ignore
//! use envprops_telemetry::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env(Some("BILLING"))?;
//! init_logging(&config)?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
