//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::schema::FieldKind;

/// Result alias for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while binding configuration to a target.
///
/// Every variant is fatal to the `load` call that produced it. Fields written
/// before the error was raised keep their new values.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The target's schema is malformed.
    #[error("invalid configuration schema for {type_name}: {reason}")]
    Schema {
        /// Name of the target type.
        type_name: String,
        /// Explanation of what is wrong with the schema.
        reason: String,
    },

    /// A critical field was found in no source and declares no default.
    #[error("critical config field {key} missing from the environment")]
    MissingCriticalField {
        /// The effective (prefixed) lookup key.
        key: String,
    },

    /// A raw value could not be converted to the field's type.
    #[error("error converting field {field} to {expected} (from {key})")]
    Coercion {
        /// The field's lookup name, before prefixing.
        field: String,
        /// The effective (prefixed) lookup key the value came from.
        key: String,
        /// The kind the value was expected to parse as.
        expected: FieldKind,
    },
}

impl ConfigError {
    /// Create a new schema error.
    pub fn schema(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new missing critical field error.
    pub fn missing_critical(key: impl Into<String>) -> Self {
        Self::MissingCriticalField { key: key.into() }
    }

    /// Create a new coercion error.
    pub fn coercion(field: impl Into<String>, key: impl Into<String>, expected: FieldKind) -> Self {
        Self::Coercion {
            field: field.into(),
            key: key.into(),
            expected,
        }
    }

    /// Returns the field or key the error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Schema { .. } => None,
            Self::MissingCriticalField { key } | Self::Coercion { key, .. } => Some(key),
        }
    }
}

/// Errors raised while reading a properties source.
///
/// These never escape the loader entry points: a properties file that cannot
/// be loaded is treated as absent.
#[derive(Error, Debug)]
pub enum PropertiesError {
    /// Failed to read the properties file.
    #[error("failed to read properties file: {path}")]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A `\u` escape was not followed by four hex digits.
    #[error("malformed \\uXXXX escape on line {line}")]
    InvalidEscape {
        /// 1-based line number where the logical line started.
        line: usize,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML properties: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON properties: {0}")]
    Json(#[from] serde_json::Error),

    /// A `${key}` reference leads back to a key being expanded.
    #[error("circular reference to {key} in properties")]
    CircularReference {
        /// The key that refers back to itself.
        key: String,
    },

    /// A structured properties file contained a nested value.
    #[error("properties must be a flat table of scalars, found nested value at {key}")]
    NotFlat {
        /// The offending key.
        key: String,
    },
}

impl PropertiesError {
    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error means the file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// A coerced value could not be stored in its target field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// The value is out of range for the field's concrete type.
    #[error("value out of range for field at index {index}")]
    OutOfRange {
        /// Schema index of the field.
        index: usize,
    },

    /// The value kind does not match the field, or the index is unknown.
    #[error("no field at index {index} accepts this value")]
    Mismatch {
        /// Schema index of the field.
        index: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error() {
        let err = ConfigError::schema("Settings", "empty override name for field port");
        assert!(err.to_string().contains("Settings"));
        assert!(err.to_string().contains("port"));
        assert_eq!(err.key(), None);
    }

    #[test]
    fn test_missing_critical_error() {
        let err = ConfigError::missing_critical("APP_HOST");
        assert_eq!(
            err.to_string(),
            "critical config field APP_HOST missing from the environment"
        );
        assert_eq!(err.key(), Some("APP_HOST"));
    }

    #[test]
    fn test_coercion_error() {
        let err = ConfigError::coercion("Port", "APP_Port", FieldKind::Integer);
        assert!(err.to_string().contains("Port"));
        assert!(err.to_string().contains("int"));
        assert_eq!(err.key(), Some("APP_Port"));
    }

    #[test]
    fn test_properties_not_found() {
        let err = PropertiesError::read_error(
            "app.properties",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());

        let err = PropertiesError::InvalidEscape { line: 3 };
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("line 3"));
    }
}
