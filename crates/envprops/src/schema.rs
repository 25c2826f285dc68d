//! Configuration schema types and the schema extractor.
//!
//! A configurable type publishes its fields as a constant slice of
//! [`FieldSpec`]s, usually generated by `#[derive(Configurable)]`. Before each
//! load the specs are normalized into [`FieldDescriptor`]s by [`extract`].

use std::fmt;

use crate::error::{ApplyError, ConfigError, Result};

/// The semantic type of a configurable field.
///
/// Drives how a raw string value is coerced before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Used verbatim.
    String,
    /// Base-10 signed integer.
    Integer,
    /// `true`/`false`, `t`/`f`, `1`/`0`, case-insensitive.
    Boolean,
    /// 64-bit floating point.
    Float,
}

impl FieldKind {
    /// Short name used in error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "int",
            Self::Boolean => "bool",
            Self::Float => "float",
        }
    }

    /// Coerce a raw string into a value of this kind.
    ///
    /// Returns `None` if the string is not a valid value of this kind.
    pub fn coerce(self, raw: &str) -> Option<FieldValue> {
        match self {
            Self::String => Some(FieldValue::String(raw.to_string())),
            Self::Integer => raw.parse::<i64>().ok().map(FieldValue::Integer),
            Self::Boolean => parse_bool(raw).map(FieldValue::Boolean),
            Self::Float => raw.parse::<f64>().ok().map(FieldValue::Float),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coerced field value, ready to be written into the target.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A boolean value.
    Boolean(bool),
    /// A floating point value.
    Float(f64),
}

impl FieldValue {
    /// The kind of this value.
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::String(_) => FieldKind::String,
            Self::Integer(_) => FieldKind::Integer,
            Self::Boolean(_) => FieldKind::Boolean,
            Self::Float(_) => FieldKind::Float,
        }
    }
}

/// Constant metadata attached to one configurable field.
///
/// The string options hold the raw attribute text; they are validated by
/// [`extract`], not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Declared field name.
    pub field: &'static str,
    /// Semantic type of the field.
    pub kind: FieldKind,
    /// Lookup name override.
    pub rename: Option<&'static str>,
    /// Default value, used verbatim (may be empty).
    pub default: Option<&'static str>,
    /// Raw mandatory flag.
    pub critical: Option<&'static str>,
}

impl FieldSpec {
    /// Create a spec with no override, default or mandatory flag.
    pub const fn new(field: &'static str, kind: FieldKind) -> Self {
        Self {
            field,
            kind,
            rename: None,
            default: None,
            critical: None,
        }
    }

    /// Set the lookup name override.
    #[must_use]
    pub const fn rename(mut self, name: &'static str) -> Self {
        self.rename = Some(name);
        self
    }

    /// Set the default value.
    #[must_use]
    pub const fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    /// Set the raw mandatory flag.
    #[must_use]
    pub const fn critical(mut self, flag: &'static str) -> Self {
        self.critical = Some(flag);
        self
    }
}

/// Normalized description of one field, derived once per load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Position of the field in the schema.
    pub index: usize,
    /// Declared field name.
    pub field: &'static str,
    /// Key used against the sources, before prefixing. Never empty.
    pub lookup_name: &'static str,
    /// Semantic type of the field.
    pub kind: FieldKind,
    /// Whether resolution fails when no value is found.
    pub mandatory: bool,
    /// Fallback value.
    pub default: Option<&'static str>,
}

impl FieldDescriptor {
    /// Whether the field declares a default.
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// A type whose fields can be bound from configuration sources.
///
/// Usually implemented with `#[derive(Configurable)]`. A hand-written
/// implementation must keep `apply` in step with the indices of `fields`.
///
/// ```
/// use envprops::{ApplyError, Configurable, FieldKind, FieldSpec, FieldValue};
///
/// #[derive(Default)]
/// struct Server {
///     port: u16,
/// }
///
/// impl Configurable for Server {
///     fn fields() -> &'static [FieldSpec] {
///         const FIELDS: &[FieldSpec] =
///             &[FieldSpec::new("port", FieldKind::Integer).rename("PORT").default_value("8080")];
///         FIELDS
///     }
///
///     fn apply(&mut self, index: usize, value: FieldValue) -> Result<(), ApplyError> {
///         match (index, value) {
///             (0, FieldValue::Integer(v)) => {
///                 self.port = u16::try_from(v).map_err(|_| ApplyError::OutOfRange { index })?;
///                 Ok(())
///             }
///             _ => Err(ApplyError::Mismatch { index }),
///         }
///     }
/// }
/// ```
pub trait Configurable {
    /// The field schema, in declaration order.
    fn fields() -> &'static [FieldSpec];

    /// Write a coerced value into the field at `index`.
    fn apply(&mut self, index: usize, value: FieldValue) -> std::result::Result<(), ApplyError>;

    /// Name used in schema errors.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Derive the normalized descriptors for a schema.
///
/// # Errors
///
/// Returns `ConfigError::Schema` if an override name is empty or a mandatory
/// flag is not one of the recognized values.
pub fn extract(type_name: &str, specs: &[FieldSpec]) -> Result<Vec<FieldDescriptor>> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let lookup_name = match spec.rename {
                Some("") => {
                    return Err(ConfigError::schema(
                        type_name,
                        format!("empty lookup name for field {}", spec.field),
                    ))
                }
                Some(name) => name,
                None => spec.field,
            };

            if lookup_name.is_empty() {
                return Err(ConfigError::schema(type_name, "field with empty name"));
            }

            let mandatory = match spec.critical {
                Some(flag) => parse_mandatory_flag(flag).ok_or_else(|| {
                    ConfigError::schema(
                        type_name,
                        format!("invalid critical flag {flag:?} for field {}", spec.field),
                    )
                })?,
                None => false,
            };

            Ok(FieldDescriptor {
                index,
                field: spec.field,
                lookup_name,
                kind: spec.kind,
                mandatory,
                default: spec.default,
            })
        })
        .collect()
}

/// Extract the descriptors of a [`Configurable`] type.
///
/// # Errors
///
/// See [`extract`].
pub fn extract_for<T: Configurable + ?Sized>() -> Result<Vec<FieldDescriptor>> {
    extract(T::type_name(), T::fields())
}

/// Parse a mandatory flag.
///
/// `true`, `t` and `y` are set, `false`, `f` and `n` are unset; case and
/// surrounding whitespace are ignored. Anything else is unrecognized.
pub fn parse_mandatory_flag(flag: &str) -> Option<bool> {
    match flag.trim().to_lowercase().as_str() {
        "true" | "t" | "y" => Some(true),
        "false" | "f" | "n" => Some(false),
        _ => None,
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}
