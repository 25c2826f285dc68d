//! Field resolution.
//!
//! The [`Resolver`] decides the value of every field of a [`Configurable`]
//! target, in schema order, from the first source that has one:
//!
//! 1. the environment source
//! 2. the properties source, if any
//! 3. the field's declared default
//!
//! A critical field with no value anywhere aborts the load, as does a value
//! that cannot be coerced to the field's type. Fields written before the
//! failure keep their new values.

use std::fmt;

use crate::error::{ApplyError, ConfigError, Result};
use crate::schema::{self, Configurable, FieldDescriptor};
use crate::source::Source;

/// Separator between the prefix and the lookup name.
pub const PREFIX_SEPARATOR: &str = "_";

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueOrigin {
    /// The environment source.
    Environment,
    /// The properties source.
    Properties,
    /// The field's declared default.
    Default,
}

impl fmt::Display for ValueOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Environment => "environment",
            Self::Properties => "properties",
            Self::Default => "default",
        })
    }
}

/// A raw value found for a field, before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    /// The raw string.
    pub raw: String,
    /// The source that provided it.
    pub origin: ValueOrigin,
}

/// Outcome for one field of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    /// Declared field name.
    pub field: &'static str,
    /// Effective (prefixed) lookup key.
    pub key: String,
    /// Where the value came from, `None` if the field was left untouched.
    pub origin: Option<ValueOrigin>,
    /// Whether the value was written into the target.
    pub applied: bool,
}

/// Per-field provenance of a successful load, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    fields: Vec<FieldReport>,
}

impl LoadReport {
    /// All field outcomes.
    pub fn fields(&self) -> &[FieldReport] {
        &self.fields
    }

    /// The outcome for a declared field name.
    pub fn field(&self, name: &str) -> Option<&FieldReport> {
        self.fields.iter().find(|f| f.field == name)
    }

    /// The origin of a declared field's value.
    pub fn origin_of(&self, name: &str) -> Option<ValueOrigin> {
        self.field(name).and_then(|f| f.origin)
    }

    /// Number of fields that received a value.
    pub fn applied_count(&self) -> usize {
        self.fields.iter().filter(|f| f.applied).count()
    }
}

/// Resolves field values against an environment source and optional
/// properties source.
///
/// # Example
///
/// ```
/// use envprops::{MapSource, Resolver};
///
/// let env = MapSource::new().with("APP_PORT", "9000");
/// let resolver = Resolver::new(&env).with_prefix("APP");
/// assert_eq!(resolver.effective_name("PORT"), "APP_PORT");
/// ```
pub struct Resolver<'a> {
    env: &'a dyn Source,
    props: Option<&'a dyn Source>,
    prefix: &'a str,
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("env", &self.env.describe())
            .field("props", &self.props.map(|p| p.describe()))
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl<'a> Resolver<'a> {
    /// Create a resolver with no properties source and no prefix.
    pub fn new(env: &'a dyn Source) -> Self {
        Self {
            env,
            props: None,
            prefix: "",
        }
    }

    /// Set the properties source.
    #[must_use]
    pub fn with_properties(mut self, props: Option<&'a dyn Source>) -> Self {
        self.props = props;
        self
    }

    /// Set the prefix. An empty prefix means none.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &'a str) -> Self {
        self.prefix = prefix;
        self
    }

    /// The key a lookup name is queried under.
    pub fn effective_name(&self, lookup_name: &str) -> String {
        if self.prefix.is_empty() {
            lookup_name.to_string()
        } else {
            format!("{}{PREFIX_SEPARATOR}{lookup_name}", self.prefix)
        }
    }

    /// Find the raw value for one field.
    ///
    /// Returns `Ok(None)` for an optional field with no value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingCriticalField` if the field is critical
    /// and no source or default provides a value.
    pub fn lookup(&self, descriptor: &FieldDescriptor, key: &str) -> Result<Option<ResolvedValue>> {
        if let Some(raw) = self.env.get(key) {
            return Ok(Some(ResolvedValue {
                raw,
                origin: ValueOrigin::Environment,
            }));
        }

        if let Some(raw) = self.props.and_then(|p| p.get(key)) {
            return Ok(Some(ResolvedValue {
                raw,
                origin: ValueOrigin::Properties,
            }));
        }

        if let Some(default) = descriptor.default {
            return Ok(Some(ResolvedValue {
                raw: default.to_string(),
                origin: ValueOrigin::Default,
            }));
        }

        if descriptor.mandatory {
            return Err(ConfigError::missing_critical(key));
        }

        Ok(None)
    }

    /// Resolve every field of `target` and write the values found.
    ///
    /// # Errors
    ///
    /// Returns the first schema, missing critical field or coercion error.
    /// Fields after the failing one are not inspected.
    pub fn resolve<T: Configurable + ?Sized>(&self, target: &mut T) -> Result<LoadReport> {
        let descriptors = schema::extract_for::<T>()?;
        let mut report = LoadReport {
            fields: Vec::with_capacity(descriptors.len()),
        };

        for descriptor in &descriptors {
            report.fields.push(self.resolve_field(descriptor, target)?);
        }

        tracing::debug!(
            target_type = T::type_name(),
            fields = descriptors.len(),
            applied = report.applied_count(),
            "Configuration resolved"
        );

        Ok(report)
    }

    fn resolve_field<T: Configurable + ?Sized>(
        &self,
        descriptor: &FieldDescriptor,
        target: &mut T,
    ) -> Result<FieldReport> {
        let key = self.effective_name(descriptor.lookup_name);

        let Some(resolved) = self.lookup(descriptor, &key)? else {
            tracing::debug!(field = descriptor.field, key = %key, "No value found, leaving field untouched");
            return Ok(FieldReport {
                field: descriptor.field,
                key,
                origin: None,
                applied: false,
            });
        };

        let value = descriptor
            .kind
            .coerce(&resolved.raw)
            .ok_or_else(|| ConfigError::coercion(descriptor.lookup_name, &key, descriptor.kind))?;

        let applied = match target.apply(descriptor.index, value) {
            Ok(()) => true,
            Err(ApplyError::OutOfRange { .. }) => {
                return Err(ConfigError::coercion(
                    descriptor.lookup_name,
                    &key,
                    descriptor.kind,
                ))
            }
            Err(e @ ApplyError::Mismatch { .. }) => {
                tracing::debug!(field = descriptor.field, error = %e, "Field not writable, skipping");
                false
            }
        };

        tracing::debug!(field = descriptor.field, key = %key, origin = %resolved.origin, "Resolved field");

        Ok(FieldReport {
            field: descriptor.field,
            key,
            origin: Some(resolved.origin),
            applied,
        })
    }
}
