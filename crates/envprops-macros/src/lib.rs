//! Procedural macros for envprops.
//!
//! This crate provides `#[derive(Configurable)]`, which enumerates a struct's
//! configurable fields at compile time and generates the code that writes
//! resolved values back into them. Use it through the `envprops` crate, which
//! re-exports it next to the `Configurable` trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use envprops::Configurable;
//!
//! #[derive(Default, Configurable)]
//! struct Settings {
//!     #[envprops(name = "PORT", default = "8080")]
//!     port: u16,
//!     #[envprops(name = "HOST", critical)]
//!     host: String,
//!     #[envprops(skip)]
//!     cache: Vec<u8>,
//! }
//! ```
//!
//! # Field Types
//!
//! | Field type | Kind |
//! |------------|------|
//! | `String` | string |
//! | `i8`..`i64`, `isize`, `u8`..`u64`, `usize` | int |
//! | `bool` | bool |
//! | `f32`, `f64` | float |
//! | `Option<T>` of the above | same as `T`, written as `Some` |
//!
//! Any other type is rejected at compile time unless the field is skipped.

mod configurable;
mod parse;

use proc_macro::TokenStream;

/// Derives `envprops::Configurable` for a struct with named fields.
///
/// # Attributes
///
/// - `name = "ENV_NAME"`: lookup name, defaults to the field name as written
/// - `default = "value"`: value used when no source has one (may be empty)
/// - `critical` or `critical = "true"`: fail the load when no value is found;
///   the flag accepts `true`/`t`/`y` and `false`/`f`/`n`
/// - `skip`: leave the field out of the schema
///
/// # Generated Code
///
/// The macro generates approximately:
///
/// ```rust,ignore
/// impl envprops::Configurable for Settings {
///     fn fields() -> &'static [envprops::FieldSpec] {
///         const FIELDS: &[envprops::FieldSpec] = &[envprops::FieldSpec {
///             field: "port",
///             kind: envprops::FieldKind::Integer,
///             rename: Some("PORT"),
///             default: Some("8080"),
///             critical: None,
///         }];
///         FIELDS
///     }
///
///     fn apply(&mut self, index: usize, value: envprops::FieldValue) -> Result<(), envprops::ApplyError> {
///         match (index, value) {
///             (0, envprops::FieldValue::Integer(v)) => {
///                 self.port = u16::try_from(v).map_err(|_| envprops::ApplyError::OutOfRange { index })?;
///             }
///             _ => return Err(envprops::ApplyError::Mismatch { index }),
///         }
///         Ok(())
///     }
/// }
/// ```
#[proc_macro_derive(Configurable, attributes(envprops))]
pub fn derive_configurable(input: TokenStream) -> TokenStream {
    configurable::expand_configurable(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
