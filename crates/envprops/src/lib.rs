//! Typed configuration binding for envprops.
//!
//! This crate binds the fields of a plain struct to values taken, in priority
//! order, from:
//! - Environment variables
//! - An optional properties file (`app.properties` unless told otherwise)
//! - Defaults declared on the fields
//!
//! A field marked critical that none of these provide fails the load, as does
//! a value that does not parse as the field's type.
//!
//! # Example
//!
//! ```no_run
//! use envprops::Configurable;
//!
//! #[derive(Debug, Default, Configurable)]
//! struct Settings {
//!     #[envprops(name = "PORT", default = "8080")]
//!     port: u16,
//!     #[envprops(name = "HOST", critical)]
//!     host: String,
//!     #[envprops(name = "DEBUG", default = "false")]
//!     debug: bool,
//! }
//!
//! # fn main() -> Result<(), envprops::ConfigError> {
//! let mut settings = Settings::default();
//! envprops::load(&mut settings)?;
//! println!("listening on {}:{}", settings.host, settings.port);
//! # Ok(())
//! # }
//! ```
//!
//! # Lookup Names
//!
//! Each field is looked up under its declared name, or the `name` given in
//! its attribute, exactly as written. With a prefix the key becomes
//! `PREFIX_NAME`:
//!
//! - `envprops::load_with_prefix(&mut settings, "APP")` reads `APP_PORT`,
//!   `APP_HOST` and `APP_DEBUG`
//!
//! # Properties File Format
//!
//! ```text
//! # comment
//! HOST = example.com
//! PORT: 9000
//! ```
//!
//! Values may refer to other keys or environment variables as `${KEY}`.
//! Files ending in `.toml` or `.json` are read as flat tables.

#![warn(missing_docs)]

extern crate self as envprops;

mod error;
mod loader;
mod properties;
mod resolver;
mod schema;
mod source;

pub use envprops_macros::Configurable;
pub use error::{ApplyError, ConfigError, PropertiesError, Result};
pub use loader::{
    load, load_with_prefix, load_with_prefix_and_properties, load_with_properties, ConfigLoader,
    DEFAULT_PROPERTIES_FILE,
};
pub use properties::Properties;
pub use resolver::{
    FieldReport, LoadReport, ResolvedValue, Resolver, ValueOrigin, PREFIX_SEPARATOR,
};
pub use schema::{
    extract, extract_for, parse_mandatory_flag, Configurable, FieldDescriptor, FieldKind, FieldSpec,
    FieldValue,
};
pub use source::{MapSource, ProcessEnv, Source};

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Configurable)]
    struct Derived {
        #[envprops(name = "NAME", default = "anon")]
        name: String,
        #[envprops(skip)]
        untouched: Vec<u8>,
    }

    #[test]
    fn test_derive_within_crate() {
        let mut derived = Derived::default();
        ConfigLoader::new()
            .with_env(MapSource::new())
            .without_properties()
            .load(&mut derived)
            .unwrap();

        assert_eq!(derived.name, "anon");
        assert!(derived.untouched.is_empty());
        assert_eq!(Derived::fields().len(), 1);
    }
}
