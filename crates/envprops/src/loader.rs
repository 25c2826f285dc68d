//! Configuration loader and entry points.
//!
//! This module provides the [`ConfigLoader`] for binding a [`Configurable`]
//! target from the environment, a properties file and declared defaults, and
//! the four `load*` shorthands built on it.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::properties::Properties;
use crate::resolver::{LoadReport, Resolver};
use crate::schema::Configurable;
use crate::source::{ProcessEnv, Source};

/// Properties file consulted when none is given.
pub const DEFAULT_PROPERTIES_FILE: &str = "app.properties";

enum EnvSetting {
    Process(ProcessEnv),
    Custom(Box<dyn Source>),
}

impl EnvSetting {
    fn as_source(&self) -> &dyn Source {
        match self {
            Self::Process(env) => env,
            Self::Custom(source) => source.as_ref(),
        }
    }
}

enum PropertiesSetting {
    File(PathBuf),
    Loaded(Properties),
    Disabled,
}

/// Configuration loader.
///
/// Values are taken, per field, from the first of:
/// 1. Environment variables (`PREFIX_NAME` when a prefix is set)
/// 2. The properties file
/// 3. The field's declared default
///
/// The properties file is read on every call to [`load`](Self::load); a
/// missing or unreadable file is treated as empty.
///
/// # Example
///
/// ```no_run
/// use envprops::{ConfigLoader, Configurable};
///
/// #[derive(Debug, Default, Configurable)]
/// struct Settings {
///     #[envprops(name = "PORT", default = "8080")]
///     port: u16,
///     #[envprops(name = "HOST", critical)]
///     host: String,
/// }
///
/// # fn main() -> Result<(), envprops::ConfigError> {
/// let mut settings = Settings::default();
/// ConfigLoader::new()
///     .with_prefix("APP")
///     .with_properties_file("config/app.properties")
///     .with_dotenv(".env")
///     .load(&mut settings)?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigLoader {
    env: EnvSetting,
    properties: PropertiesSetting,
    prefix: String,
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties = match &self.properties {
            PropertiesSetting::File(path) => path.display().to_string(),
            PropertiesSetting::Loaded(props) => props.describe(),
            PropertiesSetting::Disabled => "disabled".to_string(),
        };
        f.debug_struct("ConfigLoader")
            .field("env", &self.env.as_source().describe())
            .field("properties", &properties)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader reading the process environment and
    /// [`DEFAULT_PROPERTIES_FILE`], with no prefix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: EnvSetting::Process(ProcessEnv::new()),
            properties: PropertiesSetting::File(PathBuf::from(DEFAULT_PROPERTIES_FILE)),
            prefix: String::new(),
        }
    }

    /// Set the prefix prepended to every lookup name as `PREFIX_NAME`.
    ///
    /// An empty prefix means none. The prefix is used as given.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Read properties from `path` instead of [`DEFAULT_PROPERTIES_FILE`].
    #[must_use]
    pub fn with_properties_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.properties = PropertiesSetting::File(path.as_ref().to_path_buf());
        self
    }

    /// Use already loaded properties.
    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = PropertiesSetting::Loaded(properties);
        self
    }

    /// Do not consult any properties source.
    #[must_use]
    pub fn without_properties(mut self) -> Self {
        self.properties = PropertiesSetting::Disabled;
        self
    }

    /// Replace the process environment with another source.
    #[must_use]
    pub fn with_env<S: Source + 'static>(mut self, source: S) -> Self {
        self.env = EnvSetting::Custom(Box::new(source));
        self
    }

    /// Fall back to the variables of a `.env` file for keys missing from the
    /// process environment.
    ///
    /// Has no effect once [`with_env`](Self::with_env) replaced the
    /// environment.
    #[must_use]
    pub fn with_dotenv<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.env = match self.env {
            EnvSetting::Process(env) => EnvSetting::Process(env.with_dotenv(path)),
            custom @ EnvSetting::Custom(_) => {
                tracing::warn!(path = %path.as_ref().display(), "Ignoring .env file for custom environment source");
                custom
            }
        };
        self
    }

    /// Bind `target` from the configured sources.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on the first schema error, missing critical field
    /// or value that cannot be converted. Fields resolved before the error keep
    /// their new values.
    pub fn load<T: Configurable + ?Sized>(&self, target: &mut T) -> Result<()> {
        self.load_with_report(target).map(|_| ())
    }

    /// Bind `target` and report where each field's value came from.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_with_report<T: Configurable + ?Sized>(&self, target: &mut T) -> Result<LoadReport> {
        let file_props = match &self.properties {
            PropertiesSetting::File(path) => Properties::load_optional(path),
            PropertiesSetting::Loaded(_) | PropertiesSetting::Disabled => None,
        };
        let props: Option<&dyn Source> = match &self.properties {
            PropertiesSetting::Loaded(props) => Some(props),
            PropertiesSetting::File(_) => file_props.as_ref().map(|p| p as &dyn Source),
            PropertiesSetting::Disabled => None,
        };

        tracing::debug!(
            target_type = T::type_name(),
            prefix = %self.prefix,
            env = %self.env.as_source().describe(),
            properties = %props.map(|p| p.describe()).unwrap_or_else(|| "none".to_string()),
            "Loading configuration"
        );

        Resolver::new(self.env.as_source())
            .with_properties(props)
            .with_prefix(&self.prefix)
            .resolve(target)
    }
}

/// Load `target` from the environment and `app.properties`.
///
/// # Errors
///
/// See [`ConfigLoader::load`].
pub fn load<T: Configurable + ?Sized>(target: &mut T) -> Result<()> {
    ConfigLoader::new().load(target)
}

/// Load `target` from the environment and the given properties file.
///
/// # Errors
///
/// See [`ConfigLoader::load`].
pub fn load_with_properties<T, P>(target: &mut T, properties_path: P) -> Result<()>
where
    T: Configurable + ?Sized,
    P: AsRef<Path>,
{
    ConfigLoader::new()
        .with_properties_file(properties_path)
        .load(target)
}

/// Load `target` using `prefix` for every key, from the environment and
/// `app.properties`.
///
/// # Errors
///
/// See [`ConfigLoader::load`].
pub fn load_with_prefix<T: Configurable + ?Sized>(target: &mut T, prefix: &str) -> Result<()> {
    ConfigLoader::new().with_prefix(prefix).load(target)
}

/// Load `target` using `prefix` for every key, from the environment and the
/// given properties file.
///
/// # Errors
///
/// See [`ConfigLoader::load`].
pub fn load_with_prefix_and_properties<T, P>(
    target: &mut T,
    prefix: &str,
    properties_path: P,
) -> Result<()>
where
    T: Configurable + ?Sized,
    P: AsRef<Path>,
{
    ConfigLoader::new()
        .with_prefix(prefix)
        .with_properties_file(properties_path)
        .load(target)
}
