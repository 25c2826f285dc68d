//! Value sources queried by the resolver.
//!
//! Sources are read-only key lookups. The resolver queries each at most once
//! per field and never writes to them.

use std::collections::HashMap;
use std::env;
use std::path::Path;

/// A read-only key to string lookup.
pub trait Source {
    /// Look up a key, returning `None` if the source does not define it.
    fn get(&self, key: &str) -> Option<String>;

    /// Short description used in log output.
    fn describe(&self) -> String;
}

impl<S: Source + ?Sized> Source for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// The process environment.
///
/// Variables that are unset or not valid UTF-8 are treated as absent. A
/// `.env` overlay may be attached; it is consulted only for keys the real
/// environment lacks, and the process environment itself is never modified.
#[derive(Debug, Clone, Default)]
pub struct ProcessEnv {
    overlay: HashMap<String, String>,
}

impl ProcessEnv {
    /// The bare process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the variables of a `.env` file as a fallback layer.
    ///
    /// A missing or malformed file leaves the overlay unchanged.
    #[must_use]
    pub fn with_dotenv<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        match dotenvy::from_path_iter(path) {
            Ok(iter) => {
                let mut loaded = 0usize;
                for item in iter {
                    match item {
                        Ok((key, value)) => {
                            self.overlay.insert(key, value);
                            loaded += 1;
                        }
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "Skipping malformed .env entry");
                        }
                    }
                }
                tracing::debug!(path = %path.display(), loaded, "Loaded .env overlay");
            }
            Err(e) if e.not_found() => {
                tracing::debug!(path = %path.display(), ".env file not found");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read .env file");
            }
        }
        self
    }

    /// Number of variables in the `.env` overlay.
    pub fn overlay_len(&self) -> usize {
        self.overlay.len()
    }
}

impl Source for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .or_else(|| self.overlay.get(key).cloned())
    }

    fn describe(&self) -> String {
        if self.overlay.is_empty() {
            "environment".to_string()
        } else {
            format!("environment (+{} from .env)", self.overlay.len())
        }
    }
}

/// An in-memory source.
///
/// # Example
///
/// ```
/// use envprops::{MapSource, Source};
///
/// let source = MapSource::new().with("HOST", "example.com");
/// assert_eq!(source.get("HOST").as_deref(), Some("example.com"));
/// assert_eq!(source.get("PORT"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key, replacing any previous value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a key, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the source has no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Source for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn describe(&self) -> String {
        format!("map ({} keys)", self.values.len())
    }
}
