//! Properties file source.
//!
//! Parses the conventional `key=value` text format. Files ending in `.toml`
//! or `.json` are read as flat tables instead.
//!
//! ```text
//! # comment
//! ! also a comment
//! HOST = example.com
//! PORT: 8080
//! GREETING hello \
//!          world
//! PATH=C:\\temp\u0021
//! URL=http://${HOST}:${PORT}/
//! ```
//!
//! `${key}` references in text-format values are expanded against the other
//! entries first, then the process environment. A key nobody defines expands
//! to an empty string.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PropertiesError;
use crate::source::{ProcessEnv, Source};

/// A loaded set of properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
    origin: Option<PathBuf>,
}

impl Properties {
    /// Parse properties from text, expanding `${key}` references against the
    /// process environment for keys the text does not define.
    ///
    /// # Errors
    ///
    /// Returns `PropertiesError::InvalidEscape` for a malformed `\uXXXX` escape
    /// and `PropertiesError::CircularReference` for a `${key}` cycle.
    ///
    /// # Example
    ///
    /// ```
    /// use envprops::Properties;
    ///
    /// let props = Properties::parse("HOST=example.com\n# comment\nURL : http://${HOST}/").unwrap();
    /// assert_eq!(props.get("HOST"), Some("example.com"));
    /// assert_eq!(props.get("URL"), Some("http://example.com/"));
    /// ```
    pub fn parse(content: &str) -> Result<Self, PropertiesError> {
        Self::parse_with_env(content, &ProcessEnv::new())
    }

    /// Parse properties from text, resolving `${key}` references missing from
    /// the text in `env`.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse).
    pub fn parse_with_env(content: &str, env: &dyn Source) -> Result<Self, PropertiesError> {
        let mut raw = HashMap::new();

        for (line, logical) in logical_lines(content) {
            let (key, value) = split_entry(&logical, line)?;
            raw.insert(key, value);
        }

        Ok(Self {
            entries: expand_references(&raw, env)?,
            origin: None,
        })
    }

    /// Load properties from a file.
    ///
    /// The format is chosen by extension: `.toml` and `.json` are parsed as
    /// flat tables, anything else as properties text.
    ///
    /// # Errors
    ///
    /// Returns `PropertiesError` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PropertiesError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| PropertiesError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        let mut props = match extension.as_deref() {
            Some("toml") => Self::from_toml(&content)?,
            Some("json") => Self::from_json(&content)?,
            _ => Self::parse(&content)?,
        };
        props.origin = Some(path.to_path_buf());
        Ok(props)
    }

    /// Load properties from a file, treating any failure as "no file".
    ///
    /// A missing file is logged at debug level, any other failure at warn.
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(props) => {
                tracing::debug!(path = %path.display(), keys = props.len(), "Loaded properties file");
                Some(props)
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = %path.display(), "Properties file not found, continuing without it");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable properties file");
                None
            }
        }
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The file these properties were read from, if any.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    fn from_toml(content: &str) -> Result<Self, PropertiesError> {
        let table: toml::Table = toml::from_str(content)?;
        let mut entries = HashMap::with_capacity(table.len());

        for (key, value) in table {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Datetime(d) => d.to_string(),
                toml::Value::Array(_) | toml::Value::Table(_) => {
                    return Err(PropertiesError::NotFlat { key })
                }
            };
            entries.insert(key, value);
        }

        Ok(Self {
            entries,
            origin: None,
        })
    }

    fn from_json(content: &str) -> Result<Self, PropertiesError> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut entries = HashMap::with_capacity(object.len());

        for (key, value) in object {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                // null behaves as an absent key
                serde_json::Value::Null => continue,
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Err(PropertiesError::NotFlat { key })
                }
            };
            entries.insert(key, value);
        }

        Ok(Self {
            entries,
            origin: None,
        })
    }
}

impl Source for Properties {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn describe(&self) -> String {
        match &self.origin {
            Some(path) => format!("properties ({})", path.display()),
            None => "properties".to_string(),
        }
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Join continued physical lines, dropping blanks and comments.
///
/// Yields the 1-based number of the first physical line with each logical line.
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, physical) in content.lines().enumerate() {
        let trimmed = physical.trim_start_matches(is_blank);

        let (start, mut buf) = match pending.take() {
            Some(p) => p,
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                (idx + 1, String::new())
            }
        };

        let trailing = trimmed.chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            buf.push_str(&trimmed[..trimmed.len() - 1]);
            pending = Some((start, buf));
        } else {
            buf.push_str(trimmed);
            lines.push((start, buf));
        }
    }

    // A continuation on the final line ends the entry
    if let Some(p) = pending {
        lines.push(p);
    }

    lines
}

/// Split a logical line into its unescaped key and value.
fn split_entry(logical: &str, line: usize) -> Result<(String, String), PropertiesError> {
    let mut key_end = logical.len();
    let mut escaped = false;

    for (i, c) in logical.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = i;
            break;
        }
    }

    let rest = logical[key_end..].trim_start_matches(is_blank);
    let rest = rest
        .strip_prefix(['=', ':'])
        .map_or(rest, |r| r.trim_start_matches(is_blank));

    Ok((
        unescape(&logical[..key_end], line)?,
        unescape(rest, line)?,
    ))
}

fn unescape(raw: &str, line: usize) -> Result<String, PropertiesError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => out.push(decode_unicode(&mut chars, line)?),
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

/// Decode the `XXXX` of a `\uXXXX` escape, pairing a high surrogate with a
/// directly following `\uXXXX` low surrogate.
fn decode_unicode(chars: &mut std::str::Chars<'_>, line: usize) -> Result<char, PropertiesError> {
    let invalid = || PropertiesError::InvalidEscape { line };
    let unit = read_hex4(chars).ok_or_else(invalid)?;

    if !(0xD800..=0xDBFF).contains(&unit) {
        return char::from_u32(unit).ok_or_else(invalid);
    }

    let mut ahead = chars.clone();
    if ahead.next() != Some('\\') || ahead.next() != Some('u') {
        return Err(invalid());
    }
    let low = read_hex4(&mut ahead)
        .filter(|low| (0xDC00..=0xDFFF).contains(low))
        .ok_or_else(invalid)?;
    *chars = ahead;

    char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)).ok_or_else(invalid)
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok()
}

/// Expand `${key}` references in every value.
fn expand_references(
    raw: &HashMap<String, String>,
    env: &dyn Source,
) -> Result<HashMap<String, String>, PropertiesError> {
    let mut expanded = HashMap::with_capacity(raw.len());

    for (key, value) in raw {
        let mut visiting = vec![key.as_str()];
        let value = expand_value(value, raw, env, &mut visiting)?;
        expanded.insert(key.clone(), value);
    }

    Ok(expanded)
}

fn expand_value<'a>(
    value: &str,
    raw: &'a HashMap<String, String>,
    env: &dyn Source,
    visiting: &mut Vec<&'a str>,
) -> Result<String, PropertiesError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        // An unterminated reference is kept as text
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let name = &rest[start + 2..start + 2 + len];
        out.push_str(&rest[..start]);
        rest = &rest[start + 3 + len..];

        if visiting.iter().any(|k| *k == name) {
            return Err(PropertiesError::CircularReference {
                key: name.to_string(),
            });
        }

        if let Some((key, referenced)) = raw.get_key_value(name) {
            visiting.push(key.as_str());
            out.push_str(&expand_value(referenced, raw, env, visiting)?);
            visiting.pop();
        } else if let Some(from_env) = env.get(name) {
            out.push_str(&from_env);
        }
    }

    out.push_str(rest);
    Ok(out)
}
