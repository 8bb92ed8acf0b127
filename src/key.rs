//! Configuration keys and the property paths inside them.

use crate::{YamlError, YamlResult};
use std::fmt;
use std::str::FromStr;

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A member of a map.
    Key(String),
    /// An element of an array.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{:?}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A configuration key: an optional namespace and a name.
///
/// The textual form is `namespace:name`, or just `name` when there is no
/// namespace. In path mode the name is a property path such as
/// `servers[0].host` or `labels["app.kubernetes.io/name"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    namespace: String,
    name: String,
}

impl Key {
    /// Create a key from its parts.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create a key without a namespace.
    pub fn local(name: impl Into<String>) -> Self {
        Self::new("", name)
    }

    /// The namespace, empty for local keys.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The name, which may be a property path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Split the name into path segments.
    ///
    /// Also returns the key addressing the first segment, carrying this
    /// key's namespace.
    pub fn parse_path(&self) -> YamlResult<(Vec<PathSegment>, Key)> {
        let segments = parse_property_path(&self.name)?;
        let first = match segments.first() {
            None => return Err(YamlError::InvalidKeyPath("empty config key path".to_string())),
            Some(PathSegment::Index(_)) => {
                return Err(YamlError::InvalidKeyPath(
                    "first path segment of config key must be a string".to_string(),
                ))
            }
            Some(PathSegment::Key(first)) => first,
        };
        if first.is_empty() {
            return Err(YamlError::InvalidKeyPath("config key is empty".to_string()));
        }
        let config_key = Key::new(self.namespace.clone(), first.clone());
        Ok((segments, config_key))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.namespace, self.name)
        }
    }
}

impl FromStr for Key {
    type Err = YamlError;

    /// Parse `name`, `namespace:name` or the older `namespace:config:name`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((namespace, rest)) = s.split_once(':') else {
            return Ok(Key::local(s));
        };
        let name = rest.strip_prefix("config:").unwrap_or(rest);
        if namespace.is_empty() || name.is_empty() {
            return Err(YamlError::InvalidKeyPath(format!(
                "could not parse {:?} as a configuration key",
                s
            )));
        }
        Ok(Key::new(namespace, name))
    }
}

/// Parse a property path like `a.b[0]["c.d"]` into segments.
pub fn parse_property_path(path: &str) -> YamlResult<Vec<PathSegment>> {
    let mut segments = Vec::new();
    let mut rest = path;

    while let Some(first) = rest.chars().next() {
        match first {
            '.' => rest = &rest[1..],
            '[' if rest[1..].starts_with('"') => {
                let mut key = String::new();
                let mut chars = rest.char_indices().skip(2).peekable();
                let close = loop {
                    match chars.next() {
                        None => {
                            return Err(YamlError::InvalidKeyPath(
                                "missing closing quote in property name".to_string(),
                            ))
                        }
                        Some((idx, '"')) => break idx + 1,
                        Some((_, '\\')) if matches!(chars.peek(), Some((_, '"'))) => {
                            chars.next();
                            key.push('"');
                        }
                        Some((_, ch)) => key.push(ch),
                    }
                };
                if !rest[close..].starts_with(']') {
                    return Err(YamlError::InvalidKeyPath(
                        "missing closing bracket in property access".to_string(),
                    ));
                }
                segments.push(PathSegment::Key(key));
                rest = &rest[close + 1..];
            }
            '[' => {
                let Some(close) = rest.find(']') else {
                    return Err(YamlError::InvalidKeyPath(
                        "missing closing bracket in array index".to_string(),
                    ));
                };
                let index = &rest[1..close];
                let index = index.parse::<usize>().map_err(|err| {
                    YamlError::InvalidKeyPath(format!("invalid array index {:?}: {}", index, err))
                })?;
                segments.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
            }
            _ => {
                let end = rest.find(['.', '[']).unwrap_or(rest.len());
                segments.push(PathSegment::Key(rest[..end].to_string()));
                rest = &rest[end..];
            }
        }
    }

    Ok(segments)
}
