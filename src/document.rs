//! Configuration documents: parsing, editing and writing back.

use crate::key::Key;
use crate::lex::SyntaxKind;
use crate::nodes::{is_flow_collection, Mapping, MappingEntry, Node, Yaml};
use crate::resolver;
use crate::value::ConfigValue;
use crate::{Indentation, ParseError, YamlError, YamlResult};
use rowan::ast::AstNode;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// A YAML configuration file that can be edited without disturbing its
/// comments, ordering or formatting.
///
/// Edits go through [`set`](Self::set) and [`remove`](Self::remove) and
/// address values either by a literal key or by a property path such as
/// `app:servers[0].host`. Only the first document of a multi-document file
/// is edited.
///
/// ```
/// use yaml_config_edit::{ConfigDocument, ConfigValue, Key};
///
/// let mut doc: ConfigDocument = "config:\n  app:name: web # service\n".parse().unwrap();
/// let key: Key = "app:ports[0]".parse().unwrap();
/// doc.set("config", &key, &ConfigValue::new("8080"), true).unwrap();
/// assert_eq!(
///     doc.to_string(),
///     "config:\n  app:name: web # service\n  app:ports:\n  - 8080\n"
/// );
/// ```
#[derive(Debug, Default)]
pub struct ConfigDocument {
    yaml: Option<Yaml>,
    indentation: Indentation,
}

impl ConfigDocument {
    /// Create a document with no content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document from raw bytes. `None` gives an empty document.
    pub fn load(bytes: Option<&[u8]>) -> YamlResult<Self> {
        let Some(bytes) = bytes else {
            return Ok(Self::new());
        };
        let text = std::str::from_utf8(bytes)
            .map_err(|err| ParseError(vec![format!("invalid UTF-8: {}", err)]))?;
        Self::parse(text)
    }

    /// Parse a document from text.
    pub fn parse(text: &str) -> YamlResult<Self> {
        let yaml = Yaml::from_str(text)?;
        debug!(len = text.len(), "parsed configuration document");
        Ok(Self {
            yaml: Some(yaml),
            indentation: Indentation::default(),
        })
    }

    /// Read and parse a file.
    pub fn from_path(path: impl AsRef<Path>) -> YamlResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::load(Some(bytes.as_slice()))
    }

    /// Write the document to a file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> YamlResult<()> {
        std::fs::write(path, self.marshal())?;
        Ok(())
    }

    /// Use `indentation` for structure created by later edits.
    pub fn with_indentation(mut self, indentation: Indentation) -> Self {
        self.indentation = indentation;
        self
    }

    /// The underlying syntax tree, if anything was parsed.
    pub fn yaml(&self) -> Option<&Yaml> {
        self.yaml.as_ref()
    }

    fn content(&self) -> Option<Node> {
        self.yaml.as_ref()?.document()?.content()
    }

    /// Whether there is no content to edit: nothing was parsed, or the
    /// first document holds only comments.
    pub fn is_empty(&self) -> bool {
        self.content().is_none()
    }

    /// Whether the top-level map has an entry named `name`.
    pub fn has_key(&self, name: &str) -> bool {
        self.content()
            .and_then(|content| content.as_mapping())
            .map_or(false, |root| root.contains_key(name))
    }

    /// The serialized document. For a document that was parsed this is the
    /// text with all edits applied; for an empty one it is whatever text
    /// was loaded.
    pub fn marshal(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Set `key` to `value` inside the map under `root_key`, or at the top
    /// level when `root_key` is empty.
    ///
    /// With `path` set, the key's name is a property path and missing maps
    /// and arrays along it are created.
    pub fn set(
        &mut self,
        root_key: &str,
        key: &Key,
        value: &ConfigValue,
        path: bool,
    ) -> YamlResult<()> {
        debug!(root_key, key = %key, path, secure = value.is_secure(), "setting value");
        let Some(content) = self.content() else {
            return Err(YamlError::EmptyDocument);
        };
        let Some(root) = content.as_mapping() else {
            return Err(YamlError::TypeMismatch("expected map".to_string()));
        };
        let container = scope(root, root_key)?;
        resolver::set(&container, key, value, path, self.indent_unit())
    }

    /// Remove `key` from the map under `root_key`.
    ///
    /// Removing something that does not exist is not an error; only a
    /// missing `root_key` is.
    pub fn remove(&mut self, root_key: &str, key: &Key, path: bool) -> YamlResult<()> {
        debug!(root_key, key = %key, path, "removing value");
        let Some(content) = self.content() else {
            return Ok(());
        };
        let Some(root) = content.as_mapping() else {
            if root_key.is_empty() {
                return Ok(());
            }
            return Err(YamlError::RootKeyNotFound(root_key.to_string()));
        };
        let container = scope(root, root_key)?;
        resolver::remove(&container, key, path, self.indent_unit())
    }

    /// Look up the node stored at `key` under `root_key`.
    pub fn get(&self, root_key: &str, key: &Key, path: bool) -> YamlResult<Option<Node>> {
        let Some(content) = self.content() else {
            return Ok(None);
        };
        let Some(root) = content.as_mapping() else {
            if root_key.is_empty() {
                return Ok(None);
            }
            return Err(YamlError::RootKeyNotFound(root_key.to_string()));
        };
        let container = scope(root, root_key)?;
        resolver::get(&container, key, path)
    }

    fn indent_unit(&self) -> usize {
        match self.indentation {
            Indentation::Spaces(spaces) => (spaces as usize).max(1),
            Indentation::Detect => self.detect_indent().unwrap_or(2),
        }
    }

    /// The step between a key and the keys of the block map below it, for
    /// the first such pair in the document.
    fn detect_indent(&self) -> Option<usize> {
        let document = self.yaml.as_ref()?.document()?;
        document
            .syntax()
            .descendants()
            .filter_map(MappingEntry::cast)
            .find_map(|entry| {
                let nested = entry.value()?.as_mapping()?;
                let slot = entry.value_slot()?;
                let on_next_line = slot
                    .first_token()
                    .map_or(false, |token| token.kind() == SyntaxKind::NEWLINE);
                if !on_next_line || is_flow_collection(nested.syntax()) {
                    return None;
                }
                nested.column().checked_sub(entry.key_column()).filter(|step| *step > 0)
            })
    }
}

/// The map the edit applies to: the root itself, or the map under
/// `root_key`.
fn scope(root: Mapping, root_key: &str) -> YamlResult<Mapping> {
    if root_key.is_empty() {
        return Ok(root);
    }
    root.get(root_key)
        .and_then(|node| node.as_mapping())
        .ok_or_else(|| YamlError::RootKeyNotFound(root_key.to_string()))
}

/// Cloning copies the tree, so edits to the clone leave the original alone.
impl Clone for ConfigDocument {
    fn clone(&self) -> Self {
        let yaml = self.yaml.as_ref().map(|yaml| {
            Yaml::from(rowan::SyntaxNode::new_root_mut(
                yaml.syntax().green().into_owned(),
            ))
        });
        Self {
            yaml,
            indentation: self.indentation,
        }
    }
}

impl FromStr for ConfigDocument {
    type Err = YamlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.yaml {
            Some(yaml) => write!(f, "{}", yaml),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> ConfigDocument {
        text.parse().unwrap()
    }

    #[test]
    fn test_empty_documents() {
        let empty = ConfigDocument::load(None).unwrap();
        assert!(empty.is_empty());
        assert!(!empty.has_key("a"));
        assert_eq!(empty.marshal(), b"");

        let comments = doc("# nothing here\n");
        assert!(comments.is_empty());
        assert_eq!(comments.to_string(), "# nothing here\n");
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            ConfigDocument::load(Some(b"a: \xff".as_slice())),
            Err(YamlError::Parse(_))
        ));
    }

    #[test]
    fn test_has_key() {
        let d = doc("config:\n  a: 1\n");
        assert!(d.has_key("config"));
        assert!(!d.has_key("a"));
        assert!(!doc("- config\n").has_key("config"));
    }

    #[test]
    fn test_non_map_root() {
        let mut d = doc("- a\n");
        assert!(matches!(
            d.set("", &Key::local("x"), &ConfigValue::new("1"), false),
            Err(YamlError::TypeMismatch(_))
        ));
        assert!(d.remove("", &Key::local("x"), false).is_ok());
        assert!(matches!(
            d.remove("config", &Key::local("x"), false),
            Err(YamlError::RootKeyNotFound(_))
        ));
    }

    #[test]
    fn test_detect_indent() {
        let d = doc("a:\n    b: 1\n").with_indentation(Indentation::Detect);
        assert_eq!(d.indent_unit(), 4);
        let d = doc("a: 1\n").with_indentation(Indentation::Detect);
        assert_eq!(d.indent_unit(), 2);
        let d = doc("a: 1\n").with_indentation(Indentation::Spaces(3));
        assert_eq!(d.indent_unit(), 3);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = doc("a: 1\n");
        let copy = original.clone();
        original
            .set("", &Key::local("b"), &ConfigValue::new("x"), false)
            .unwrap();
        assert_eq!(original.to_string(), "a: 1\nb: x\n");
        assert_eq!(copy.to_string(), "a: 1\n");
    }

    #[test]
    fn test_get() {
        let d = doc("config:\n  app:db:\n    hosts: [a, b]\n");
        let key: Key = "app:db.hosts[1]".parse().unwrap();
        let node = d.get("config", &key, true).unwrap().unwrap();
        assert_eq!(node.as_scalar().unwrap().value(), "b");
        assert!(d.get("config", &"app:db.port".parse().unwrap(), true).unwrap().is_none());
        assert!(matches!(
            d.get("missing", &key, true),
            Err(YamlError::RootKeyNotFound(_))
        ));
    }
}
