//! Typed views over the syntax tree of a YAML configuration file.
//!
//! Every wrapper holds a handle into a shared, mutable tree: edits made
//! through one handle are visible through every other handle into the
//! same tree.

use crate::lex::SyntaxKind;
use crate::scalar::{decode_scalar, style_of, ScalarStyle, ScalarType};
use crate::Parse;
use rowan::ast::AstNode;
use std::str::FromStr;

/// YAML language type for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lang {}

impl rowan::Language for Lang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ERROR_TOKEN as u16);
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub(crate) type SyntaxNode = rowan::SyntaxNode<Lang>;
pub(crate) type SyntaxToken = rowan::SyntaxToken<Lang>;
pub(crate) type SyntaxElement = rowan::SyntaxElement<Lang>;

/// A macro to create AST node wrappers.
macro_rules! ast_node {
    ($ast:ident, $kind:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $ast(SyntaxNode);

        impl std::fmt::Debug for $ast {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ast))
                    .field("syntax", &self.0)
                    .finish()
            }
        }

        impl AstNode for $ast {
            type Language = Lang;

            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(syntax: SyntaxNode) -> Option<Self> {
                if Self::can_cast(syntax.kind()) {
                    Some(Self(syntax))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }

        impl From<SyntaxNode> for $ast {
            fn from(node: SyntaxNode) -> Self {
                $ast(node)
            }
        }

        impl std::fmt::Display for $ast {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.text())
            }
        }
    };
}

ast_node!(Yaml, ROOT, "A parsed YAML file");
ast_node!(Document, DOCUMENT, "A single YAML document");
ast_node!(Mapping, MAPPING, "A YAML mapping, in block or flow style");
ast_node!(MappingEntry, MAPPING_ENTRY, "A key-value pair of a mapping");
ast_node!(Sequence, SEQUENCE, "A YAML sequence, in block or flow style");
ast_node!(SequenceEntry, SEQUENCE_ENTRY, "An item of a sequence");
ast_node!(Scalar, SCALAR, "A YAML scalar");

impl Yaml {
    /// Parse YAML text, keeping errors alongside the (partial) tree.
    pub fn parse(text: &str) -> Parse<Yaml> {
        Parse::parse_yaml(text)
    }

    /// All documents in the file.
    pub fn documents(&self) -> impl Iterator<Item = Document> {
        self.0.children().filter_map(Document::cast)
    }

    /// The first document, which is the one configuration edits apply to.
    pub fn document(&self) -> Option<Document> {
        self.documents().next()
    }
}

impl FromStr for Yaml {
    type Err = crate::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parse::parse_yaml(s).to_result()
    }
}

impl Document {
    /// The top-level node of the document, if it has any content.
    pub fn content(&self) -> Option<Node> {
        self.0.children().find_map(Node::cast)
    }

    /// The top-level mapping, if the document is one.
    pub fn as_mapping(&self) -> Option<Mapping> {
        self.content().and_then(|node| node.as_mapping())
    }
}

/// Zero-based column of a token, counted in characters.
pub(crate) fn column_of(token: &SyntaxToken) -> usize {
    let mut column = 0;
    let mut current = previous_token(token);
    while let Some(prev) = current {
        let text = prev.text();
        if let Some(idx) = text.rfind(['\n', '\r']) {
            return column + text[idx + 1..].chars().count();
        }
        column += text.chars().count();
        current = previous_token(&prev);
    }
    column
}

/// Like `SyntaxToken::prev_token`, but steps over empty nodes such as the
/// VALUE of a null entry instead of stopping at them.
fn previous_token(token: &SyntaxToken) -> Option<SyntaxToken> {
    let mut element: SyntaxElement = token.clone().into();
    loop {
        match element.prev_sibling_or_token() {
            Some(prev) => {
                if let Some(found) = last_token_of(&prev) {
                    return Some(found);
                }
                element = prev;
            }
            None => element = element.parent()?.into(),
        }
    }
}

fn last_token_of(element: &SyntaxElement) -> Option<SyntaxToken> {
    match element {
        rowan::NodeOrToken::Token(token) => Some(token.clone()),
        rowan::NodeOrToken::Node(node) => node.last_token().or_else(|| {
            node.descendants_with_tokens()
                .filter_map(|child| child.into_token())
                .last()
        }),
    }
}

/// Whether `node` is a mapping or sequence written in flow style.
pub(crate) fn is_flow_collection(node: &SyntaxNode) -> bool {
    matches!(node.kind(), SyntaxKind::MAPPING | SyntaxKind::SEQUENCE)
        && node.first_token().map_or(false, |token| {
            matches!(
                token.kind(),
                SyntaxKind::LEFT_BRACE | SyntaxKind::LEFT_BRACKET
            )
        })
}

fn value_of(slot: Option<SyntaxNode>) -> Option<Node> {
    slot?.children().find_map(Node::cast)
}

impl MappingEntry {
    /// The token holding the key.
    pub(crate) fn key_token(&self) -> Option<SyntaxToken> {
        self.0
            .children()
            .find(|child| child.kind() == SyntaxKind::KEY)?
            .first_token()
    }

    /// The key, with quotes and escapes resolved.
    pub fn key(&self) -> Option<String> {
        let token = self.key_token()?;
        Some(decode_scalar(token.kind(), token.text()))
    }

    /// The VALUE node, empty when the value is null.
    pub(crate) fn value_slot(&self) -> Option<SyntaxNode> {
        self.0
            .children()
            .find(|child| child.kind() == SyntaxKind::VALUE)
    }

    /// The value; `None` for an explicit or implicit null.
    pub fn value(&self) -> Option<Node> {
        value_of(self.value_slot())
    }

    /// Zero-based column of the key.
    pub fn key_column(&self) -> usize {
        self.key_token().map_or(0, |token| column_of(&token))
    }
}

impl SequenceEntry {
    pub(crate) fn value_slot(&self) -> Option<SyntaxNode> {
        self.0
            .children()
            .find(|child| child.kind() == SyntaxKind::VALUE)
    }

    /// The item; `None` for a null item.
    pub fn value(&self) -> Option<Node> {
        value_of(self.value_slot())
    }
}

impl Mapping {
    /// Whether the mapping is written as `{...}`.
    pub fn is_flow(&self) -> bool {
        is_flow_collection(&self.0)
    }

    /// Entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = MappingEntry> {
        self.0.children().filter_map(MappingEntry::cast)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Whether the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = String> {
        self.entries().filter_map(|entry| entry.key())
    }

    /// The first entry whose key equals `key`.
    pub fn find_entry(&self, key: &str) -> Option<MappingEntry> {
        self.entries()
            .find(|entry| entry.key().as_deref() == Some(key))
    }

    /// Whether an entry for `key` exists, whatever its value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.find_entry(key).is_some()
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Node> {
        self.find_entry(key)?.value()
    }

    /// Zero-based column of the first token: the first key for block
    /// mappings, the opening brace for flow mappings.
    pub fn column(&self) -> usize {
        self.0.first_token().map_or(0, |token| column_of(&token))
    }

    /// Whether this is the reserved `{secure: <value>}` wrapper.
    pub fn is_secure(&self) -> bool {
        let mut entries = self.entries();
        match (entries.next(), entries.next()) {
            (Some(entry), None) => entry.key().as_deref() == Some("secure"),
            _ => false,
        }
    }
}

impl Sequence {
    /// Whether the sequence is written as `[...]`.
    pub fn is_flow(&self) -> bool {
        is_flow_collection(&self.0)
    }

    /// Entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = SequenceEntry> {
        self.0.children().filter_map(SequenceEntry::cast)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Whether the sequence has no items.
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// The entry at `index`.
    pub fn entry(&self, index: usize) -> Option<SequenceEntry> {
        self.entries().nth(index)
    }

    /// Item values in document order; null items are skipped.
    pub fn items(&self) -> impl Iterator<Item = Node> {
        self.entries().filter_map(|entry| entry.value())
    }

    /// The item at `index`; `None` if out of range or null.
    pub fn get(&self, index: usize) -> Option<Node> {
        self.entry(index)?.value()
    }

    /// Zero-based column of the first dash, or of the opening bracket.
    pub fn column(&self) -> usize {
        self.0.first_token().map_or(0, |token| column_of(&token))
    }
}

impl Scalar {
    fn token(&self) -> Option<SyntaxToken> {
        self.0.first_token()
    }

    /// The scalar's string value, with quotes and escapes resolved.
    pub fn value(&self) -> String {
        self.token()
            .map(|token| decode_scalar(token.kind(), token.text()))
            .unwrap_or_default()
    }

    /// The scalar exactly as written.
    pub fn raw_text(&self) -> String {
        self.0.text().to_string()
    }

    /// How a YAML reader would type the scalar.
    pub fn scalar_type(&self) -> ScalarType {
        self.token()
            .map_or(ScalarType::Null, |token| ScalarType::from_token_kind(token.kind()))
    }

    /// The style the scalar is written in.
    pub fn style(&self) -> ScalarStyle {
        self.token()
            .map_or(ScalarStyle::Plain, |token| style_of(token.kind(), token.text()))
    }

    /// Whether the scalar is single- or double-quoted.
    pub fn is_quoted(&self) -> bool {
        matches!(
            self.style(),
            ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted
        )
    }
}

/// The reserved `{secure: <ciphertext>}` mapping marking a secret value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecureValue(Mapping);

impl SecureValue {
    /// The wrapped ciphertext node.
    pub fn value(&self) -> Option<Node> {
        self.0.get("secure")
    }

    /// The underlying one-entry mapping.
    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }
}

/// Any value node of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// A mapping that is not a secure wrapper.
    Mapping(Mapping),
    /// A sequence.
    Sequence(Sequence),
    /// A scalar.
    Scalar(Scalar),
    /// A `{secure: ...}` wrapper.
    SecureWrapper(SecureValue),
}

impl Node {
    /// Classify a syntax node, or `None` if it is not a value node.
    ///
    /// The classification reflects the node's shape at the time of the
    /// call: a mapping that gains or loses entries may change variant.
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::MAPPING => {
                let mapping = Mapping(node);
                if mapping.is_secure() {
                    Some(Node::SecureWrapper(SecureValue(mapping)))
                } else {
                    Some(Node::Mapping(mapping))
                }
            }
            SyntaxKind::SEQUENCE => Some(Node::Sequence(Sequence(node))),
            SyntaxKind::SCALAR => Some(Node::Scalar(Scalar(node))),
            _ => None,
        }
    }

    /// The underlying syntax node.
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Node::Mapping(mapping) => mapping.syntax(),
            Node::Sequence(sequence) => sequence.syntax(),
            Node::Scalar(scalar) => scalar.syntax(),
            Node::SecureWrapper(secure) => secure.0.syntax(),
        }
    }

    /// Scalars and secure wrappers are leaves; collections are not.
    pub fn is_simple(&self) -> bool {
        matches!(self, Node::Scalar(_) | Node::SecureWrapper(_))
    }

    /// The node as a mapping; secure wrappers are mappings too.
    pub fn as_mapping(&self) -> Option<Mapping> {
        match self {
            Node::Mapping(mapping) => Some(mapping.clone()),
            Node::SecureWrapper(secure) => Some(secure.0.clone()),
            _ => None,
        }
    }

    /// The node as a sequence.
    pub fn as_sequence(&self) -> Option<Sequence> {
        match self {
            Node::Sequence(sequence) => Some(sequence.clone()),
            _ => None,
        }
    }

    /// The node as a scalar.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Node::Scalar(scalar) => Some(scalar.clone()),
            _ => None,
        }
    }

    /// Zero-based column the node starts at.
    pub fn column(&self) -> usize {
        self.syntax()
            .first_token()
            .map_or(0, |token| column_of(&token))
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.syntax().text())
    }
}
