#![deny(missing_docs)]
#![allow(clippy::type_complexity)]
#![warn(clippy::unnecessary_to_owned)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::inefficient_to_string)]
#![warn(clippy::manual_string_new)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

//! A lossless editor for YAML configuration files.
//!
//! Documents are parsed into a concrete syntax tree that keeps every byte of
//! the input, so unedited parts of a file come back exactly as they were. It
//! is based on the [rowan] library.

mod document;
mod error;
mod key;
mod lex;
mod mutation;
mod nodes;
mod parse;
mod resolver;
mod scalar;
mod value;

pub use document::ConfigDocument;
pub use error::{YamlError, YamlResult};
pub use key::{parse_property_path, Key, PathSegment};
pub use lex::{lex, SyntaxKind};
pub use mutation::{push, remove_item, remove_key, set_item, upsert, NewNode};
pub use nodes::{
    Document, Lang, Mapping, MappingEntry, Node, Scalar, SecureValue, Sequence, SequenceEntry,
    Yaml,
};
pub use parse::Parse;
pub use rowan::TextRange;
pub use scalar::{ScalarStyle, ScalarType, ScalarValue};
pub use value::{adjust_value, AdjustedValue, ConfigValue};

/// A positioned parse error containing location information.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionedParseError {
    /// The error message
    pub message: String,
    /// The text range where the error occurred
    pub range: rowan::TextRange,
    /// Optional error code for categorization
    pub code: Option<String>,
}

impl std::fmt::Display for PositionedParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PositionedParseError {}

/// List of encountered syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseError(pub Vec<String>);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for err in &self.0 {
            writeln!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// The indentation to use for structure created by edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indentation {
    /// Follow the indentation of the first nested block map in the document.
    Detect,

    /// The number of spaces to use for indentation.
    Spaces(u32),
}

impl Default for Indentation {
    fn default() -> Self {
        Indentation::Spaces(2)
    }
}
