//! Scalar values: typing, quoting and rendering.

use crate::lex::{classify_scalar, SyntaxKind};
use std::fmt;

/// Style of scalar representation in YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    /// Plain scalar (no quotes)
    Plain,
    /// Single-quoted scalar
    SingleQuoted,
    /// Double-quoted scalar
    DoubleQuoted,
    /// Literal scalar (|)
    Literal,
    /// Folded scalar (>)
    Folded,
}

/// Type of a scalar value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// String value
    String,
    /// Integer value
    Integer,
    /// Float value
    Float,
    /// Boolean value
    Boolean,
    /// Null value
    Null,
}

impl ScalarType {
    pub(crate) fn from_token_kind(kind: SyntaxKind) -> Self {
        match kind {
            SyntaxKind::INT => ScalarType::Integer,
            SyntaxKind::FLOAT => ScalarType::Float,
            SyntaxKind::BOOL => ScalarType::Boolean,
            SyntaxKind::NULL => ScalarType::Null,
            _ => ScalarType::String,
        }
    }
}

/// A scalar value to be written into a document, with metadata about its
/// style and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarValue {
    /// The actual value
    value: String,
    /// The style to use when rendering
    style: ScalarStyle,
    /// The type of the scalar
    scalar_type: ScalarType,
}

impl ScalarValue {
    /// Create a new string scalar, quoted only when it has to be
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let style = Self::detect_style(&value);
        Self {
            value,
            style,
            scalar_type: ScalarType::String,
        }
    }

    /// Create a new scalar with a specific style
    pub fn with_style(value: impl Into<String>, style: ScalarStyle) -> Self {
        Self {
            value: value.into(),
            style,
            scalar_type: ScalarType::String,
        }
    }

    /// Create a single-quoted scalar
    pub fn single_quoted(value: impl Into<String>) -> Self {
        Self::with_style(value, ScalarStyle::SingleQuoted)
    }

    /// Create a double-quoted scalar
    pub fn double_quoted(value: impl Into<String>) -> Self {
        Self::with_style(value, ScalarStyle::DoubleQuoted)
    }

    /// Create a null scalar
    pub fn null() -> Self {
        Self {
            value: "null".to_string(),
            style: ScalarStyle::Plain,
            scalar_type: ScalarType::Null,
        }
    }

    /// Get the raw value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the style
    pub fn style(&self) -> ScalarStyle {
        self.style
    }

    /// Get the type
    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    /// Token kind of the rendered text, as the lexer would classify it.
    pub(crate) fn token_kind(&self) -> SyntaxKind {
        let text = self.to_yaml_string();
        if text.starts_with('"') {
            SyntaxKind::DOUBLE_QUOTED
        } else if text.starts_with('\'') {
            SyntaxKind::SINGLE_QUOTED
        } else {
            classify_scalar(&text)
        }
    }

    fn detect_style(value: &str) -> ScalarStyle {
        if Self::needs_quoting(value) {
            ScalarStyle::DoubleQuoted
        } else {
            ScalarStyle::Plain
        }
    }

    /// Check if a value needs quoting when treated as a string
    fn needs_quoting(value: &str) -> bool {
        if value.is_empty() {
            return true;
        }

        // Keywords that would be read back as booleans or null
        let lowercase = value.to_lowercase();
        if matches!(
            lowercase.as_str(),
            "true" | "false" | "yes" | "no" | "on" | "off" | "null" | "~"
        ) {
            return true;
        }

        // Numbers stay strings, and so does anything with a leading zero
        if value.starts_with('0') || classify_scalar(value) != SyntaxKind::STRING {
            return true;
        }

        if value.contains(": ") || value.ends_with(':') || value.contains(" #") {
            return true;
        }

        for ch in value.chars() {
            match ch {
                '\'' | '"' | ',' | '[' | ']' | '{' | '}' | '\t' => return true,
                c if c.is_control() => return true,
                _ => {}
            }
        }

        if let Some(first) = value.chars().next() {
            if matches!(
                first,
                '-' | '?' | ':' | '#' | '&' | '*' | '!' | '|' | '>' | '%' | '@' | '`'
            ) {
                return true;
            }
        }

        if value != value.trim() {
            return true;
        }

        false
    }

    /// Render the scalar as a YAML string with proper escaping
    pub fn to_yaml_string(&self) -> String {
        match self.style {
            ScalarStyle::Plain => match self.scalar_type {
                ScalarType::String if Self::needs_quoting(&self.value) => self.to_double_quoted(),
                _ => self.value.clone(),
            },
            ScalarStyle::SingleQuoted => self.to_single_quoted(),
            // Block styles depend on the indentation of the surrounding
            // document; inserted values always stay on one line.
            ScalarStyle::DoubleQuoted | ScalarStyle::Literal | ScalarStyle::Folded => {
                self.to_double_quoted()
            }
        }
    }

    fn to_single_quoted(&self) -> String {
        if self.value.contains(['\n', '\r']) {
            return self.to_double_quoted();
        }
        format!("'{}'", self.value.replace('\'', "''"))
    }

    fn to_double_quoted(&self) -> String {
        let mut result = String::from("\"");
        for ch in self.value.chars() {
            match ch {
                '"' => result.push_str("\\\""),
                '\\' => result.push_str("\\\\"),
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                '\x08' => result.push_str("\\b"),
                '\x0C' => result.push_str("\\f"),
                c if c.is_control() => {
                    result.push_str(&format!("\\x{:02x}", c as u32));
                }
                c => result.push(c),
            }
        }
        result.push('"');
        result
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_yaml_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self {
            value: value.to_string(),
            style: ScalarStyle::Plain,
            scalar_type: ScalarType::Integer,
        }
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        Self {
            value: value.to_string(),
            style: ScalarStyle::Plain,
            scalar_type: ScalarType::Float,
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        Self {
            value: if value { "true" } else { "false" }.to_string(),
            style: ScalarStyle::Plain,
            scalar_type: ScalarType::Boolean,
        }
    }
}

/// Decode the text of a scalar token into the string it denotes.
pub(crate) fn decode_scalar(kind: SyntaxKind, text: &str) -> String {
    match kind {
        SyntaxKind::SINGLE_QUOTED if text.len() >= 2 => {
            text[1..text.len() - 1].replace("''", "'")
        }
        SyntaxKind::DOUBLE_QUOTED if text.len() >= 2 => {
            unescape_double_quoted(&text[1..text.len() - 1])
        }
        SyntaxKind::BLOCK_SCALAR => decode_block_scalar(text),
        _ => text.trim().to_string(),
    }
}

/// Style of a scalar token.
pub(crate) fn style_of(kind: SyntaxKind, text: &str) -> ScalarStyle {
    match kind {
        SyntaxKind::SINGLE_QUOTED => ScalarStyle::SingleQuoted,
        SyntaxKind::DOUBLE_QUOTED => ScalarStyle::DoubleQuoted,
        SyntaxKind::BLOCK_SCALAR if text.starts_with('>') => ScalarStyle::Folded,
        SyntaxKind::BLOCK_SCALAR => ScalarStyle::Literal,
        _ => ScalarStyle::Plain,
    }
}

fn decode_block_scalar(text: &str) -> String {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or_default();
    let folded = header.starts_with('>');
    let chomp_strip = header.contains('-');

    let body: Vec<&str> = lines.collect();
    let indent = body
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);
    let body: Vec<&str> = body
        .iter()
        .map(|line| line.get(indent..).unwrap_or(""))
        .collect();

    let mut result = if folded {
        let mut out = String::new();
        for (idx, line) in body.iter().enumerate() {
            if idx > 0 {
                if line.is_empty() {
                    out.push('\n');
                } else if !body[idx - 1].is_empty() {
                    out.push(' ');
                }
            }
            out.push_str(line);
        }
        out
    } else {
        body.join("\n")
    };

    if !chomp_strip && !result.is_empty() {
        result.push('\n');
    }
    result
}

/// Unescape the body of a double-quoted scalar.
fn unescape_double_quoted(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        let Some(next) = chars.next() else {
            result.push('\\');
            break;
        };
        match next {
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' => result.push('\t'),
            '\\' => result.push('\\'),
            '"' => result.push('"'),
            '/' => result.push('/'),
            'b' => result.push('\u{0008}'),
            'f' => result.push('\u{000C}'),
            'a' => result.push('\u{0007}'),
            'v' => result.push('\u{000B}'),
            'e' => result.push('\u{001B}'),
            '0' => result.push('\0'),
            ' ' => result.push(' '),
            'N' => result.push('\u{0085}'),
            '_' => result.push('\u{00A0}'),
            'L' => result.push('\u{2028}'),
            'P' => result.push('\u{2029}'),
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let hex: String = chars.by_ref().take(width).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => result.push(decoded),
                    None => {
                        result.push('\\');
                        result.push(next);
                        result.push_str(&hex);
                    }
                }
            }
            _ => {
                result.push('\\');
                result.push(next);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_scalars() {
        assert_eq!(ScalarValue::new("simple").to_yaml_string(), "simple");
        assert_eq!(ScalarValue::new("hello world").to_yaml_string(), "hello world");
        assert_eq!(ScalarValue::new("us-west-2").to_yaml_string(), "us-west-2");
        assert_eq!(ScalarValue::new("aws:region").to_yaml_string(), "aws:region");
        assert_eq!(
            ScalarValue::new("http://example.com/#x").to_yaml_string(),
            "http://example.com/#x"
        );
    }

    #[test]
    fn test_values_needing_quotes() {
        assert_eq!(ScalarValue::new("true").to_yaml_string(), "\"true\"");
        assert_eq!(ScalarValue::new("no").to_yaml_string(), "\"no\"");
        assert_eq!(ScalarValue::new("null").to_yaml_string(), "\"null\"");
        assert_eq!(ScalarValue::new("~").to_yaml_string(), "\"~\"");
        assert_eq!(ScalarValue::new("123").to_yaml_string(), "\"123\"");
        assert_eq!(ScalarValue::new("3.14").to_yaml_string(), "\"3.14\"");
        assert_eq!(ScalarValue::new("value: x").to_yaml_string(), "\"value: x\"");
        assert_eq!(ScalarValue::new("# comment").to_yaml_string(), "\"# comment\"");
        assert_eq!(ScalarValue::new("  spaces  ").to_yaml_string(), "\"  spaces  \"");
        assert_eq!(ScalarValue::new("[array]").to_yaml_string(), "\"[array]\"");
        assert_eq!(ScalarValue::new("").to_yaml_string(), "\"\"");
    }

    #[test]
    fn test_leading_zero_is_double_quoted() {
        assert_eq!(ScalarValue::new("0123456").to_yaml_string(), "\"0123456\"");
        assert_eq!(ScalarValue::new("0x").to_yaml_string(), "\"0x\"");
    }

    #[test]
    fn test_single_quoted() {
        let scalar = ScalarValue::single_quoted("value with 'quotes'");
        assert_eq!(scalar.to_yaml_string(), "'value with ''quotes'''");
    }

    #[test]
    fn test_double_quoted() {
        let scalar = ScalarValue::double_quoted("value with \"quotes\" and \\backslash");
        assert_eq!(
            scalar.to_yaml_string(),
            "\"value with \\\"quotes\\\" and \\\\backslash\""
        );

        let scalar = ScalarValue::new("line1\nline2\ttab");
        assert_eq!(scalar.to_yaml_string(), "\"line1\\nline2\\ttab\"");
    }

    #[test]
    fn test_from_types() {
        assert_eq!(ScalarValue::from(42i64).to_yaml_string(), "42");
        assert_eq!(ScalarValue::from(3.5f64).to_yaml_string(), "3.5");
        assert_eq!(ScalarValue::from(true).to_yaml_string(), "true");
        assert_eq!(ScalarValue::from(false).scalar_type(), ScalarType::Boolean);
    }

    #[test]
    fn test_token_kind() {
        assert_eq!(ScalarValue::from(42i64).token_kind(), SyntaxKind::INT);
        assert_eq!(ScalarValue::from(true).token_kind(), SyntaxKind::BOOL);
        assert_eq!(ScalarValue::new("42").token_kind(), SyntaxKind::DOUBLE_QUOTED);
        assert_eq!(ScalarValue::new("x").token_kind(), SyntaxKind::STRING);
    }

    #[test]
    fn test_null_scalar() {
        let scalar = ScalarValue::null();
        assert_eq!(scalar.to_yaml_string(), "null");
        assert_eq!(scalar.scalar_type(), ScalarType::Null);
    }

    #[test]
    fn test_decode_quoted() {
        assert_eq!(decode_scalar(SyntaxKind::SINGLE_QUOTED, "'it''s'"), "it's");
        assert_eq!(
            decode_scalar(SyntaxKind::DOUBLE_QUOTED, "\"a\\tb\\u00e9\""),
            "a\tb\u{e9}"
        );
        assert_eq!(decode_scalar(SyntaxKind::STRING, "plain"), "plain");
    }

    #[test]
    fn test_decode_block_scalars() {
        assert_eq!(
            decode_scalar(SyntaxKind::BLOCK_SCALAR, "|\n  one\n  two"),
            "one\ntwo\n"
        );
        assert_eq!(
            decode_scalar(SyntaxKind::BLOCK_SCALAR, ">-\n  one\n  two\n\n  three"),
            "one two\nthree"
        );
    }
}
