//! Parser types and utilities.

use crate::lex::{lex, SyntaxKind};
use crate::PositionedParseError;
use rowan::{GreenNode, GreenNodeBuilder, TextRange, TextSize};

/// The result of a parse operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse<T> {
    green_node: GreenNode,
    errors: Vec<String>,
    positioned_errors: Vec<PositionedParseError>,
    _ty: std::marker::PhantomData<fn() -> T>,
}

impl<T> Parse<T> {
    pub(crate) fn new_with_positioned_errors(
        green_node: GreenNode,
        errors: Vec<String>,
        positioned_errors: Vec<PositionedParseError>,
    ) -> Self {
        Parse {
            green_node,
            errors,
            positioned_errors,
            _ty: std::marker::PhantomData,
        }
    }

    /// The parse tree. If there were no parse errors, this is a valid tree.
    /// If there were parse errors, this tree might be only partially valid.
    ///
    /// The returned tree is mutable: edits made through it are visible to
    /// every handle into the same tree.
    pub fn tree(&self) -> T
    where
        T: From<rowan::SyntaxNode<crate::Lang>>,
    {
        let syntax_node = rowan::SyntaxNode::new_root_mut(self.green_node.clone());
        T::from(syntax_node)
    }

    /// Parse errors, if any.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Positioned parse errors with location information.
    pub fn positioned_errors(&self) -> &[PositionedParseError] {
        &self.positioned_errors
    }

    /// Convert parse result to Result, failing if there are any errors.
    pub fn to_result(self) -> Result<T, crate::ParseError>
    where
        T: From<rowan::SyntaxNode<crate::Lang>>,
    {
        if !self.errors.is_empty() {
            Err(crate::ParseError(self.errors))
        } else {
            Ok(self.tree())
        }
    }

    /// Whether the parse had any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Parse<crate::Yaml> {
    /// Parse YAML text, returning a Parse result
    pub fn parse_yaml(text: &str) -> Self {
        let parsed = parse(text);
        Parse::new_with_positioned_errors(
            parsed.green_node,
            parsed.errors,
            parsed.positioned_errors,
        )
    }
}

pub(crate) struct ParsedYaml {
    pub(crate) green_node: GreenNode,
    pub(crate) errors: Vec<String>,
    pub(crate) positioned_errors: Vec<PositionedParseError>,
}

/// Parse YAML text into a lossless green tree.
pub(crate) fn parse(text: &str) -> ParsedYaml {
    Parser::new(text).parse()
}

/// Where a value being parsed hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// The value of a block mapping entry whose key sits at this column.
    MappingEntry(usize),
    /// The value of a block sequence entry whose dash sits at this column.
    SequenceEntry(usize),
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<(SyntaxKind, &'a str)>,
    /// Column of each token, in characters.
    columns: Vec<usize>,
    /// Byte offset of each token.
    offsets: Vec<usize>,
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<String>,
    positioned_errors: Vec<PositionedParseError>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let tokens = lex(text);
        let mut columns = Vec::with_capacity(tokens.len());
        let mut offsets = Vec::with_capacity(tokens.len());
        let mut column = 0;
        let mut offset = 0;
        for (_, token_text) in &tokens {
            columns.push(column);
            offsets.push(offset);
            offset += token_text.len();
            match token_text.rfind(['\n', '\r']) {
                Some(idx) => column = token_text[idx + 1..].chars().count(),
                None => column += token_text.chars().count(),
            }
        }

        Self {
            text,
            tokens,
            columns,
            offsets,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            positioned_errors: Vec::new(),
        }
    }

    fn parse(mut self) -> ParsedYaml {
        self.builder.start_node(SyntaxKind::ROOT.into());
        while self.current().is_some() {
            self.parse_document();
        }
        self.builder.finish_node();

        ParsedYaml {
            green_node: self.builder.finish(),
            errors: self.errors,
            positioned_errors: self.positioned_errors,
        }
    }

    fn parse_document(&mut self) {
        use SyntaxKind::*;

        self.builder.start_node(DOCUMENT.into());

        let mut seen_start = false;
        loop {
            match self.current() {
                Some(kind) if kind.is_trivia() => self.bump(),
                Some(DIRECTIVE) if !seen_start => self.bump(),
                Some(DOC_START) if !seen_start => {
                    seen_start = true;
                    self.bump();
                }
                Some(DOC_END) => {
                    self.bump();
                    self.finish_document_tail();
                    self.builder.finish_node();
                    return;
                }
                _ => break,
            }
        }

        if matches!(self.current(), Some(kind) if !matches!(kind, DOC_START | DIRECTIVE)) {
            self.parse_block_node(None);
        }

        loop {
            match self.current() {
                None | Some(DOC_START) | Some(DIRECTIVE) => break,
                Some(kind) if kind.is_trivia() => self.bump(),
                Some(DOC_END) => {
                    self.bump();
                    self.finish_document_tail();
                    break;
                }
                Some(_) => self.error_until_document_end("unexpected content"),
            }
        }

        self.builder.finish_node();
    }

    /// After '...' only trivia on the same line belongs to the document.
    fn finish_document_tail(&mut self) {
        while let Some(kind) = self.current() {
            match kind {
                SyntaxKind::WHITESPACE | SyntaxKind::COMMENT => self.bump(),
                SyntaxKind::NEWLINE => {
                    self.bump();
                    break;
                }
                _ => break,
            }
        }
    }

    /// Parse the node starting at the current (non-trivia) token.
    fn parse_block_node(&mut self, slot: Option<Slot>) {
        use SyntaxKind::*;

        let Some(kind) = self.current() else {
            return;
        };
        let column = self.columns[self.pos];
        match kind {
            DASH => self.parse_block_sequence(column),
            LEFT_BRACE => self.parse_flow_mapping(),
            LEFT_BRACKET => self.parse_flow_sequence(),
            kind if kind.is_inline_scalar() && self.is_key_at(self.pos) => {
                if let Some(Slot::MappingEntry(_)) = slot {
                    if self.on_same_line_as_previous(self.pos) {
                        self.error_token("nested mappings are not allowed in compact mappings");
                        return;
                    }
                }
                self.parse_block_mapping(column)
            }
            kind if kind.is_inline_scalar() || kind == BLOCK_SCALAR => self.parse_scalar(),
            _ => self.error_token("unexpected token"),
        }
    }

    fn parse_scalar(&mut self) {
        self.builder.start_node(SyntaxKind::SCALAR.into());
        self.bump();
        self.builder.finish_node();
    }

    fn parse_block_mapping(&mut self, column: usize) {
        self.builder.start_node(SyntaxKind::MAPPING.into());
        loop {
            self.parse_mapping_entry(column);
            if !self.continue_block(column, SyntaxKind::MAPPING) {
                break;
            }
        }
        self.builder.finish_node();
    }

    fn parse_mapping_entry(&mut self, column: usize) {
        self.builder.start_node(SyntaxKind::MAPPING_ENTRY.into());

        self.builder.start_node(SyntaxKind::KEY.into());
        self.bump();
        self.builder.finish_node();

        self.skip_whitespace();
        if self.current() == Some(SyntaxKind::COLON) {
            self.bump();
        }
        self.parse_entry_value(Slot::MappingEntry(column));

        self.builder.finish_node();
    }

    fn parse_block_sequence(&mut self, column: usize) {
        self.builder.start_node(SyntaxKind::SEQUENCE.into());
        loop {
            self.builder.start_node(SyntaxKind::SEQUENCE_ENTRY.into());
            self.bump();
            self.parse_entry_value(Slot::SequenceEntry(column));
            self.builder.finish_node();

            if !self.continue_block(column, SyntaxKind::SEQUENCE) {
                break;
            }
        }
        self.builder.finish_node();
    }

    /// Parse what follows a ':' or '-' indicator of a block entry.
    ///
    /// The VALUE node holds the value content; for values on following lines
    /// it also holds the line break and indentation leading up to them.
    fn parse_entry_value(&mut self, slot: Slot) {
        use SyntaxKind::*;

        self.skip_whitespace();
        match self.current() {
            None | Some(NEWLINE) | Some(COMMENT) => {
                if self.current() == Some(COMMENT) {
                    self.bump();
                }
                let nested = self
                    .next_content(self.pos)
                    .filter(|&idx| self.starts_nested_value(idx, slot));

                self.builder.start_node(VALUE.into());
                if let Some(idx) = nested {
                    while self.pos < idx {
                        self.bump();
                    }
                    self.parse_block_node(Some(slot));
                }
                self.builder.finish_node();
            }
            Some(DASH) if matches!(slot, Slot::MappingEntry(_)) => {
                self.builder.start_node(VALUE.into());
                self.builder.finish_node();
                self.error_token("block sequence entries are not allowed on the line of their key");
            }
            Some(_) => {
                self.builder.start_node(VALUE.into());
                self.parse_block_node(Some(slot));
                self.builder.finish_node();
                self.skip_trailing_comment();
            }
        }
    }

    fn starts_nested_value(&self, idx: usize, slot: Slot) -> bool {
        use SyntaxKind::*;

        let (kind, _) = self.tokens[idx];
        if matches!(kind, DOC_START | DOC_END | DIRECTIVE) || !self.at_line_start(idx) {
            return false;
        }
        let column = self.columns[idx];
        match slot {
            Slot::MappingEntry(key_column) => {
                column > key_column || (column == key_column && kind == DASH)
            }
            Slot::SequenceEntry(dash_column) => column > dash_column,
        }
    }

    /// Decide whether the block collection at `column` goes on after the
    /// current entry. If it does, the trivia in between is consumed into it.
    fn continue_block(&mut self, column: usize, kind: SyntaxKind) -> bool {
        let Some(next) = self.next_content(self.pos) else {
            return false;
        };
        let crosses_line = self.tokens[self.pos..next]
            .iter()
            .any(|(kind, _)| *kind == SyntaxKind::NEWLINE);
        if !crosses_line || !self.at_line_start(next) || self.columns[next] != column {
            return false;
        }
        let continues = match kind {
            SyntaxKind::MAPPING => self.is_key_at(next),
            _ => self.tokens[next].0 == SyntaxKind::DASH,
        };
        if continues {
            while self.pos < next {
                self.bump();
            }
        }
        continues
    }

    fn parse_flow_mapping(&mut self) {
        use SyntaxKind::*;

        self.builder.start_node(MAPPING.into());
        self.bump();
        loop {
            self.skip_flow_trivia();
            match self.current() {
                Some(RIGHT_BRACE) => {
                    self.bump();
                    break;
                }
                Some(COMMA) => self.bump(),
                Some(kind) if kind.is_inline_scalar() => {
                    self.builder.start_node(MAPPING_ENTRY.into());
                    self.builder.start_node(KEY.into());
                    self.bump();
                    self.builder.finish_node();
                    self.skip_flow_trivia();
                    if self.current() == Some(COLON) {
                        self.bump();
                        self.skip_flow_trivia();
                        self.parse_flow_value();
                    } else {
                        self.builder.start_node(VALUE.into());
                        self.builder.finish_node();
                    }
                    self.builder.finish_node();
                }
                None => {
                    self.error_at_end("unterminated flow mapping");
                    break;
                }
                Some(_) => self.error_token("unexpected token in flow mapping"),
            }
        }
        self.builder.finish_node();
    }

    fn parse_flow_sequence(&mut self) {
        use SyntaxKind::*;

        self.builder.start_node(SEQUENCE.into());
        self.bump();
        loop {
            self.skip_flow_trivia();
            match self.current() {
                Some(RIGHT_BRACKET) => {
                    self.bump();
                    break;
                }
                Some(COMMA) => self.bump(),
                Some(kind) if kind.is_inline_scalar() || matches!(kind, LEFT_BRACE | LEFT_BRACKET) => {
                    self.builder.start_node(SEQUENCE_ENTRY.into());
                    self.parse_flow_value();
                    self.builder.finish_node();
                }
                None => {
                    self.error_at_end("unterminated flow sequence");
                    break;
                }
                Some(_) => self.error_token("unexpected token in flow sequence"),
            }
        }
        self.builder.finish_node();
    }

    fn parse_flow_value(&mut self) {
        use SyntaxKind::*;

        self.builder.start_node(VALUE.into());
        match self.current() {
            Some(LEFT_BRACE) => self.parse_flow_mapping(),
            Some(LEFT_BRACKET) => self.parse_flow_sequence(),
            Some(kind) if kind.is_inline_scalar() => self.parse_scalar(),
            _ => {}
        }
        self.builder.finish_node();
    }

    fn skip_whitespace(&mut self) {
        while self.current() == Some(SyntaxKind::WHITESPACE) {
            self.bump();
        }
    }

    fn skip_flow_trivia(&mut self) {
        while matches!(self.current(), Some(kind) if kind.is_trivia()) {
            self.bump();
        }
    }

    /// Whitespace and a comment closing the line of an inline value.
    fn skip_trailing_comment(&mut self) {
        if self.current() != Some(SyntaxKind::WHITESPACE) {
            return;
        }
        match self.nth(1) {
            Some(SyntaxKind::COMMENT) => {
                self.bump();
                self.bump();
            }
            None | Some(SyntaxKind::NEWLINE) => self.bump(),
            _ => {}
        }
    }

    /// Whether the token at `idx` is a scalar followed by a ':' indicator.
    fn is_key_at(&self, idx: usize) -> bool {
        let Some((kind, _)) = self.tokens.get(idx) else {
            return false;
        };
        if !kind.is_inline_scalar() {
            return false;
        }
        self.tokens[idx + 1..]
            .iter()
            .find(|(kind, _)| *kind != SyntaxKind::WHITESPACE)
            .map_or(false, |(kind, _)| *kind == SyntaxKind::COLON)
    }

    fn at_line_start(&self, idx: usize) -> bool {
        idx == 0
            || matches!(
                self.tokens[idx - 1].0,
                SyntaxKind::NEWLINE | SyntaxKind::INDENT
            )
    }

    fn on_same_line_as_previous(&self, idx: usize) -> bool {
        !self.at_line_start(idx)
    }

    fn next_content(&self, from: usize) -> Option<usize> {
        (from..self.tokens.len()).find(|&idx| !self.tokens[idx].0.is_trivia())
    }

    fn current(&self) -> Option<SyntaxKind> {
        self.tokens.get(self.pos).map(|(kind, _)| *kind)
    }

    fn nth(&self, n: usize) -> Option<SyntaxKind> {
        self.tokens.get(self.pos + n).map(|(kind, _)| *kind)
    }

    fn bump(&mut self) {
        if let Some((kind, text)) = self.tokens.get(self.pos) {
            self.builder.token((*kind).into(), text);
            self.pos += 1;
        }
    }

    fn error_token(&mut self, message: &str) {
        self.add_error(message, self.pos);
        self.builder.start_node(SyntaxKind::ERROR.into());
        self.bump();
        self.builder.finish_node();
    }

    fn error_at_end(&mut self, message: &str) {
        self.add_error(message, self.pos);
    }

    /// Wrap everything up to the next document boundary in an ERROR node.
    fn error_until_document_end(&mut self, message: &str) {
        use SyntaxKind::*;

        self.add_error(message, self.pos);
        self.builder.start_node(ERROR.into());
        while let Some(kind) = self.current() {
            if matches!(kind, DOC_START | DOC_END | DIRECTIVE) && self.at_line_start(self.pos) {
                break;
            }
            self.bump();
        }
        self.builder.finish_node();
    }

    fn add_error(&mut self, message: &str, idx: usize) {
        let start = self.offsets.get(idx).copied().unwrap_or(self.text.len());
        let len = self.tokens.get(idx).map_or(0, |(_, text)| text.len());
        let line = self.text[..start].matches('\n').count() + 1;
        let column = self.columns.get(idx).copied().unwrap_or(0) + 1;
        let message = format!("line {}, column {}: {}", line, column, message);

        self.errors.push(message.clone());
        self.positioned_errors.push(PositionedParseError {
            message,
            range: TextRange::at(TextSize::from(start as u32), TextSize::from(len as u32)),
            code: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lang;

    fn tree(text: &str) -> rowan::SyntaxNode<Lang> {
        let parsed = parse(text);
        assert!(parsed.errors.is_empty(), "errors: {:?}", parsed.errors);
        rowan::SyntaxNode::new_root(parsed.green_node)
    }

    fn outline(node: &rowan::SyntaxNode<Lang>) -> String {
        let kinds: Vec<String> = node
            .descendants()
            .filter(|n| {
                matches!(
                    n.kind(),
                    SyntaxKind::MAPPING | SyntaxKind::SEQUENCE | SyntaxKind::SCALAR
                )
            })
            .map(|n| format!("{:?}", n.kind()))
            .collect();
        kinds.join(" ")
    }

    #[test]
    fn test_lossless_round_trip() {
        let text = "# header\nname: app # trailing\n\nlist:\n- a\n- b: 1\n  c: 2\nflow: {x: [1, 2]}\n";
        assert_eq!(tree(text).to_string(), text);
    }

    #[test]
    fn test_nested_mapping_structure() {
        let root = tree("a:\n  b:\n    c: 1\n");
        assert_eq!(outline(&root), "MAPPING MAPPING MAPPING SCALAR");
    }

    #[test]
    fn test_sequence_at_key_column() {
        let root = tree("list:\n- x\n- y\nother: 1\n");
        assert_eq!(outline(&root), "MAPPING SEQUENCE SCALAR SCALAR SCALAR");
    }

    #[test]
    fn test_compact_mapping_in_sequence() {
        let root = tree("- name: a\n  value: 1\n- name: b\n");
        assert_eq!(outline(&root), "SEQUENCE MAPPING SCALAR SCALAR MAPPING SCALAR");
    }

    #[test]
    fn test_comment_between_entries_stays_in_mapping() {
        let root = tree("a:\n  b: 1\n  # note\n  c: 2\nd: 3\n");
        let inner = root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::MAPPING)
            .nth(1)
            .unwrap();
        assert_eq!(inner.to_string(), "b: 1\n  # note\n  c: 2");
    }

    #[test]
    fn test_trailing_comment_belongs_to_outer_level() {
        let root = tree("a:\n  b: 1\n# about d\nd: 3\n");
        let inner = root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::MAPPING)
            .nth(1)
            .unwrap();
        assert_eq!(inner.to_string(), "b: 1");
    }

    #[test]
    fn test_multiple_documents() {
        let root = tree("a: 1\n---\nb: 2\n");
        let docs = root
            .children()
            .filter(|n| n.kind() == SyntaxKind::DOCUMENT)
            .count();
        assert_eq!(docs, 2);
    }

    #[test]
    fn test_empty_input() {
        let root = tree("");
        assert_eq!(root.children().count(), 0);
    }

    #[test]
    fn test_bad_indentation_is_an_error() {
        let parsed = parse("a: 1\n   b: 2\n");
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].starts_with("line 2, column 4"));
    }

    #[test]
    fn test_compact_nested_mapping_is_an_error() {
        let parsed = parse("a: b: c\n");
        assert!(!parsed.errors.is_empty());
    }

    #[test]
    fn test_unterminated_flow_mapping() {
        let parsed = parse("a: {b: 1\n");
        assert!(!parsed.errors.is_empty());
    }

    #[test]
    fn test_errors_keep_text() {
        let text = "a: 1\n  - b\nc: 2\n";
        let parsed = parse(text);
        assert!(!parsed.errors.is_empty());
        let root: rowan::SyntaxNode<Lang> = rowan::SyntaxNode::new_root(parsed.green_node);
        assert_eq!(root.to_string(), text);
    }
}
