//! Lexer for YAML configuration files.

/// Lexical analysis: the variants are different kinds of "tokens" and the
/// node kinds the parser builds out of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // Structural
    /// Root node of the syntax tree
    ROOT = 0,
    /// A YAML document
    DOCUMENT,
    /// A YAML sequence (block or flow)
    SEQUENCE,
    /// An item of a sequence, including its `-` marker in block style
    SEQUENCE_ENTRY,
    /// A YAML mapping (block or flow)
    MAPPING,
    /// A key-value pair in a mapping
    MAPPING_ENTRY,
    /// The key of a mapping entry
    KEY,
    /// The value slot of a mapping or sequence entry; empty for null values
    VALUE,
    /// A YAML scalar value
    SCALAR,
    /// Parse error marker
    ERROR,

    // Indicators
    /// Block sequence indicator '-'
    DASH,
    /// Mapping value indicator ':'
    COLON,
    /// Flow entry separator ','
    COMMA,
    /// Left bracket '['
    LEFT_BRACKET,
    /// Right bracket ']'
    RIGHT_BRACKET,
    /// Left brace '{'
    LEFT_BRACE,
    /// Right brace '}'
    RIGHT_BRACE,

    // Document markers
    /// Document start marker '---'
    DOC_START,
    /// Document end marker '...'
    DOC_END,
    /// A directive line like '%YAML 1.2'
    DIRECTIVE,

    // Content tokens
    /// Plain string scalar
    STRING,
    /// Integer literal
    INT,
    /// Float literal
    FLOAT,
    /// Boolean literal (true/false)
    BOOL,
    /// Null literal
    NULL,
    /// Single-quoted scalar, quotes included
    SINGLE_QUOTED,
    /// Double-quoted scalar, quotes included
    DOUBLE_QUOTED,
    /// Literal or folded block scalar, header and content lines included
    BLOCK_SCALAR,

    // Whitespace and formatting
    /// Spaces and tabs inside a line
    WHITESPACE,
    /// Newline characters
    NEWLINE,
    /// Leading whitespace that determines structure
    INDENT,
    /// Comments starting with '#'
    COMMENT,

    /// A character the lexer could not place
    ERROR_TOKEN,
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

impl SyntaxKind {
    /// Whether this kind is whitespace, a newline or a comment.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE | SyntaxKind::INDENT | SyntaxKind::COMMENT
        )
    }

    /// Whether this kind is a single-line scalar token usable as a key.
    pub fn is_inline_scalar(self) -> bool {
        matches!(
            self,
            SyntaxKind::STRING
                | SyntaxKind::INT
                | SyntaxKind::FLOAT
                | SyntaxKind::BOOL
                | SyntaxKind::NULL
                | SyntaxKind::SINGLE_QUOTED
                | SyntaxKind::DOUBLE_QUOTED
        )
    }
}

/// Tokenize YAML input.
///
/// Every byte of the input ends up in exactly one token, so concatenating
/// the token texts yields the input again.
pub fn lex(input: &str) -> Vec<(SyntaxKind, &str)> {
    Lexer {
        input,
        pos: 0,
        flow_depth: 0,
        line_indent: 0,
        tokens: Vec::new(),
    }
    .run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    flow_depth: usize,
    /// Indentation of the line being lexed; block scalar content must be deeper.
    line_indent: usize,
    tokens: Vec<(SyntaxKind, &'a str)>,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Vec<(SyntaxKind, &'a str)> {
        use SyntaxKind::*;

        while let Some(ch) = self.rest().chars().next() {
            let rest = self.rest();
            match ch {
                '\n' => {
                    self.line_indent = 0;
                    self.push(NEWLINE, 1);
                }
                '\r' => {
                    self.line_indent = 0;
                    let len = if rest.starts_with("\r\n") { 2 } else { 1 };
                    self.push(NEWLINE, len);
                }
                ' ' | '\t' => {
                    let len = rest
                        .find(|c: char| c != ' ' && c != '\t')
                        .unwrap_or(rest.len());
                    if self.at_line_start() {
                        self.line_indent = len;
                        self.push(INDENT, len);
                    } else {
                        self.push(WHITESPACE, len);
                    }
                }
                '#' if self.after_blank() => {
                    let len = line_len(rest);
                    self.push(COMMENT, len);
                }
                '%' if self.at_line_start() && self.flow_depth == 0 => {
                    let len = line_len(rest);
                    self.push(DIRECTIVE, len);
                }
                '-' if self.at_line_start() && is_marker(rest, "---") => self.push(DOC_START, 3),
                '.' if self.at_line_start() && is_marker(rest, "...") => self.push(DOC_END, 3),
                '-' if self.flow_depth == 0 && followed_by_blank(rest, 1) => self.push(DASH, 1),
                '[' => {
                    self.flow_depth += 1;
                    self.push(LEFT_BRACKET, 1);
                }
                '{' => {
                    self.flow_depth += 1;
                    self.push(LEFT_BRACE, 1);
                }
                ']' if self.flow_depth > 0 => {
                    self.flow_depth -= 1;
                    self.push(RIGHT_BRACKET, 1);
                }
                '}' if self.flow_depth > 0 => {
                    self.flow_depth -= 1;
                    self.push(RIGHT_BRACE, 1);
                }
                ',' if self.flow_depth > 0 => self.push(COMMA, 1),
                ':' if self.is_value_indicator(rest) => self.push(COLON, 1),
                '\'' => {
                    let (kind, len) = single_quoted_len(rest);
                    self.push(kind, len);
                }
                '"' => {
                    let (kind, len) = double_quoted_len(rest);
                    self.push(kind, len);
                }
                '|' | '>' if self.flow_depth == 0 => {
                    let len = self.block_scalar_len(rest);
                    self.push(BLOCK_SCALAR, len);
                }
                _ => {
                    let len = self.plain_len(rest);
                    if len == 0 {
                        self.push(ERROR_TOKEN, ch.len_utf8());
                    } else {
                        let text = &rest[..len];
                        self.push(classify_scalar(text), len);
                    }
                }
            }
        }

        self.tokens
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn push(&mut self, kind: SyntaxKind, len: usize) {
        let text = &self.input[self.pos..self.pos + len];
        self.tokens.push((kind, text));
        self.pos += len;
    }

    /// Nothing but a newline (or the start of input) precedes the cursor.
    fn at_line_start(&self) -> bool {
        self.tokens
            .last()
            .map_or(true, |(kind, _)| *kind == SyntaxKind::NEWLINE)
    }

    fn after_blank(&self) -> bool {
        self.tokens.last().map_or(true, |(kind, _)| {
            matches!(
                kind,
                SyntaxKind::NEWLINE | SyntaxKind::WHITESPACE | SyntaxKind::INDENT
            )
        })
    }

    fn is_value_indicator(&self, rest: &str) -> bool {
        match rest[1..].chars().next() {
            None => true,
            Some(next) if next.is_whitespace() => true,
            Some(next) if self.flow_depth > 0 && is_flow_indicator(next) => true,
            // JSON-style `"key":value` inside flow collections
            Some(_) => {
                self.flow_depth > 0
                    && self.tokens.last().map_or(false, |(kind, _)| {
                        matches!(kind, SyntaxKind::SINGLE_QUOTED | SyntaxKind::DOUBLE_QUOTED)
                    })
            }
        }
    }

    /// Length of a plain scalar starting at the cursor, trailing blanks excluded.
    fn plain_len(&self, rest: &str) -> usize {
        let in_flow = self.flow_depth > 0;
        let mut end = 0;
        for (idx, ch) in rest.char_indices() {
            match ch {
                '\n' | '\r' => break,
                ' ' | '\t' => {
                    if rest[idx..]
                        .trim_start_matches([' ', '\t'])
                        .starts_with('#')
                    {
                        break;
                    }
                    continue;
                }
                ':' => {
                    let ends = match rest[idx + 1..].chars().next() {
                        None => true,
                        Some(next) => next.is_whitespace() || (in_flow && is_flow_indicator(next)),
                    };
                    if ends {
                        break;
                    }
                }
                ch if in_flow && is_flow_indicator(ch) => break,
                _ => {}
            }
            end = idx + ch.len_utf8();
        }
        end
    }

    /// Length of a block scalar: the header line plus every following line
    /// that is blank or indented deeper than the line holding the header.
    /// Trailing blank lines are left to the surrounding structure.
    fn block_scalar_len(&self, rest: &str) -> usize {
        let mut end = line_len(rest);
        let mut cursor = end;
        loop {
            let Some(after_newline) = skip_newline(rest, cursor) else {
                break;
            };
            let line = &rest[after_newline..];
            let content_len = line_len(line);
            let content = &line[..content_len];
            let indent = content.len() - content.trim_start_matches([' ', '\t']).len();
            if content.trim().is_empty() {
                cursor = after_newline + content_len;
                continue;
            }
            if indent <= self.line_indent {
                break;
            }
            end = after_newline + content_len;
            cursor = end;
        }
        end
    }
}

/// Position just past the newline at `at`, if there is one.
fn skip_newline(text: &str, at: usize) -> Option<usize> {
    let rest = &text[at..];
    if rest.starts_with("\r\n") {
        Some(at + 2)
    } else if rest.starts_with('\n') || rest.starts_with('\r') {
        Some(at + 1)
    } else {
        None
    }
}

fn line_len(text: &str) -> usize {
    text.find(['\n', '\r']).unwrap_or(text.len())
}

fn followed_by_blank(text: &str, at: usize) -> bool {
    text[at..].chars().next().map_or(true, char::is_whitespace)
}

fn is_marker(text: &str, marker: &str) -> bool {
    text.starts_with(marker) && followed_by_blank(text, marker.len())
}

fn is_flow_indicator(ch: char) -> bool {
    matches!(ch, ',' | '[' | ']' | '{' | '}')
}

fn single_quoted_len(text: &str) -> (SyntaxKind, usize) {
    let mut chars = text.char_indices().skip(1).peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '\'' {
            if let Some((_, '\'')) = chars.peek() {
                chars.next();
                continue;
            }
            return (SyntaxKind::SINGLE_QUOTED, idx + 1);
        }
    }
    (SyntaxKind::ERROR_TOKEN, line_len(text).max(1))
}

fn double_quoted_len(text: &str) -> (SyntaxKind, usize) {
    let mut chars = text.char_indices().skip(1);
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '"' => return (SyntaxKind::DOUBLE_QUOTED, idx + 1),
            _ => {}
        }
    }
    (SyntaxKind::ERROR_TOKEN, line_len(text).max(1))
}

/// Classify a plain scalar token based on its content
pub(crate) fn classify_scalar(text: &str) -> SyntaxKind {
    use SyntaxKind::*;

    match text {
        "true" | "false" | "True" | "False" | "TRUE" | "FALSE" => return BOOL,
        "null" | "Null" | "NULL" | "~" => return NULL,
        _ => {}
    }

    if text.parse::<i64>().is_ok() {
        return INT;
    }

    // Words like "inf" or "nan" parse as f64 but read as strings in a config file.
    if text.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
        && text.parse::<f64>().is_ok()
    {
        return FLOAT;
    }

    STRING
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        lex(input).into_iter().map(|(kind, _)| kind).collect()
    }

    #[test]
    fn test_simple_mapping() {
        let tokens = lex("key: value");

        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0], (SyntaxKind::STRING, "key"));
        assert_eq!(tokens[1], (SyntaxKind::COLON, ":"));
        assert_eq!(tokens[2], (SyntaxKind::WHITESPACE, " "));
        assert_eq!(tokens[3], (SyntaxKind::STRING, "value"));
    }

    #[test]
    fn test_scalar_types() {
        assert_eq!(lex("age: 42")[3], (SyntaxKind::INT, "42"));
        assert_eq!(lex("pi: 3.14")[3], (SyntaxKind::FLOAT, "3.14"));
        assert_eq!(lex("enabled: true")[3], (SyntaxKind::BOOL, "true"));
        assert_eq!(lex("value: null")[3], (SyntaxKind::NULL, "null"));
        assert_eq!(lex("value: ~")[3], (SyntaxKind::NULL, "~"));
        assert_eq!(lex("value: nan")[3], (SyntaxKind::STRING, "nan"));
    }

    #[test]
    fn test_namespaced_key_is_one_token() {
        let tokens = lex("aws:region: us-west-2");
        assert_eq!(tokens[0], (SyntaxKind::STRING, "aws:region"));
        assert_eq!(tokens[1], (SyntaxKind::COLON, ":"));
        assert_eq!(tokens[3], (SyntaxKind::STRING, "us-west-2"));
    }

    #[test]
    fn test_plain_scalar_with_spaces_and_comment() {
        let tokens = lex("msg: hello world  # greeting");
        assert_eq!(tokens[3], (SyntaxKind::STRING, "hello world"));
        assert_eq!(tokens[4], (SyntaxKind::WHITESPACE, "  "));
        assert_eq!(tokens[5], (SyntaxKind::COMMENT, "# greeting"));
    }

    #[test]
    fn test_hash_inside_scalar_is_not_a_comment() {
        let tokens = lex("url: http://example.com/#anchor");
        assert_eq!(tokens[3], (SyntaxKind::STRING, "http://example.com/#anchor"));
    }

    #[test]
    fn test_sequences() {
        let tokens = lex("- item1\n- item2");

        assert_eq!(tokens[0], (SyntaxKind::DASH, "-"));
        assert_eq!(tokens[1], (SyntaxKind::WHITESPACE, " "));
        assert_eq!(tokens[2], (SyntaxKind::STRING, "item1"));
        assert_eq!(tokens[3], (SyntaxKind::NEWLINE, "\n"));
        assert_eq!(tokens[4], (SyntaxKind::DASH, "-"));
    }

    #[test]
    fn test_hyphen_in_scalars() {
        let tokens = lex("name: example-project\nneg: -5");
        assert_eq!(tokens[3], (SyntaxKind::STRING, "example-project"));
        assert_eq!(tokens[8], (SyntaxKind::INT, "-5"));
    }

    #[test]
    fn test_indent_and_whitespace() {
        use SyntaxKind::*;
        assert_eq!(
            kinds("a:\n  b: 1"),
            vec![STRING, COLON, NEWLINE, INDENT, STRING, COLON, WHITESPACE, INT]
        );
    }

    #[test]
    fn test_flow_collections() {
        use SyntaxKind::*;
        assert_eq!(
            kinds("{a: [1, x], b: c}"),
            vec![
                LEFT_BRACE,
                STRING,
                COLON,
                WHITESPACE,
                LEFT_BRACKET,
                INT,
                COMMA,
                WHITESPACE,
                STRING,
                RIGHT_BRACKET,
                COMMA,
                WHITESPACE,
                STRING,
                COLON,
                WHITESPACE,
                STRING,
                RIGHT_BRACE
            ]
        );
    }

    #[test]
    fn test_brackets_in_block_scalars_are_text() {
        let tokens = lex("key: a[0]");
        assert_eq!(tokens[3], (SyntaxKind::STRING, "a[0]"));
    }

    #[test]
    fn test_quoted_scalars() {
        let tokens = lex("a: 'it''s'\nb: \"say \\\"hi\\\"\"");
        assert_eq!(tokens[3], (SyntaxKind::SINGLE_QUOTED, "'it''s'"));
        assert_eq!(tokens[8], (SyntaxKind::DOUBLE_QUOTED, "\"say \\\"hi\\\"\""));
    }

    #[test]
    fn test_unterminated_quote() {
        let tokens = lex("a: 'oops\nb: 1");
        assert_eq!(tokens[3], (SyntaxKind::ERROR_TOKEN, "'oops"));
    }

    #[test]
    fn test_block_scalar() {
        let tokens = lex("text: |\n  line one\n\n  line two\nnext: 1\n");
        assert_eq!(
            tokens[3],
            (SyntaxKind::BLOCK_SCALAR, "|\n  line one\n\n  line two")
        );
        assert_eq!(tokens[4], (SyntaxKind::NEWLINE, "\n"));
        assert_eq!(tokens[5], (SyntaxKind::STRING, "next"));
    }

    #[test]
    fn test_document_markers_and_directives() {
        use SyntaxKind::*;
        assert_eq!(
            kinds("%YAML 1.2\n---\na: 1\n...\n"),
            vec![DIRECTIVE, NEWLINE, DOC_START, NEWLINE, STRING, COLON, WHITESPACE, INT, NEWLINE, DOC_END, NEWLINE]
        );
    }

    #[test]
    fn test_lossless() {
        let input = "# c\r\nkey:   value # x\n  - a\n{b: [c]}\n'q': \"r\"\n";
        let joined: String = lex(input).into_iter().map(|(_, text)| text).collect();
        assert_eq!(joined, input);
    }
}
