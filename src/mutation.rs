//! In-place edits of mappings and sequences.
//!
//! New structure is built as small green trees, turned into mutable red
//! trees and spliced into the document. Collections keep their identity
//! across edits: a mapping converted from `{}` to block style is the same
//! node before and after, so handles taken during a path walk stay valid.

use crate::lex::SyntaxKind;
use crate::nodes::{
    column_of, is_flow_collection, Mapping, MappingEntry, Node, Sequence, SyntaxElement,
    SyntaxNode,
};
use crate::scalar::ScalarValue;
use crate::{YamlError, YamlResult};
use rowan::ast::AstNode;
use rowan::GreenNodeBuilder;
use std::ops::Range;
use tracing::debug;

/// A value to be written into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewNode {
    /// A scalar leaf.
    Scalar(ScalarValue),
    /// The reserved `{secure: <value>}` wrapper around a secret.
    Secure(ScalarValue),
    /// An empty mapping, rendered `{}` until it gains entries.
    Mapping,
    /// An empty sequence, rendered `[]` until it gains items.
    Sequence,
}

impl NewNode {
    /// A scalar leaf.
    pub fn scalar(value: impl Into<ScalarValue>) -> Self {
        NewNode::Scalar(value.into())
    }

    /// A secret wrapped as `{secure: <value>}`.
    pub fn secure(value: impl Into<ScalarValue>) -> Self {
        NewNode::Secure(value.into())
    }
}

/// Where a new value goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Inside a flow collection; everything stays on one line.
    Flow,
    /// The value of a block mapping entry whose key is at `key_column`.
    MappingValue { key_column: usize },
    /// The value of a block sequence entry.
    SequenceValue,
}

impl NewNode {
    /// Whether the value starts on a line of its own in this layout.
    fn is_block(&self, layout: Layout) -> bool {
        matches!(
            (self, layout),
            (NewNode::Secure(_), Layout::MappingValue { .. })
        )
    }
}

/// Turn a run of tokens into elements ready to be spliced into a tree.
fn tokens(items: &[(SyntaxKind, &str)]) -> Vec<SyntaxElement> {
    let mut builder = GreenNodeBuilder::new();
    builder.start_node(SyntaxKind::ROOT.into());
    for (kind, text) in items {
        builder.token((*kind).into(), text);
    }
    builder.finish_node();
    SyntaxNode::new_root_mut(builder.finish())
        .children_with_tokens()
        .collect()
}

/// The line break used by the document, so edits keep CRLF files CRLF.
fn line_break(node: &SyntaxNode) -> String {
    let root = node.ancestors().last().unwrap_or_else(|| node.clone());
    root.descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| token.kind() == SyntaxKind::NEWLINE)
        .map_or_else(|| "\n".to_string(), |token| token.text().to_string())
}

/// Replace the children of `node` in `range` with `elements`.
///
/// rowan's `splice_children` skips every other child when it deletes more
/// than one, so children are detached one at a time from the end.
fn splice(node: &SyntaxNode, range: Range<usize>, elements: Vec<SyntaxElement>) {
    for index in range.clone().rev() {
        node.splice_children(index..index + 1, Vec::new());
    }
    node.splice_children(range.start..range.start, elements);
}

fn inside_flow(node: &SyntaxNode) -> bool {
    node.ancestors().skip(1).any(|ancestor| is_flow_collection(&ancestor))
}

fn is_entry_kind(kind: SyntaxKind) -> bool {
    matches!(kind, SyntaxKind::MAPPING_ENTRY | SyntaxKind::SEQUENCE_ENTRY)
}

struct Builder<'a> {
    inner: GreenNodeBuilder<'static>,
    indent: usize,
    newline: &'a str,
}

impl<'a> Builder<'a> {
    fn new(indent: usize, newline: &'a str) -> Self {
        Self {
            inner: GreenNodeBuilder::new(),
            indent,
            newline,
        }
    }

    fn finish(self) -> SyntaxNode {
        SyntaxNode::new_root_mut(self.inner.finish())
    }

    fn token(&mut self, kind: SyntaxKind, text: &str) {
        self.inner.token(kind.into(), text);
    }

    fn scalar(&mut self, value: &ScalarValue) {
        self.inner.start_node(SyntaxKind::SCALAR.into());
        self.token(value.token_kind(), &value.to_yaml_string());
        self.inner.finish_node();
    }

    fn key(&mut self, key: &str) {
        let key = ScalarValue::new(key);
        self.inner.start_node(SyntaxKind::KEY.into());
        self.token(key.token_kind(), &key.to_yaml_string());
        self.inner.finish_node();
    }

    fn value(&mut self, value: &NewNode, layout: Layout) {
        use SyntaxKind::*;

        self.inner.start_node(VALUE.into());
        match value {
            NewNode::Scalar(scalar) => self.scalar(scalar),
            NewNode::Mapping => {
                self.inner.start_node(MAPPING.into());
                self.token(LEFT_BRACE, "{");
                self.token(RIGHT_BRACE, "}");
                self.inner.finish_node();
            }
            NewNode::Sequence => {
                self.inner.start_node(SEQUENCE.into());
                self.token(LEFT_BRACKET, "[");
                self.token(RIGHT_BRACKET, "]");
                self.inner.finish_node();
            }
            NewNode::Secure(scalar) => {
                if let Layout::MappingValue { key_column } = layout {
                    self.token(NEWLINE, self.newline);
                    self.token(INDENT, &" ".repeat(key_column + self.indent));
                }
                let flow = layout == Layout::Flow;
                self.inner.start_node(MAPPING.into());
                if flow {
                    self.token(LEFT_BRACE, "{");
                }
                self.inner.start_node(MAPPING_ENTRY.into());
                self.key("secure");
                self.token(COLON, ":");
                self.token(WHITESPACE, " ");
                self.inner.start_node(VALUE.into());
                self.scalar(scalar);
                self.inner.finish_node();
                self.inner.finish_node();
                if flow {
                    self.token(RIGHT_BRACE, "}");
                }
                self.inner.finish_node();
            }
        }
        self.inner.finish_node();
    }

    fn mapping_entry(&mut self, key: &str, value: &NewNode, layout: Layout) {
        self.inner.start_node(SyntaxKind::MAPPING_ENTRY.into());
        self.key(key);
        self.token(SyntaxKind::COLON, ":");
        if !value.is_block(layout) {
            self.token(SyntaxKind::WHITESPACE, " ");
        }
        self.value(value, layout);
        self.inner.finish_node();
    }

    fn sequence_entry(&mut self, value: &NewNode, flow: bool) {
        self.inner.start_node(SyntaxKind::SEQUENCE_ENTRY.into());
        let layout = if flow {
            Layout::Flow
        } else {
            self.token(SyntaxKind::DASH, "-");
            self.token(SyntaxKind::WHITESPACE, " ");
            Layout::SequenceValue
        };
        self.value(value, layout);
        self.inner.finish_node();
    }
}

fn build_value(value: &NewNode, layout: Layout, indent: usize, newline: &str) -> SyntaxNode {
    let mut builder = Builder::new(indent, newline);
    builder.value(value, layout);
    builder.finish()
}

/// The value node held by a VALUE node that was built from a [`NewNode`].
fn content_of(value: &SyntaxNode) -> Node {
    match value.children().find_map(Node::cast) {
        Some(node) => node,
        None => unreachable!("built values always hold a node"),
    }
}

fn value_slot_of(entry: &SyntaxNode) -> Option<SyntaxNode> {
    entry
        .children()
        .find(|child| child.kind() == SyntaxKind::VALUE)
}

fn content_of_entry(entry: &SyntaxNode) -> Node {
    match value_slot_of(entry) {
        Some(value) => content_of(&value),
        None => unreachable!("built entries always hold a value"),
    }
}

/// Put a freshly built VALUE node into `entry`, replacing the old one.
fn replace_value(entry: &SyntaxNode, value: SyntaxNode) {
    let index = match value_slot_of(entry) {
        Some(old) => {
            let index = old.index();
            splice(entry, index..index + 1, vec![value.into()]);
            index
        }
        None => {
            let index = entry.children_with_tokens().count();
            splice(entry, index..index, vec![value.into()]);
            index
        }
    };

    // A flow entry like `{a}` has no indicator yet.
    if entry.kind() == SyntaxKind::MAPPING_ENTRY
        && !entry
            .children_with_tokens()
            .any(|child| child.kind() == SyntaxKind::COLON)
    {
        splice(
            entry,
            index..index,
            tokens(&[(SyntaxKind::COLON, ":"), (SyntaxKind::WHITESPACE, " ")]),
        );
    }

    normalize_gap(entry);
}

/// Tidy the tokens between an entry's indicator and its value.
///
/// An inline value is separated by whitespace alone, with any comment moved
/// after it. A value on following lines keeps only the comment.
fn normalize_gap(entry: &SyntaxNode) {
    use SyntaxKind::*;

    if entry.parent().map_or(false, |parent| is_flow_collection(&parent)) {
        return;
    }
    let children: Vec<SyntaxElement> = entry.children_with_tokens().collect();
    let Some(indicator) = children
        .iter()
        .position(|child| matches!(child.kind(), COLON | DASH))
    else {
        return;
    };
    let Some(value_index) = children.iter().position(|child| child.kind() == VALUE) else {
        return;
    };
    if value_index <= indicator {
        return;
    }

    let gap = &children[indicator + 1..value_index];
    let comments: Vec<String> = gap
        .iter()
        .filter_map(|child| child.as_token())
        .filter(|token| token.kind() == COMMENT)
        .map(|token| token.text().to_string())
        .collect();
    let commented: Vec<(SyntaxKind, &str)> = comments
        .iter()
        .flat_map(|comment| [(WHITESPACE, " "), (COMMENT, comment.as_str())])
        .collect();

    let first = children[value_index]
        .as_node()
        .and_then(|value| value.first_token())
        .map(|token| token.kind());
    match first {
        None => {}
        Some(NEWLINE) => {
            splice(entry, indicator + 1..value_index, tokens(&commented));
        }
        Some(_) => {
            if comments.is_empty() && !gap.is_empty() {
                return;
            }
            splice(entry, indicator + 1..value_index, tokens(&[(WHITESPACE, " ")]));
            if !commented.is_empty() {
                let after_value = indicator + 3;
                splice(entry, after_value..after_value, tokens(&commented));
            }
        }
    }
}

/// Append an entry to a block collection whose entries sit at `column`.
fn block_append(container: &SyntaxNode, column: usize, entry: SyntaxNode, newline: &str) {
    let end = container.children_with_tokens().count();
    let mut elements = Vec::new();
    if end > 0 {
        let indent = " ".repeat(column);
        let mut separator = vec![(SyntaxKind::NEWLINE, newline)];
        if column > 0 {
            separator.push((SyntaxKind::INDENT, indent.as_str()));
        }
        elements.extend(tokens(&separator));
    }
    elements.push(entry.into());
    splice(container, end..end, elements);
}

/// Append an entry to a flow collection, after its last entry.
fn flow_append(container: &SyntaxNode, entry: SyntaxNode) {
    use SyntaxKind::*;

    let children: Vec<SyntaxElement> = container.children_with_tokens().collect();
    match children.iter().rposition(|child| is_entry_kind(child.kind())) {
        Some(last) => {
            let mut elements = tokens(&[(COMMA, ","), (WHITESPACE, " ")]);
            elements.push(entry.into());
            splice(container, last + 1..last + 1, elements);
        }
        None => {
            let open = children
                .iter()
                .position(|child| matches!(child.kind(), LEFT_BRACE | LEFT_BRACKET))
                .map_or(0, |index| index + 1);
            splice(container, open..open, vec![entry.into()]);
        }
    }
}

/// Turn an empty flow collection into an empty block collection in place.
///
/// Returns the column its entries go at. Under a mapping key, a mapping
/// moves to the next line one indent deeper than the key, and a sequence
/// puts its dashes at the key's column. Anywhere else the entries start
/// where the opening bracket was.
fn convert_to_block(container: &SyntaxNode, indent: usize) -> usize {
    let bracket_column = container
        .first_token()
        .map_or(0, |token| column_of(&token));
    let slot = container
        .parent()
        .filter(|parent| parent.kind() == SyntaxKind::VALUE);
    let entry = slot
        .as_ref()
        .and_then(|slot| slot.parent())
        .and_then(MappingEntry::cast);
    let on_key_line = slot
        .as_ref()
        .and_then(|slot| slot.first_token())
        .map_or(false, |token| token.kind() != SyntaxKind::NEWLINE);

    let column = match (slot, entry) {
        (Some(slot), Some(entry)) if on_key_line => {
            let key_column = entry.key_column();
            let column = if container.kind() == SyntaxKind::MAPPING {
                key_column + indent
            } else {
                key_column
            };
            let newline = line_break(container);
            let indentation = " ".repeat(column);
            let mut separator = vec![(SyntaxKind::NEWLINE, newline.as_str())];
            if column > 0 {
                separator.push((SyntaxKind::INDENT, indentation.as_str()));
            }
            splice(&slot, 0..0, tokens(&separator));
            normalize_gap(entry.syntax());
            column
        }
        _ => bracket_column,
    };

    let count = container.children_with_tokens().count();
    splice(container, 0..count, Vec::new());
    debug!(kind = ?container.kind(), column, "converted flow collection to block style");
    column
}

/// Render an emptied block collection as `{}` or `[]` on the line of its
/// key or dash.
fn collapse_to_flow(container: &SyntaxNode) {
    use SyntaxKind::*;

    let brackets = if container.kind() == MAPPING {
        [(LEFT_BRACE, "{"), (RIGHT_BRACE, "}")]
    } else {
        [(LEFT_BRACKET, "["), (RIGHT_BRACKET, "]")]
    };
    let count = container.children_with_tokens().count();
    splice(container, 0..count, tokens(&brackets));

    if let Some(slot) = container.parent().filter(|parent| parent.kind() == VALUE) {
        let index = container.index();
        splice(&slot, 0..index, Vec::new());
        if let Some(entry) = slot.parent() {
            normalize_gap(&entry);
        }
    }
    debug!(kind = ?container.kind(), "collapsed emptied collection");
}

/// Remove an entry node together with the separator that belongs to it.
fn remove_entry(container: &SyntaxNode, entry: &SyntaxNode) {
    let children: Vec<SyntaxElement> = container.children_with_tokens().collect();
    let index = entry.index();
    let previous = children[..index]
        .iter()
        .rposition(|child| is_entry_kind(child.kind()));
    let next = children[index + 1..]
        .iter()
        .position(|child| is_entry_kind(child.kind()))
        .map(|offset| index + 1 + offset);

    let range = match (previous, next) {
        (Some(previous), _) => previous + 1..index + 1,
        (None, Some(next)) => index..next,
        (None, None) => index..index + 1,
    };
    splice(container, range, Vec::new());

    let flow = is_flow_collection(container);
    let has_entries = container
        .children()
        .any(|child| is_entry_kind(child.kind()));
    if !flow && !has_entries {
        collapse_to_flow(container);
    }
}

/// Store `value` under `key`, overwriting an existing entry in place or
/// appending a new one. Returns the node now stored under the key.
///
/// A secure wrapper has its single entry replaced, so writing into one
/// turns it into an ordinary mapping.
pub fn upsert(mapping: &Mapping, key: &str, value: &NewNode, indent: usize) -> Node {
    if mapping.is_secure() {
        if let Some(entry) = mapping.entries().next() {
            rename_key(&entry, key);
            return set_entry_value(&entry, value, indent);
        }
    }
    if let Some(entry) = mapping.find_entry(key) {
        return set_entry_value(&entry, value, indent);
    }
    append_entry(mapping, key, value, indent)
}

fn rename_key(entry: &MappingEntry, key: &str) {
    if entry.key().as_deref() == Some(key) {
        return;
    }
    let Some(key_node) = entry
        .syntax()
        .children()
        .find(|child| child.kind() == SyntaxKind::KEY)
    else {
        return;
    };
    let key = ScalarValue::new(key);
    let text = key.to_yaml_string();
    let count = key_node.children_with_tokens().count();
    splice(&key_node, 0..count, tokens(&[(key.token_kind(), text.as_str())]));
}

fn set_entry_value(entry: &MappingEntry, value: &NewNode, indent: usize) -> Node {
    let syntax = entry.syntax();
    let layout = if inside_flow(syntax) {
        Layout::Flow
    } else {
        Layout::MappingValue {
            key_column: entry.key_column(),
        }
    };
    let new_value = build_value(value, layout, indent, &line_break(syntax));
    replace_value(syntax, new_value.clone());
    content_of(&new_value)
}

fn append_entry(mapping: &Mapping, key: &str, value: &NewNode, indent: usize) -> Node {
    let syntax = mapping.syntax();
    let newline = line_break(syntax);

    let column = if mapping.is_flow() {
        if !mapping.is_empty() || inside_flow(syntax) {
            let mut builder = Builder::new(indent, &newline);
            builder.mapping_entry(key, value, Layout::Flow);
            let entry = builder.finish();
            flow_append(syntax, entry.clone());
            return content_of_entry(&entry);
        }
        convert_to_block(syntax, indent)
    } else {
        mapping.column()
    };

    let mut builder = Builder::new(indent, &newline);
    builder.mapping_entry(key, value, Layout::MappingValue { key_column: column });
    let entry = builder.finish();
    block_append(syntax, column, entry.clone(), &newline);
    content_of_entry(&entry)
}

/// Remove the entry for `key`. Returns whether there was one.
///
/// A block mapping that loses its last entry is rendered as `{}`.
pub fn remove_key(mapping: &Mapping, key: &str) -> bool {
    match mapping.find_entry(key) {
        Some(entry) => {
            remove_entry(mapping.syntax(), entry.syntax());
            true
        }
        None => false,
    }
}

/// Overwrite the item at `index`, or append when `index` equals the length.
pub fn set_item(
    sequence: &Sequence,
    index: usize,
    value: &NewNode,
    indent: usize,
) -> YamlResult<Node> {
    let len = sequence.len();
    if index == len {
        return Ok(push(sequence, value, indent));
    }
    let entry = sequence
        .entry(index)
        .ok_or(YamlError::IndexOutOfRange { index, len })?;

    let layout = if sequence.is_flow() {
        Layout::Flow
    } else {
        Layout::SequenceValue
    };
    let new_value = build_value(value, layout, indent, &line_break(sequence.syntax()));
    replace_value(entry.syntax(), new_value.clone());
    Ok(content_of(&new_value))
}

/// Append an item.
pub fn push(sequence: &Sequence, value: &NewNode, indent: usize) -> Node {
    let syntax = sequence.syntax();
    let newline = line_break(syntax);

    let column = if sequence.is_flow() {
        if !sequence.is_empty() || inside_flow(syntax) {
            let mut builder = Builder::new(indent, &newline);
            builder.sequence_entry(value, true);
            let entry = builder.finish();
            flow_append(syntax, entry.clone());
            return content_of_entry(&entry);
        }
        convert_to_block(syntax, indent)
    } else {
        sequence.column()
    };

    let mut builder = Builder::new(indent, &newline);
    builder.sequence_entry(value, false);
    let entry = builder.finish();
    block_append(syntax, column, entry.clone(), &newline);
    content_of_entry(&entry)
}

/// Remove the item at `index`. Returns whether it existed.
///
/// A block sequence that loses its last item is rendered as `[]`.
pub fn remove_item(sequence: &Sequence, index: usize) -> bool {
    match sequence.entry(index) {
        Some(entry) => {
            remove_entry(sequence.syntax(), entry.syntax());
            true
        }
        None => false,
    }
}
