//! Walking keys and property paths through a mapping.

use crate::key::{Key, PathSegment};
use crate::mutation::{remove_item, remove_key, set_item, upsert, NewNode};
use crate::nodes::{Mapping, Node};
use crate::value::{adjust_value, AdjustedValue, ConfigValue};
use crate::scalar::ScalarValue;
use crate::{YamlError, YamlResult};
use rowan::ast::AstNode;
use tracing::{debug, trace};

/// The value a literal key receives: the raw text as a string.
fn literal_node(value: &ConfigValue) -> NewNode {
    leaf_node(AdjustedValue::Str(value.raw_value().to_string()), value.is_secure())
}

fn leaf_node(value: AdjustedValue, secure: bool) -> NewNode {
    let scalar = ScalarValue::from(value);
    if secure {
        NewNode::Secure(scalar)
    } else {
        NewNode::Scalar(scalar)
    }
}

fn classify(mapping: &Mapping) -> Node {
    match Node::cast(mapping.syntax().clone()) {
        Some(node) => node,
        None => unreachable!("a mapping always classifies as a node"),
    }
}

/// The child of `cursor` under `key`; `None` when absent or null, and for
/// the append slot one past the end of a sequence.
fn child(cursor: &Node, key: &PathSegment) -> YamlResult<Option<Node>> {
    match key {
        PathSegment::Key(name) => match cursor.as_mapping() {
            Some(mapping) => Ok(mapping.get(name)),
            None => unreachable!("key {:?} used on a non-map node", name),
        },
        PathSegment::Index(index) => match cursor {
            Node::Sequence(sequence) => {
                let len = sequence.len();
                if *index > len {
                    return Err(YamlError::IndexOutOfRange { index: *index, len });
                }
                Ok(sequence.get(*index))
            }
            _ => unreachable!("index {} used on a non-array node", index),
        },
    }
}

/// Write `value` into `cursor` under `key`, returning the node stored there.
fn set_child(cursor: &Node, key: &PathSegment, value: &NewNode, indent: usize) -> YamlResult<Node> {
    match key {
        PathSegment::Key(name) => match cursor.as_mapping() {
            Some(mapping) => Ok(upsert(&mapping, name, value, indent)),
            None => unreachable!("key {:?} used on a non-map node", name),
        },
        PathSegment::Index(index) => match cursor {
            Node::Sequence(sequence) => set_item(sequence, *index, value, indent),
            _ => unreachable!("index {} used on a non-array node", index),
        },
    }
}

/// Set `key` inside `container`.
///
/// In path mode intermediate maps and arrays are created as needed; an
/// existing scalar or secret on the way is replaced by the container the
/// next segment requires.
pub(crate) fn set(
    container: &Mapping,
    key: &Key,
    value: &ConfigValue,
    path: bool,
    indent: usize,
) -> YamlResult<()> {
    if !path {
        upsert(container, &key.to_string(), &literal_node(value), indent);
        return Ok(());
    }

    let (segments, config_key) = key.parse_path()?;
    let head = config_key.to_string();
    if segments.len() == 1 {
        upsert(container, &head, &literal_node(value), indent);
        return Ok(());
    }

    let mut cursor = classify(container);
    let mut cursor_key = PathSegment::Key(head);
    for segment in &segments[1..] {
        let found = child(&cursor, &cursor_key)?;
        let next = match found {
            Some(node) if !node.is_simple() => {
                let fits = matches!(
                    (segment, &node),
                    (PathSegment::Index(_), Node::Sequence(_))
                        | (PathSegment::Key(_), Node::Mapping(_))
                );
                if !fits {
                    let expected = match segment {
                        PathSegment::Index(_) => "expected array",
                        PathSegment::Key(_) => "expected map",
                    };
                    return Err(YamlError::TypeMismatch(expected.to_string()));
                }
                node
            }
            _ => {
                let created = match segment {
                    PathSegment::Index(_) => NewNode::Sequence,
                    PathSegment::Key(_) => NewNode::Mapping,
                };
                debug!(at = %cursor_key, kind = ?created, "creating container");
                set_child(&cursor, &cursor_key, &created, indent)?
            }
        };
        trace!(from = %cursor_key, to = %segment, "descending");
        cursor = next;
        cursor_key = segment.clone();
    }

    let leaf = leaf_node(adjust_value(value, path), value.is_secure());
    set_child(&cursor, &cursor_key, &leaf, indent)?;

    let now_secure = matches!(
        Node::cast(cursor.syntax().clone()),
        Some(Node::SecureWrapper(_))
    );
    if now_secure && !value.is_secure() {
        return Err(YamlError::SecureKeyReserved);
    }
    Ok(())
}

/// Follow `path` from `source` without creating anything.
///
/// Returns the last node reached together with its parent, or `None` if
/// any step is missing or has the wrong type.
pub(crate) fn node_for_path(source: Node, path: &[PathSegment]) -> Option<(Node, Node)> {
    let mut parent = None;
    let mut current = source;
    for segment in path {
        let next = match (segment, &current) {
            (PathSegment::Key(name), _) => current.as_mapping()?.get(name)?,
            (PathSegment::Index(index), Node::Sequence(sequence)) => sequence.get(*index)?,
            (PathSegment::Index(_), _) => return None,
        };
        parent = Some(current);
        current = next;
    }
    Some((parent?, current))
}

/// The key followed by the segments after the first, i.e. the full lookup
/// path starting inside `container`.
fn lookup_path(segments: &[PathSegment], config_key: &Key) -> Vec<PathSegment> {
    let mut lookup = vec![PathSegment::Key(config_key.to_string())];
    lookup.extend_from_slice(&segments[1..]);
    lookup
}

/// Remove `key` from `container`. Anything that does not exist is a no-op.
///
/// A map emptied by the removal is replaced in its parent by a fresh
/// empty map.
pub(crate) fn remove(container: &Mapping, key: &Key, path: bool, indent: usize) -> YamlResult<()> {
    if !path {
        if !remove_key(container, &key.to_string()) {
            trace!(key = %key, "nothing to remove");
        }
        return Ok(());
    }

    let (segments, config_key) = key.parse_path()?;
    if segments.len() == 1 {
        if !remove_key(container, &config_key.to_string()) {
            trace!(key = %key, "nothing to remove");
        }
        return Ok(());
    }

    let mut lookup = lookup_path(&segments, &config_key);
    let last = lookup.pop();
    let Some((parent, target)) = node_for_path(classify(container), &lookup) else {
        trace!(key = %key, "path does not exist, nothing to remove");
        return Ok(());
    };

    match (&last, &target) {
        (Some(PathSegment::Key(name)), _) => {
            if let Some(mapping) = target.as_mapping() {
                remove_key(&mapping, name);
            }
        }
        (Some(PathSegment::Index(index)), Node::Sequence(sequence)) => {
            remove_item(sequence, *index);
        }
        _ => {}
    }

    if let (Some(emptied), Some(parent), Some(PathSegment::Key(parent_key))) =
        (target.as_mapping(), parent.as_mapping(), lookup.last())
    {
        if emptied.is_empty() {
            debug!(key = %parent_key, "replacing emptied map");
            upsert(&parent, parent_key, &NewNode::Mapping, indent);
        }
    }
    Ok(())
}

/// Look `key` up inside `container`.
pub(crate) fn get(container: &Mapping, key: &Key, path: bool) -> YamlResult<Option<Node>> {
    if !path {
        return Ok(container.get(&key.to_string()));
    }
    let (segments, config_key) = key.parse_path()?;
    let lookup = lookup_path(&segments, &config_key);
    Ok(node_for_path(classify(container), &lookup).map(|(_, node)| node))
}
