//! Read and write navigation of path expressions

use super::{Index, KeyMatch, PathExpr, Segment};
use crate::error::{ConfigError, Result};
use crate::node::{ConfigMap, ConfigNode, NodeKind};

/// Resolve `path` against `root` in read mode.
///
/// Missing fields, field segments on non-objects and indexes past the end of
/// an array all resolve to `Ok(None)`. An index segment applied to a present,
/// non-null scalar or object is a structural error.
pub fn resolve<'a>(root: &'a ConfigNode, path: &PathExpr) -> Result<Option<&'a ConfigNode>> {
    resolve_with(root, path, KeyMatch::Exact)
}

/// Like [`resolve`], but a field that has no exact match falls back to a
/// case-insensitive match.
pub fn resolve_ignore_case<'a>(
    root: &'a ConfigNode,
    path: &PathExpr,
) -> Result<Option<&'a ConfigNode>> {
    resolve_with(root, path, KeyMatch::IgnoreCase)
}

fn resolve_with<'a>(
    root: &'a ConfigNode,
    path: &PathExpr,
    keys: KeyMatch,
) -> Result<Option<&'a ConfigNode>> {
    let mut current = root;
    for segment in path.segments() {
        let next = match (segment, current) {
            (Segment::Field(name), ConfigNode::Object(map)) => map.get(&field_key(map, name, keys)),
            (Segment::Field(_), _) => None,
            (Segment::Index(index), ConfigNode::Array(items)) => {
                items.get(index.position(items.len()))
            }
            (Segment::Index(_), ConfigNode::Null) => None,
            (Segment::Index(_), other) => {
                return Err(structure_error(path, NodeKind::Array, other.kind()))
            }
        };

        match next {
            Some(node) => current = node,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Key to use for `name` in `map`: an exact match, else (when allowed) the
/// first key equal to it ignoring ASCII case, else `name` itself.
fn field_key(map: &ConfigMap, name: &str, keys: KeyMatch) -> String {
    if keys == KeyMatch::IgnoreCase && !map.contains_key(name) {
        if let Some(key) = map.keys().find(|key| key.eq_ignore_ascii_case(name)) {
            return key.clone();
        }
    }
    name.to_string()
}

/// Walk to the parent of the last segment of `path` in write mode, creating
/// every missing intermediate container, and return it with that segment.
///
/// The kind of a created container follows the segment that addresses into
/// it: an index creates an array, a field creates an object.
pub fn resolve_parent_mut<'a, 'p>(
    root: &'a mut ConfigNode,
    path: &'p PathExpr,
) -> Result<(&'a mut ConfigNode, &'p Segment)> {
    parent_mut(root, path, KeyMatch::Exact)
}

fn parent_mut<'a, 'p>(
    root: &'a mut ConfigNode,
    path: &'p PathExpr,
    keys: KeyMatch,
) -> Result<(&'a mut ConfigNode, &'p Segment)> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Err(ConfigError::path_syntax(path.as_str(), "no parent node for the root path"));
    };

    let mut current = root;
    for (i, segment) in parents.iter().enumerate() {
        let next = parents.get(i + 1).unwrap_or(last);
        current = child_mut(current, segment, next, path, keys)?;
    }
    Ok((current, last))
}

/// Most null placeholders a single write may insert ahead of an indexed
/// element.
pub const MAX_INDEX_GAP: usize = 1024;

/// Set `value` at `path`, creating missing parents. An index past the end of
/// an array appends, padding up to [`MAX_INDEX_GAP`] skipped positions with
/// nulls.
pub fn write(root: &mut ConfigNode, path: &PathExpr, value: ConfigNode) -> Result<()> {
    write_with(root, path, value, KeyMatch::Exact)
}

/// Like [`write`], but fields reuse an existing key that differs only in
/// ASCII case.
pub fn write_ignore_case(root: &mut ConfigNode, path: &PathExpr, value: ConfigNode) -> Result<()> {
    write_with(root, path, value, KeyMatch::IgnoreCase)
}

fn write_with(root: &mut ConfigNode, path: &PathExpr, value: ConfigNode, keys: KeyMatch) -> Result<()> {
    let (parent, last) = parent_mut(root, path, keys)?;
    match last {
        Segment::Field(name) => {
            let map = object_mut(parent, path)?;
            let key = field_key(map, name, keys);
            map.insert(key, value);
        }
        Segment::Index(index) => {
            *slot_mut(array_mut(parent, path)?, *index, path)? = value;
        }
    }
    Ok(())
}

fn child_mut<'a>(
    node: &'a mut ConfigNode,
    segment: &Segment,
    next: &Segment,
    path: &PathExpr,
    keys: KeyMatch,
) -> Result<&'a mut ConfigNode> {
    let child = match segment {
        Segment::Field(name) => {
            let map = object_mut(node, path)?;
            let key = field_key(map, name, keys);
            map.entry(key).or_default()
        }
        Segment::Index(index) => slot_mut(array_mut(node, path)?, *index, path)?,
    };

    if child.is_null() {
        *child = match next {
            Segment::Field(_) => ConfigNode::object(),
            Segment::Index(_) => ConfigNode::array(),
        };
    }
    Ok(child)
}

/// Element at `index`, growing the array with null placeholders when the
/// index is past the end.
fn slot_mut<'a>(
    items: &'a mut Vec<ConfigNode>,
    index: Index,
    path: &PathExpr,
) -> Result<&'a mut ConfigNode> {
    let len = items.len();
    let pos = index.position(len);
    if pos >= len {
        let grown = pos
            .checked_add(1)
            .filter(|_| pos - len <= MAX_INDEX_GAP)
            .ok_or_else(|| ConfigError::IndexOutOfBounds {
                path: path.as_str().to_string(),
                index: pos,
                len,
            })?;
        items.resize(grown, ConfigNode::Null);
    }
    Ok(&mut items[pos])
}

/// Scalars (null included) give way to an empty object; arrays do not.
fn object_mut<'a>(node: &'a mut ConfigNode, path: &PathExpr) -> Result<&'a mut ConfigMap> {
    if node.is_scalar() {
        *node = ConfigNode::object();
    }
    match node {
        ConfigNode::Object(map) => Ok(map),
        other => Err(structure_error(path, NodeKind::Object, other.kind())),
    }
}

fn array_mut<'a>(node: &'a mut ConfigNode, path: &PathExpr) -> Result<&'a mut Vec<ConfigNode>> {
    if node.is_null() {
        *node = ConfigNode::array();
    }
    match node {
        ConfigNode::Array(items) => Ok(items),
        other => Err(structure_error(path, NodeKind::Array, other.kind())),
    }
}

fn structure_error(path: &PathExpr, expected: NodeKind, found: NodeKind) -> ConfigError {
    ConfigError::PathStructure { path: path.as_str().to_string(), expected, found }
}
