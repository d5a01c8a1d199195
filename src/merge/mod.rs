//! Deep merge of configuration trees and flat property overrides
//!
//! Both operations mutate the accumulator in place. Objects merge key by key;
//! everything else (arrays included) is replaced wholesale by the later value,
//! so the later source's node kind always wins.

use tracing::trace;

use crate::error::Result;
use crate::node::ConfigNode;
use crate::path::{self, KeyMatch, PathExpr};

/// One flattened `path = value` pair from a property map, environment
/// variable or command-line option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyOverride {
    pub path: String,
    pub value: String,
}

impl PropertyOverride {
    pub fn new(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self { path: path.into(), value: value.into() }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for PropertyOverride {
    fn from((path, value): (K, V)) -> Self {
        Self::new(path, value)
    }
}

/// Merge `src` into `dst`, with `src` winning on every path both define.
pub fn merge_tree(dst: &mut ConfigNode, src: ConfigNode) {
    match (dst, src) {
        (ConfigNode::Object(dst_map), ConfigNode::Object(src_map)) => {
            for (key, src_child) in src_map {
                match dst_map.get_mut(&key) {
                    Some(dst_child) => merge_tree(dst_child, src_child),
                    None => {
                        dst_map.insert(key, src_child);
                    }
                }
            }
        }
        (dst, src) => *dst = src,
    }
}

/// Apply flat overrides to `dst`, in ascending path order.
///
/// Sorting makes the result independent of the caller's iteration order and
/// creates shorter prefixes (`a[0]`) before the paths that extend them
/// (`a[1]`, `a[1].b`). Values are stored as strings; typed binding converts
/// them.
pub fn apply_overrides<I>(dst: &mut ConfigNode, overrides: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: Into<PropertyOverride>,
{
    apply_overrides_with(dst, overrides, KeyMatch::Exact)
}

/// [`apply_overrides`] with a choice of key matching. Variable-derived paths
/// are lowercase and use [`KeyMatch::IgnoreCase`] to land on existing
/// mixed-case keys.
pub fn apply_overrides_with<I>(dst: &mut ConfigNode, overrides: I, keys: KeyMatch) -> Result<()>
where
    I: IntoIterator,
    I::Item: Into<PropertyOverride>,
{
    let mut sorted: Vec<PropertyOverride> = overrides.into_iter().map(Into::into).collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));

    for item in sorted {
        let target = PathExpr::parse(&item.path)?;
        trace!(path = %item.path, "applying override");
        let value = ConfigNode::String(item.value);
        match keys {
            KeyMatch::Exact => path::write(dst, &target, value)?,
            KeyMatch::IgnoreCase => path::write_ignore_case(dst, &target, value)?,
        }
    }
    Ok(())
}
