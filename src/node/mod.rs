//! In-memory configuration tree
//!
//! A [`ConfigNode`] is the uniform representation every parsed document is
//! converted to, whatever its source format. Objects keep insertion order so
//! that rendering a merged tree is deterministic.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;
use std::fmt;

mod convert;

/// Ordered field map of an object node.
pub type ConfigMap = IndexMap<String, ConfigNode>;

/// One node of a configuration document.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigNode {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<ConfigNode>),
    Object(ConfigMap),
}

/// Node kind, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Null => "NULL",
            NodeKind::Bool => "BOOLEAN",
            NodeKind::Number => "NUMBER",
            NodeKind::String => "STRING",
            NodeKind::Array => "ARRAY",
            NodeKind::Object => "OBJECT",
        };
        f.write_str(name)
    }
}

impl ConfigNode {
    /// An empty object, the starting point of every accumulator tree.
    pub fn object() -> Self {
        ConfigNode::Object(ConfigMap::new())
    }

    pub fn array() -> Self {
        ConfigNode::Array(Vec::new())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            ConfigNode::Null => NodeKind::Null,
            ConfigNode::Bool(_) => NodeKind::Bool,
            ConfigNode::Number(_) => NodeKind::Number,
            ConfigNode::String(_) => NodeKind::String,
            ConfigNode::Array(_) => NodeKind::Array,
            ConfigNode::Object(_) => NodeKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigNode::Null)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, ConfigNode::Array(_) | ConfigNode::Object(_))
    }

    pub fn as_object(&self) -> Option<&ConfigMap> {
        match self {
            ConfigNode::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ConfigNode]> {
        match self {
            ConfigNode::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigNode::String(s) => Some(s),
            _ => None,
        }
    }

    /// Field lookup on an object node; `None` for any other kind.
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Text form of a scalar (`"null"` for null); `None` for containers.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            ConfigNode::Null => Some("null".to_string()),
            ConfigNode::Bool(b) => Some(b.to_string()),
            ConfigNode::Number(n) => Some(n.to_string()),
            ConfigNode::String(s) => Some(s.clone()),
            ConfigNode::Array(_) | ConfigNode::Object(_) => None,
        }
    }
}

impl Serialize for ConfigNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigNode::Null => serializer.serialize_unit(),
            ConfigNode::Bool(b) => serializer.serialize_bool(*b),
            ConfigNode::Number(n) => n.serialize(serializer),
            ConfigNode::String(s) => serializer.serialize_str(s),
            ConfigNode::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ConfigNode::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}
