//! Conversions into [`ConfigNode`] from scalars and parser values

use super::{ConfigMap, ConfigNode};
use serde_json::Number;

impl From<bool> for ConfigNode {
    fn from(value: bool) -> Self {
        ConfigNode::Bool(value)
    }
}

impl From<i64> for ConfigNode {
    fn from(value: i64) -> Self {
        ConfigNode::Number(value.into())
    }
}

impl From<u64> for ConfigNode {
    fn from(value: u64) -> Self {
        ConfigNode::Number(value.into())
    }
}

impl From<f64> for ConfigNode {
    /// Non-finite floats have no JSON number form and become null.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map(ConfigNode::Number).unwrap_or(ConfigNode::Null)
    }
}

impl From<&str> for ConfigNode {
    fn from(value: &str) -> Self {
        ConfigNode::String(value.to_string())
    }
}

impl From<String> for ConfigNode {
    fn from(value: String) -> Self {
        ConfigNode::String(value)
    }
}

impl From<Vec<ConfigNode>> for ConfigNode {
    fn from(value: Vec<ConfigNode>) -> Self {
        ConfigNode::Array(value)
    }
}

impl From<ConfigMap> for ConfigNode {
    fn from(value: ConfigMap) -> Self {
        ConfigNode::Object(value)
    }
}

impl From<serde_json::Value> for ConfigNode {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ConfigNode::Null,
            Value::Bool(b) => ConfigNode::Bool(b),
            Value::Number(n) => ConfigNode::Number(n),
            Value::String(s) => ConfigNode::String(s),
            Value::Array(items) => ConfigNode::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                ConfigNode::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<serde_yaml::Value> for ConfigNode {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;
        match value {
            Value::Null => ConfigNode::Null,
            Value::Bool(b) => ConfigNode::Bool(b),
            Value::Number(n) => yaml_number(&n),
            Value::String(s) => ConfigNode::String(s),
            Value::Sequence(items) => {
                ConfigNode::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Mapping(mapping) => ConfigNode::Object(
                mapping.into_iter().map(|(k, v)| (yaml_key(k), v.into())).collect(),
            ),
            Value::Tagged(tagged) => tagged.value.into(),
        }
    }
}

fn yaml_number(n: &serde_yaml::Number) -> ConfigNode {
    if let Some(u) = n.as_u64() {
        ConfigNode::from(u)
    } else if let Some(i) = n.as_i64() {
        ConfigNode::from(i)
    } else {
        // .nan / .inf keep their YAML spelling
        match n.as_f64().and_then(Number::from_f64) {
            Some(f) => ConfigNode::Number(f),
            None => ConfigNode::String(n.to_string()),
        }
    }
}

/// YAML allows non-string keys; the tree is keyed by their text form.
fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value;
    match key {
        Value::String(s) => s,
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Tagged(tagged) => yaml_key(tagged.value),
        other => serde_yaml::to_string(&other).map(|s| s.trim_end().to_string()).unwrap_or_default(),
    }
}
