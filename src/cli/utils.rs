//! Shared CLI utilities.

use anyhow::{bail, Result};

use confstack::ConfigNode;

/// Split a `KEY=VALUE` argument at the first `=`. The key must be non-empty;
/// the value may be empty.
pub fn parse_kv(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => bail!("expected KEY=VALUE, got '{arg}'"),
    }
}

/// Plain text for scalars, YAML for containers.
pub fn render_value(node: &ConfigNode) -> Result<String> {
    match node.scalar_text() {
        Some(text) => Ok(text),
        None => Ok(serde_yaml::to_string(node)?.trim_end().to_string()),
    }
}
