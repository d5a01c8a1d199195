//! Document format detection and parsing

use serde::Deserialize;
use std::fmt;

use crate::error::BoxError;
use crate::node::ConfigNode;

/// Supported document formats. YAML is a superset of JSON, so it is also the
/// fallback when nothing else is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    Json,
    #[default]
    Yaml,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Yaml => f.write_str("yaml"),
        }
    }
}

impl Format {
    /// Format named by a MIME type, ignoring parameters such as `charset`.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match mime.as_str() {
            "application/json" => Some(Format::Json),
            "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml" => {
                Some(Format::Yaml)
            }
            m if m.ends_with("+json") => Some(Format::Json),
            m if m.ends_with("+yaml") => Some(Format::Yaml),
            _ => None,
        }
    }

    /// Format implied by the file extension of a path or URL. Query strings
    /// and fragments are ignored.
    pub fn from_location(location: &str) -> Option<Self> {
        let end = location.find(['?', '#']).unwrap_or(location.len());
        let path = &location[..end];
        let name = path.rsplit(['/', '\\', '!']).next().unwrap_or(path);
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yml" | "yaml" => Some(Format::Yaml),
            _ => None,
        }
    }

    /// Content type first, then extension, then YAML.
    pub fn detect(content_type: Option<&str>, location: &str) -> Self {
        content_type
            .and_then(Format::from_content_type)
            .or_else(|| Format::from_location(location))
            .unwrap_or_default()
    }
}

/// Parse a document into a tree.
///
/// YAML merge keys (`<<`) are expanded. An empty YAML document parses to
/// [`ConfigNode::Null`]. Of a multi-document YAML stream only the first
/// document is read.
pub fn parse(bytes: &[u8], format: Format) -> Result<ConfigNode, BoxError> {
    match format {
        Format::Json => {
            let value: serde_json::Value = serde_json::from_slice(bytes)?;
            Ok(value.into())
        }
        Format::Yaml => {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(ConfigNode::Null);
            }
            let Some(document) = serde_yaml::Deserializer::from_slice(bytes).next() else {
                return Ok(ConfigNode::Null);
            };
            let mut value = serde_yaml::Value::deserialize(document)?;
            value.apply_merge()?;
            Ok(value.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(Format::from_content_type("application/json"), Some(Format::Json));
        assert_eq!(Format::from_content_type("Application/JSON; charset=utf-8"), Some(Format::Json));
        assert_eq!(Format::from_content_type("application/vnd.api+json"), Some(Format::Json));
        assert_eq!(Format::from_content_type("application/x-yaml"), Some(Format::Yaml));
        assert_eq!(Format::from_content_type("text/yaml"), Some(Format::Yaml));
        assert_eq!(Format::from_content_type("text/plain"), None);
    }

    #[test]
    fn test_extension_detection_ignores_query() {
        assert_eq!(Format::from_location("http://example.org/c.yml?x=1"), Some(Format::Yaml));
        assert_eq!(Format::from_location("conf/app.YAML"), Some(Format::Yaml));
        assert_eq!(Format::from_location("conf/app.json#frag"), Some(Format::Json));
        assert_eq!(Format::from_location("jar:file:/a.jar!/x.json"), Some(Format::Json));
        assert_eq!(Format::from_location("http://example.org/config"), None);
        assert_eq!(Format::from_location("http://example.org.json/config"), None);
    }

    #[test]
    fn test_detect_precedence() {
        assert_eq!(Format::detect(None, "http://example.org/c.yml?x=1"), Format::Yaml);
        assert_eq!(
            Format::detect(Some("application/json"), "http://example.org/c.json"),
            Format::Json
        );
        assert_eq!(Format::detect(Some("application/json"), "c.yml"), Format::Json);
        assert_eq!(Format::detect(Some("text/plain"), "c.json"), Format::Json);
        assert_eq!(Format::detect(None, "http://example.org/config"), Format::Yaml);
    }

    #[test]
    fn test_parse_json_and_yaml() {
        let json_doc = parse(br#"{"a": {"b": [1, 2]}}"#, Format::Json).expect("json");
        assert_eq!(json_doc, ConfigNode::from(json!({"a": {"b": [1, 2]}})));

        let yaml_doc = parse(b"a:\n  b: [1, 2]\n", Format::Yaml).expect("yaml");
        assert_eq!(yaml_doc, json_doc);
    }

    #[test]
    fn test_yaml_parses_json_documents() {
        let node = parse(br#"{"a": "b"}"#, Format::Yaml).expect("yaml accepts json");
        assert_eq!(node, ConfigNode::from(json!({"a": "b"})));
    }

    #[test]
    fn test_yaml_merge_keys_applied() {
        let doc = b"base: &base\n  x: 1\n  y: 2\nderived:\n  <<: *base\n  y: 3\n";
        let node = parse(doc, Format::Yaml).expect("yaml");
        assert_eq!(node.get("derived"), Some(&ConfigNode::from(json!({"y": 3, "x": 1}))));
    }

    #[test]
    fn test_empty_yaml_is_null() {
        assert_eq!(parse(b"", Format::Yaml).expect("empty"), ConfigNode::Null);
        assert_eq!(parse(b"  \n", Format::Yaml).expect("blank"), ConfigNode::Null);
    }

    #[test]
    fn test_yaml_stream_reads_first_document() {
        let doc = b"---\na: 1\nb: [x]\n---\na: 2\n";
        let node = parse(doc, Format::Yaml).expect("first document");
        assert_eq!(node, ConfigNode::from(json!({"a": 1, "b": ["x"]})));
    }

    #[test]
    fn test_malformed_documents_fail() {
        assert!(parse(b"{\"a\": ", Format::Json).is_err());
        assert!(parse(b"a: [1, 2", Format::Yaml).is_err());
    }
}
