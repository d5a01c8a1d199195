//! Error types for configuration resolution.

use std::fmt::Display;
use thiserror::Error;

use crate::node::NodeKind;

/// Boxed cause carried by resource access failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while locating, parsing, merging or binding configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A `classpath:` resource has no embedded entry or search-root file.
    #[error("classpath resource not found: {id}")]
    ResourceNotFound { id: String },

    /// I/O, transport or parse failure for a resource.
    #[error("config resource is not found or is inaccessible: {id}: {source}")]
    ResourceAccess {
        id: String,
        #[source]
        source: BoxError,
    },

    /// Malformed path expression or resource identifier.
    #[error("invalid path '{path}': {reason}")]
    PathSyntax { path: String, reason: String },

    /// A path segment met a node of the wrong kind.
    #[error("invalid path '{path}': expected {expected} node, found {found}")]
    PathStructure { path: String, expected: NodeKind, found: NodeKind },

    /// An array write would skip more positions than the padding limit allows.
    #[error("invalid path '{path}': array index {index} out of bounds for length {len}")]
    IndexOutOfBounds { path: String, index: usize, len: usize },

    /// A prefixed environment variable does not map to a valid path.
    #[error("invalid environment variable '{name}': {source}")]
    Variable {
        name: String,
        #[source]
        source: Box<ConfigError>,
    },

    /// Discriminant has no registered type and no default type is configured.
    #[error("unknown polymorphic type {value:?} in field '{field}'")]
    UnknownPolymorphicType { field: String, value: Option<String> },

    /// Canonical and aliased variables carry different values.
    #[error("conflicting values for '{path}': {first} vs {second}")]
    AliasConflict { path: String, first: String, second: String },

    /// Typed projection of a sub-tree failed.
    #[error("error creating config at '{prefix}': {message}")]
    Bind { prefix: String, message: String },

    /// Raw deserializer failure, wrapped into `Bind` by the factory.
    #[error("{0}")]
    Deserialize(String),
}

impl ConfigError {
    pub fn path_syntax(path: &str, reason: impl Into<String>) -> Self {
        Self::PathSyntax { path: path.to_string(), reason: reason.into() }
    }

    pub fn access(id: &str, source: impl Into<BoxError>) -> Self {
        Self::ResourceAccess { id: id.to_string(), source: source.into() }
    }

    /// True when the failure means "the resource does not exist", as opposed to
    /// a resource that exists but could not be read or parsed.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ResourceNotFound { .. } => true,
            Self::ResourceAccess { source, .. } => {
                if let Some(io) = source.downcast_ref::<std::io::Error>() {
                    return io.kind() == std::io::ErrorKind::NotFound;
                }
                if let Some(ureq::Error::Status(code, _)) = source.downcast_ref::<ureq::Error>() {
                    return *code == 404;
                }
                matches!(source.downcast_ref::<zip::result::ZipError>(), Some(zip::result::ZipError::FileNotFound))
            }
            _ => false,
        }
    }
}

impl serde::de::Error for ConfigError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Deserialize(msg.to_string())
    }
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
