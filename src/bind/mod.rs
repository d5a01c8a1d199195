//! Typed access to a resolved configuration tree

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::{ConfigError, Result};
use crate::node::ConfigNode;
use crate::path::{self, PathExpr};

mod de;
mod polymorphic;
mod value;

pub use de::NodeDeserializer;
pub use polymorphic::PolymorphicRegistry;
pub use value::{Bytes, BytesUnit, Duration, Percent, ValueError};

/// Read-only handle over the merged tree, cheap to clone and share across
/// threads.
#[derive(Debug, Clone)]
pub struct ConfigurationFactory {
    root: Arc<ConfigNode>,
}

impl ConfigurationFactory {
    pub fn new(root: ConfigNode) -> Self {
        Self { root: Arc::new(root) }
    }

    pub fn root(&self) -> &ConfigNode {
        &self.root
    }

    /// Node at `path`, matched exactly.
    pub fn get(&self, path: &str) -> Result<Option<&ConfigNode>> {
        path::resolve(&self.root, &PathExpr::parse(path)?)
    }

    /// Bind the sub-tree at `prefix` to `T`.
    ///
    /// The prefix is matched ignoring case when there is no exact key. A
    /// missing or null sub-tree binds as an empty object, so `T` gets its
    /// defaults. Generic targets such as `Vec<Item>` are named directly.
    pub fn config<T: DeserializeOwned>(&self, prefix: &str) -> Result<T> {
        let empty;
        let node = match self.find_child(prefix)? {
            Some(node) => node,
            None => {
                empty = ConfigNode::object();
                &empty
            }
        };
        trace!(prefix, kind = %node.kind(), "binding config");
        T::deserialize(NodeDeserializer::new(node)).map_err(|e| bind_error(prefix, e))
    }

    /// Bind the sub-tree at `prefix` to the implementation its discriminant
    /// field selects in `registry`.
    pub fn polymorphic_config<T: ?Sized + 'static>(
        &self,
        prefix: &str,
        registry: &PolymorphicRegistry<T>,
    ) -> Result<Box<T>> {
        let empty;
        let node = match self.find_child(prefix)? {
            Some(node) => node,
            None => {
                empty = ConfigNode::object();
                &empty
            }
        };
        registry.create(node).map_err(|e| bind_error(prefix, e))
    }

    fn find_child(&self, prefix: &str) -> Result<Option<&ConfigNode>> {
        let path = PathExpr::parse(prefix)?;
        Ok(path::resolve_ignore_case(&self.root, &path)?.filter(|node| !node.is_null()))
    }
}

/// Deserializer failures gain the prefix; other errors already carry context.
fn bind_error(prefix: &str, err: ConfigError) -> ConfigError {
    match err {
        ConfigError::Deserialize(message) => {
            ConfigError::Bind { prefix: prefix.to_string(), message }
        }
        other => other,
    }
}
