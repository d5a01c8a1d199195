//! Discriminant-based selection of concrete config types

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;

use super::de::NodeDeserializer;
use crate::error::{ConfigError, Result};
use crate::node::ConfigNode;

type Constructor<T> = Box<dyn Fn(&ConfigNode) -> Result<Box<T>> + Send + Sync>;

/// Maps discriminant values to constructors of implementations of `T`
/// (usually a trait object type).
///
/// Every variant is registered explicitly:
///
/// ```
/// use confstack::bind::PolymorphicRegistry;
/// use serde::Deserialize;
///
/// trait Store {}
/// #[derive(Deserialize)]
/// struct Memory {}
/// impl Store for Memory {}
///
/// let registry = PolymorphicRegistry::<dyn Store>::new("type")
///     .register("memory", |m: Memory| Box::new(m) as Box<dyn Store>);
/// assert!(registry.contains("memory"));
/// ```
pub struct PolymorphicRegistry<T: ?Sized> {
    discriminant: String,
    by_name: BTreeMap<String, Constructor<T>>,
    default: Option<Constructor<T>>,
}

impl<T: ?Sized + 'static> PolymorphicRegistry<T> {
    /// An empty registry reading the discriminant from `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self { discriminant: field.into(), by_name: BTreeMap::new(), default: None }
    }

    /// Register `C` under `name`; `wrap` boxes it as `T`.
    pub fn register<C, F>(mut self, name: impl Into<String>, wrap: F) -> Self
    where
        C: DeserializeOwned + 'static,
        F: Fn(C) -> Box<T> + Send + Sync + 'static,
    {
        self.by_name.insert(name.into(), constructor(wrap));
        self
    }

    /// Type used when the discriminant is missing or names nothing registered.
    pub fn with_default<C, F>(mut self, wrap: F) -> Self
    where
        C: DeserializeOwned + 'static,
        F: Fn(C) -> Box<T> + Send + Sync + 'static,
    {
        self.default = Some(constructor(wrap));
        self
    }

    pub fn discriminant(&self) -> &str {
        &self.discriminant
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Build the implementation selected by `node`'s discriminant field.
    pub fn create(&self, node: &ConfigNode) -> Result<Box<T>> {
        let tag = node
            .get(&self.discriminant)
            .filter(|v| !v.is_null())
            .and_then(ConfigNode::scalar_text);
        let selected =
            tag.as_deref().and_then(|name| self.by_name.get(name)).or(self.default.as_ref());
        match selected {
            Some(build) => build(node),
            None => Err(ConfigError::UnknownPolymorphicType {
                field: self.discriminant.clone(),
                value: tag,
            }),
        }
    }
}

fn constructor<T, C, F>(wrap: F) -> Constructor<T>
where
    T: ?Sized + 'static,
    C: DeserializeOwned + 'static,
    F: Fn(C) -> Box<T> + Send + Sync + 'static,
{
    Box::new(move |node: &ConfigNode| C::deserialize(NodeDeserializer::new(node)).map(&wrap))
}

impl<T: ?Sized> fmt::Debug for PolymorphicRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicRegistry")
            .field("discriminant", &self.discriminant)
            .field("types", &self.by_name.keys().collect::<Vec<_>>())
            .field("has_default", &self.default.is_some())
            .finish()
    }
}
