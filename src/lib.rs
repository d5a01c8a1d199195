//! confstack: layered configuration resolution
//!
//! Configuration documents (YAML or JSON) are located by identifier, parsed
//! into a uniform [`ConfigNode`] tree, deep-merged in a fixed precedence
//! order, overridden by flat properties and environment variables, and
//! finally bound to typed structs through serde.
//!
//! ```
//! use confstack::{ConfigNode, EmbeddedResources, Environment, ResourceLocator, SourceAggregator};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Server {
//!     port: u16,
//! }
//!
//! let locator = ResourceLocator::new(
//!     EmbeddedResources::new().with("defaults.yml", "server:\n  port: 8080\n"),
//! );
//! let factory = SourceAggregator::new(locator)
//!     .default_resource("classpath:defaults.yml")
//!     .environment(Environment::new().variable("BQ_SERVER_PORT", "9090"))
//!     .resolve()
//!     .unwrap();
//!
//! let server: Server = factory.config("server").unwrap();
//! assert_eq!(server.port, 9090);
//! assert!(matches!(factory.root(), ConfigNode::Object(_)));
//! ```

pub mod bind;
pub mod error;
pub mod format;
pub mod merge;
pub mod node;
pub mod path;
pub mod resource;
pub mod sources;

pub use bind::{ConfigurationFactory, PolymorphicRegistry};
pub use error::{ConfigError, Result};
pub use node::{ConfigMap, ConfigNode, NodeKind};
pub use path::PathExpr;
pub use resource::{EmbeddedResources, FolderResource, ResourceLocator};
pub use sources::{
    Conventions, DeclaredVariable, DetectedOption, Environment, OptionBinding, SourceAggregator,
};
