//! Assembly of one configuration tree from every source
//!
//! Sources are applied in a fixed order, later ones winning:
//!
//! 1. default resources, in registration order
//! 2. explicit config locations, in the order given
//! 3. resources and paths injected by detected command-line options
//! 4. framework properties (`bq.*`)
//! 5. variables: prefixed (`BQ_*`) then declared
//!
//! Resources are parsed and deep-merged; flat sources are applied as
//! overrides.

use tracing::{debug, info, warn};

use crate::bind::ConfigurationFactory;
use crate::error::Result;
use crate::merge::{apply_overrides, apply_overrides_with, merge_tree};
use crate::node::ConfigNode;
use crate::path::{self, KeyMatch, PathExpr};
use crate::resource::ResourceLocator;

mod env;
mod options;

pub use env::{Conventions, DeclaredVariable, Environment};
pub use options::{DetectedOption, OptionBinding};

/// A resource contributed ahead of any user-supplied configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultResource {
    pub id: String,
    /// A missing optional resource contributes nothing instead of failing.
    pub optional: bool,
}

/// Builder that owns the accumulator tree while sources are combined.
#[derive(Debug, Default)]
pub struct SourceAggregator {
    locator: ResourceLocator,
    defaults: Vec<DefaultResource>,
    configs: Vec<String>,
    option_bindings: Vec<OptionBinding>,
    detected_options: Vec<DetectedOption>,
    environment: Environment,
    declared: Vec<DeclaredVariable>,
    conventions: Conventions,
}

impl SourceAggregator {
    pub fn new(locator: ResourceLocator) -> Self {
        Self { locator, ..Self::default() }
    }

    pub fn default_resource(mut self, id: impl Into<String>) -> Self {
        self.defaults.push(DefaultResource { id: id.into(), optional: false });
        self
    }

    pub fn optional_default_resource(mut self, id: impl Into<String>) -> Self {
        self.defaults.push(DefaultResource { id: id.into(), optional: true });
        self
    }

    /// Append one explicit config location (a `--config` value).
    pub fn config(mut self, id: impl Into<String>) -> Self {
        self.configs.push(id.into());
        self
    }

    pub fn configs<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.configs.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn option_binding(mut self, binding: OptionBinding) -> Self {
        self.option_bindings.push(binding);
        self
    }

    /// Options present on the command line, in command-line order.
    pub fn detected_options(mut self, options: impl IntoIterator<Item = DetectedOption>) -> Self {
        self.detected_options.extend(options);
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn declare_variable(mut self, variable: DeclaredVariable) -> Self {
        self.declared.push(variable);
        self
    }

    pub fn conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }

    pub fn declared_variables(&self) -> &[DeclaredVariable] {
        &self.declared
    }

    pub fn current_conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// Build the merged tree.
    pub fn resolve_tree(&self) -> Result<ConfigNode> {
        let mut root = ConfigNode::object();
        let mut merged = 0usize;

        for default in &self.defaults {
            let contributed = if default.optional {
                self.merge_optional(&mut root, &default.id)?
            } else {
                self.merge_resource(&mut root, &default.id)?
            };
            merged += usize::from(contributed);
        }

        for id in &self.configs {
            merged += usize::from(self.merge_resource(&mut root, id)?);
        }

        merged += self.apply_options(&mut root)?;

        let properties: Vec<(&str, &str)> =
            self.conventions.framework_properties(&self.environment.properties).collect();
        if !properties.is_empty() {
            debug!(count = properties.len(), "applying framework properties");
            apply_overrides(&mut root, properties)?;
        }

        let variables =
            env::variable_overrides(&self.environment.variables, &self.declared, &self.conventions)?;
        apply_overrides_with(&mut root, variables.generic, KeyMatch::IgnoreCase)?;
        apply_overrides(&mut root, variables.declared)?;

        info!(resources = merged, "configuration resolved");
        Ok(root)
    }

    /// Build the merged tree and freeze it behind a factory.
    pub fn resolve(&self) -> Result<ConfigurationFactory> {
        Ok(ConfigurationFactory::new(self.resolve_tree()?))
    }

    /// Returns whether the resource contributed anything.
    fn merge_resource(&self, root: &mut ConfigNode, id: &str) -> Result<bool> {
        let node = self.locator.load(id)?;
        if node.is_null() {
            warn!(resource = id, "config resource is empty");
            return Ok(false);
        }
        debug!(resource = id, "merging config resource");
        merge_tree(root, node);
        Ok(true)
    }

    fn merge_optional(&self, root: &mut ConfigNode, id: &str) -> Result<bool> {
        match self.merge_resource(root, id) {
            Err(e) if e.is_not_found() => {
                warn!(resource = id, "optional config resource not found, skipping");
                Ok(false)
            }
            other => other,
        }
    }

    /// Resource bindings of the detected options first, then path bindings,
    /// each in command-line order. Returns the number of merged resources.
    fn apply_options(&self, root: &mut ConfigNode) -> Result<usize> {
        let mut merged = 0;
        for detected in &self.detected_options {
            for binding in self.bindings_for(&detected.name) {
                if let OptionBinding::Resource { resource, .. } = binding {
                    debug!(option = %detected.name, resource = %resource, "option injects resource");
                    merged += usize::from(self.merge_resource(root, resource)?);
                }
            }
        }

        for detected in &self.detected_options {
            for binding in self.bindings_for(&detected.name) {
                if let OptionBinding::Path { path: target, default, .. } = binding {
                    let value = detected
                        .value
                        .as_ref()
                        .or(default.as_ref())
                        .map(|v| ConfigNode::String(v.clone()))
                        .unwrap_or(ConfigNode::Null);
                    debug!(option = %detected.name, path = %target, "option sets config path");
                    path::write(root, &PathExpr::parse(target)?, value)?;
                }
            }
        }
        Ok(merged)
    }

    fn bindings_for<'a>(&'a self, option: &'a str) -> impl Iterator<Item = &'a OptionBinding> + 'a {
        self.option_bindings.iter().filter(move |b| b.option() == option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::resource::EmbeddedResources;
    use serde_json::json;
    use similar_asserts::assert_eq;

    fn aggregator(entries: &[(&str, &str)]) -> SourceAggregator {
        let embedded = entries
            .iter()
            .fold(EmbeddedResources::new(), |acc, (path, body)| acc.with(*path, *body));
        SourceAggregator::new(ResourceLocator::new(embedded))
    }

    #[test]
    fn test_no_sources_is_empty_object() {
        let tree = aggregator(&[]).resolve_tree().unwrap();
        assert_eq!(tree, ConfigNode::object());
    }

    #[test]
    fn test_defaults_then_configs() {
        let tree = aggregator(&[("defaults.yml", "timeout: 30\n"), ("app.yml", "server:\n  port: 8080\n")])
            .default_resource("classpath:defaults.yml")
            .config("classpath:app.yml")
            .resolve_tree()
            .unwrap();
        assert_eq!(tree, ConfigNode::from(json!({"timeout": 30, "server": {"port": 8080}})));
    }

    #[test]
    fn test_missing_optional_default_is_skipped() {
        let tree = aggregator(&[("a.yml", "a: 1\n")])
            .optional_default_resource("classpath:missing.yml")
            .config("classpath:a.yml")
            .resolve_tree()
            .unwrap();
        assert_eq!(tree, ConfigNode::from(json!({"a": 1})));
    }

    #[test]
    fn test_missing_required_config_fails() {
        let err = aggregator(&[]).config("classpath:missing.yml").resolve_tree().unwrap_err();
        assert!(matches!(err, ConfigError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_empty_document_contributes_nothing() {
        let tree = aggregator(&[("a.yml", "a: 1\n"), ("empty.yml", "")])
            .config("classpath:a.yml")
            .config("classpath:empty.yml")
            .resolve_tree()
            .unwrap();
        assert_eq!(tree, ConfigNode::from(json!({"a": 1})));
    }

    #[test]
    fn test_options_resources_before_paths() {
        let tree = aggregator(&[("extra.yml", "mode: extra\nlevel: 1\n")])
            .option_binding(OptionBinding::path("level", "level"))
            .option_binding(OptionBinding::resource("extra", "classpath:extra.yml"))
            .option_binding(OptionBinding::path_with_default("debug", "debug", "true"))
            .option_binding(OptionBinding::path("bare", "bare"))
            .detected_options([
                DetectedOption::with_value("level", "9"),
                DetectedOption::flag("extra"),
                DetectedOption::flag("debug"),
                DetectedOption::flag("bare"),
            ])
            .resolve_tree()
            .unwrap();
        assert_eq!(
            tree,
            ConfigNode::from(json!({"mode": "extra", "level": "9", "debug": "true", "bare": null}))
        );
    }

    #[test]
    fn test_undetected_options_contribute_nothing() {
        let tree = aggregator(&[("extra.yml", "mode: extra\n")])
            .option_binding(OptionBinding::resource("extra", "classpath:extra.yml"))
            .resolve_tree()
            .unwrap();
        assert_eq!(tree, ConfigNode::object());
    }

    #[test]
    fn test_properties_then_variables() {
        let env = Environment::new()
            .property("bq.a", "from-property")
            .property("bq.b", "from-property")
            .property("other.c", "ignored")
            .variable("BQ_A", "from-variable");
        let tree = aggregator(&[("app.yml", "a: file\nb: file\n")])
            .config("classpath:app.yml")
            .environment(env)
            .resolve_tree()
            .unwrap();
        assert_eq!(tree, ConfigNode::from(json!({"a": "from-variable", "b": "from-property"})));
    }

    #[test]
    fn test_variable_lands_on_mixed_case_key() {
        let env = Environment::new().variable("BQ_JDBC_MYDB_URL", "jdbc:mysql://localhost/db");
        let tree = aggregator(&[("app.yml", "jdbc:\n  myDb:\n    user: u\n")])
            .config("classpath:app.yml")
            .environment(env)
            .resolve_tree()
            .unwrap();
        assert_eq!(
            tree,
            ConfigNode::from(json!({"jdbc": {"myDb": {"user": "u", "url": "jdbc:mysql://localhost/db"}}}))
        );
    }

    #[test]
    fn test_declared_variable_with_custom_name() {
        let env = Environment::new().variable("DATABASE_URL", "pg://x");
        let tree = aggregator(&[])
            .environment(env)
            .declare_variable(DeclaredVariable::new("jdbc.main.url").named("DATABASE_URL"))
            .resolve_tree()
            .unwrap();
        assert_eq!(tree, ConfigNode::from(json!({"jdbc": {"main": {"url": "pg://x"}}})));
    }

    #[test]
    fn test_custom_conventions() {
        let env = Environment::new().property("app.x", "1").variable("APP_Y", "2").variable("BQ_Z", "3");
        let tree = aggregator(&[])
            .environment(env)
            .conventions(Conventions {
                property_prefix: "app".to_string(),
                variable_prefix: "APP_".to_string(),
            })
            .resolve_tree()
            .unwrap();
        assert_eq!(tree, ConfigNode::from(json!({"x": "1", "y": "2"})));
    }
}
