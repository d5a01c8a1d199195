//! Source options shared by every subcommand

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::utils::parse_kv;
use confstack::resource;
use confstack::{
    Conventions, DeclaredVariable, EmbeddedResources, Environment, FolderResource,
    ResourceLocator, SourceAggregator,
};

#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Config resource to merge (file, URL, classpath:, stdin:); repeatable, later wins
    #[arg(short = 'c', long = "config", value_name = "LOC")]
    pub configs: Vec<String>,

    /// Base folder for relative --config names
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<String>,

    /// Directory searched for classpath: resources; repeatable, first match wins
    #[arg(long, value_name = "DIR")]
    pub classpath_root: Vec<PathBuf>,

    /// Override a config path; repeatable
    #[arg(short = 'P', long = "property", value_name = "PATH=VALUE")]
    pub properties: Vec<String>,

    /// Add a variable to the environment snapshot; repeatable
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub variables: Vec<String>,

    /// Map a variable name to a config path; an empty NAME uses the derived name
    #[arg(long = "declare-var", value_name = "PATH=NAME")]
    pub declared: Vec<String>,

    /// Ignore the process environment
    #[arg(long)]
    pub no_env: bool,
}

impl SourceArgs {
    pub fn aggregator(&self) -> Result<SourceAggregator> {
        let conventions = Conventions::default();
        let embedded = self
            .classpath_root
            .iter()
            .fold(EmbeddedResources::new(), |acc, root| acc.with_root(root));

        let mut environment = if self.no_env { Environment::new() } else { Environment::capture() };
        for arg in &self.properties {
            let (path, value) = parse_kv(arg).context("invalid --property")?;
            let name = format!("{}.{}", conventions.property_prefix, path);
            environment.properties.insert(name, value);
        }
        for arg in &self.variables {
            let (name, value) = parse_kv(arg).context("invalid --var")?;
            environment.variables.insert(name, value);
        }

        let mut aggregator = SourceAggregator::new(ResourceLocator::new(embedded))
            .configs(self.config_locations()?)
            .environment(environment)
            .conventions(conventions);

        for arg in &self.declared {
            let (path, name) = arg
                .split_once('=')
                .map(|(p, n)| (p.trim(), n.trim()))
                .unwrap_or((arg.trim(), ""));
            anyhow::ensure!(!path.is_empty(), "invalid --declare-var '{arg}': empty path");
            let variable = DeclaredVariable::new(path);
            aggregator = aggregator.declare_variable(if name.is_empty() {
                variable
            } else {
                variable.named(name)
            });
        }
        Ok(aggregator)
    }

    fn config_locations(&self) -> Result<Vec<String>> {
        let Some(dir) = &self.config_dir else {
            return Ok(self.configs.clone());
        };
        let folder = FolderResource::new(dir)
            .with_context(|| format!("invalid --config-dir '{dir}'"))?;
        Ok(self
            .configs
            .iter()
            .map(|id| if resource::is_relative(id) { folder.resolve(id) } else { id.clone() })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_applies_to_relative_names_only() {
        let args = SourceArgs {
            configs: vec!["a.yml".into(), "/etc/b.yml".into(), "classpath:c.yml".into()],
            config_dir: Some("conf".into()),
            ..SourceArgs::default()
        };
        assert_eq!(
            args.config_locations().unwrap(),
            vec!["conf/a.yml".to_string(), "/etc/b.yml".into(), "classpath:c.yml".into()]
        );
    }

    #[test]
    fn test_declared_variables_parsed() {
        let args = SourceArgs {
            declared: vec!["db.url=DATABASE_URL".into(), "db.user".into()],
            no_env: true,
            ..SourceArgs::default()
        };
        let aggregator = args.aggregator().unwrap();
        let names: Vec<String> = aggregator
            .declared_variables()
            .iter()
            .map(|v| v.canonical_name(aggregator.current_conventions()))
            .collect();
        assert_eq!(names, vec!["DATABASE_URL", "BQ_DB_USER"]);
    }

    #[test]
    fn test_bad_property_rejected() {
        let args = SourceArgs { properties: vec!["nope".into()], ..SourceArgs::default() };
        assert!(args.aggregator().is_err());
    }
}
