//! Environment snapshot, naming conventions and declared variables

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{ConfigError, Result};
use crate::merge::PropertyOverride;
use crate::path::PathExpr;

/// Prefixes that separate engine-owned properties and variables from those of
/// the hosting application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conventions {
    /// Property prefix, without the trailing `.` (`bq` matches `bq.a.b`).
    pub property_prefix: String,
    /// Variable prefix, including any separator (`BQ_`).
    pub variable_prefix: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self { property_prefix: "bq".to_string(), variable_prefix: "BQ_".to_string() }
    }
}

impl Conventions {
    /// Canonical variable name for a config path: `jdbc.myDb.url` becomes
    /// `BQ_JDBC_MYDB_URL`.
    pub fn variable_name(&self, path: &str) -> String {
        let body: Vec<String> = path.split('.').map(str::to_ascii_uppercase).collect();
        format!("{}{}", self.variable_prefix, body.join("_"))
    }

    /// Config path for a prefixed variable: `BQ_JDBC_MYDB_URL` becomes
    /// `jdbc.mydb.url`. `None` if the name lacks the prefix or has nothing
    /// after it.
    pub fn variable_path(&self, name: &str) -> Option<String> {
        let body = name.strip_prefix(&self.variable_prefix)?;
        let parts: Vec<String> =
            body.split('_').filter(|p| !p.is_empty()).map(str::to_ascii_lowercase).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("."))
        }
    }

    /// Property names under the prefix, with the prefix stripped.
    pub fn framework_properties<'a>(
        &self,
        properties: &'a BTreeMap<String, String>,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let prefix = format!("{}.", self.property_prefix.trim_end_matches('.'));
        properties.iter().filter_map(move |(k, v)| {
            k.strip_prefix(prefix.as_str()).filter(|p| !p.is_empty()).map(|p| (p, v.as_str()))
        })
    }
}

/// Properties and variables captured once at startup and passed around as
/// ordinary data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub properties: BTreeMap<String, String>,
    pub variables: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the process environment variables. Properties start empty;
    /// the caller adds them.
    pub fn capture() -> Self {
        Self { properties: BTreeMap::new(), variables: std::env::vars().collect() }
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

/// A variable mapped explicitly to one config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredVariable {
    pub path: String,
    /// Overrides the name derived from the path.
    pub name: Option<String>,
    /// Additional names the value may be read from.
    pub aliases: Vec<String>,
    pub description: Option<String>,
}

impl DeclaredVariable {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), name: None, aliases: Vec::new(), description: None }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.aliases.push(name.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn canonical_name(&self, conventions: &Conventions) -> String {
        self.name.clone().unwrap_or_else(|| conventions.variable_name(&self.path))
    }

    /// Canonical name followed by aliases.
    pub fn names(&self, conventions: &Conventions) -> Vec<String> {
        let mut names = vec![self.canonical_name(conventions)];
        names.extend(self.aliases.iter().cloned());
        names
    }

    /// Value of this variable in `variables`, checking every name. Two names
    /// carrying different values is an [`ConfigError::AliasConflict`].
    pub fn value<'a>(
        &self,
        variables: &'a BTreeMap<String, String>,
        conventions: &Conventions,
    ) -> Result<Option<&'a str>> {
        let mut found: Option<(String, &'a str)> = None;
        for name in self.names(conventions) {
            let Some(value) = variables.get(&name) else { continue };
            if let Some((first_name, first)) = &found {
                if *first != value.as_str() {
                    return Err(ConfigError::AliasConflict {
                        path: self.path.clone(),
                        first: format!("{first_name}={first}"),
                        second: format!("{name}={value}"),
                    });
                }
                continue;
            }
            found = Some((name, value.as_str()));
        }
        Ok(found.map(|(_, value)| value))
    }
}

/// Overrides derived from variables, split by how their paths should meet
/// existing keys.
#[derive(Debug, Default)]
pub(crate) struct VariableOverrides {
    /// From prefixed variables with no declaration; lowercase paths.
    pub generic: Vec<PropertyOverride>,
    /// From declared variables; paths as declared.
    pub declared: Vec<PropertyOverride>,
}

pub(crate) fn variable_overrides(
    variables: &BTreeMap<String, String>,
    declared: &[DeclaredVariable],
    conventions: &Conventions,
) -> Result<VariableOverrides> {
    let claimed: Vec<String> = declared.iter().flat_map(|dv| dv.names(conventions)).collect();
    let mut out = VariableOverrides::default();

    for (name, value) in variables {
        if claimed.contains(name) {
            continue;
        }
        if let Some(path) = conventions.variable_path(name) {
            PathExpr::parse(&path).map_err(|source| ConfigError::Variable {
                name: name.clone(),
                source: Box::new(source),
            })?;
            info!(variable = %name, path = %path, "config value set from environment variable");
            out.generic.push(PropertyOverride::new(path, value.as_str()));
        }
    }

    for dv in declared {
        if let Some(value) = dv.value(variables, conventions)? {
            info!(path = %dv.path, "config value set from declared variable");
            out.declared.push(PropertyOverride::new(dv.path.as_str(), value));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_variable_name_and_path() {
        let conv = Conventions::default();
        assert_eq!(conv.variable_name("jdbc.myDb.url"), "BQ_JDBC_MYDB_URL");
        assert_eq!(conv.variable_path("BQ_JDBC_MYDB_URL").as_deref(), Some("jdbc.mydb.url"));
        assert_eq!(conv.variable_path("BQ_"), None);
        assert_eq!(conv.variable_path("HOME"), None);
        assert_eq!(conv.variable_path("BQ_A__B").as_deref(), Some("a.b"));
    }

    #[test]
    fn test_framework_properties_filtered_and_stripped() {
        let conv = Conventions::default();
        let props = vars(&[("bq.a.b", "1"), ("bqx.c", "2"), ("app.d", "3"), ("bq.", "4")]);
        let found: Vec<_> = conv.framework_properties(&props).collect();
        assert_eq!(found, vec![("a.b", "1")]);
    }

    #[test]
    fn test_declared_variable_reads_alias() {
        let conv = Conventions::default();
        let dv = DeclaredVariable::new("jdbc.db.url").alias("DB_URL");
        let variables = vars(&[("DB_URL", "jdbc:x")]);
        assert_eq!(dv.value(&variables, &conv).unwrap(), Some("jdbc:x"));
    }

    #[test]
    fn test_declared_variable_alias_agreement_is_fine() {
        let conv = Conventions::default();
        let dv = DeclaredVariable::new("a.b").alias("AB");
        let variables = vars(&[("BQ_A_B", "same"), ("AB", "same")]);
        assert_eq!(dv.value(&variables, &conv).unwrap(), Some("same"));
    }

    #[test]
    fn test_declared_variable_alias_conflict() {
        let conv = Conventions::default();
        let dv = DeclaredVariable::new("a.b").alias("AB");
        let variables = vars(&[("BQ_A_B", "one"), ("AB", "two")]);
        let err = dv.value(&variables, &conv).unwrap_err();
        assert!(matches!(err, ConfigError::AliasConflict { .. }));
        assert!(err.to_string().contains("BQ_A_B=one"));
    }

    #[test]
    fn test_declared_names_are_not_applied_generically() {
        let conv = Conventions::default();
        let declared = vec![DeclaredVariable::new("jdbc.myDb.url")];
        let variables = vars(&[("BQ_JDBC_MYDB_URL", "u"), ("BQ_X", "1"), ("PATH", "/bin")]);

        let out = variable_overrides(&variables, &declared, &conv).unwrap();
        assert_eq!(out.generic, vec![PropertyOverride::new("x", "1")]);
        assert_eq!(out.declared, vec![PropertyOverride::new("jdbc.myDb.url", "u")]);
    }

    #[test]
    fn test_malformed_variable_path_names_the_variable() {
        let conv = Conventions::default();
        let err = variable_overrides(&vars(&[("BQ_X]", "1")]), &[], &conv).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Variable { ref name, ref source }
                if name == "BQ_X]" && matches!(**source, ConfigError::PathSyntax { .. })
        ));
        assert!(err.to_string().contains("BQ_X]"));
    }
}
