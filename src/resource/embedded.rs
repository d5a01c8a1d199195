//! Resources bundled with the program, addressed by `classpath:` identifiers

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

/// A registry of relative paths to document bytes, backed by optional
/// directories searched in order when a path has no registered entry.
///
/// Registered entries shadow search roots; among roots the first hit wins.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: BTreeMap<String, Vec<u8>>,
    roots: Vec<PathBuf>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under `path`, e.g. the output of `include_str!`.
    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(path.into(), bytes.into());
    }

    /// Add a directory to search after the registered entries.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
            || (!has_parent_segment(path) && self.roots.iter().any(|root| root.join(path).is_file()))
    }

    /// Bytes and a display location for `path`, or `Ok(None)` when neither the
    /// registry nor any root has it. Roots are never searched for a path with
    /// a `..` segment.
    pub fn find(&self, path: &str) -> io::Result<Option<(Vec<u8>, String)>> {
        if path.is_empty() {
            return Ok(None);
        }
        if let Some(bytes) = self.entries.get(path) {
            return Ok(Some((bytes.clone(), format!("embedded:{path}"))));
        }
        if has_parent_segment(path) {
            return Ok(None);
        }
        for root in &self.roots {
            let candidate = root.join(path);
            if candidate.is_file() {
                let bytes = std::fs::read(&candidate)?;
                return Ok(Some((bytes, candidate.display().to_string())));
            }
        }
        Ok(None)
    }
}

/// True when `path` has a `..` segment, with `/` or `\` as separator.
pub(crate) fn has_parent_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}
