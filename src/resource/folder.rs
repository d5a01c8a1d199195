//! Folder identifiers that sub-paths can be appended to

use std::fmt;

use super::{file_url, CLASSPATH_PREFIX};
use crate::error::{ConfigError, Result};

/// A resource identifier normalized to denote a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderResource {
    base: String,
}

impl FolderResource {
    /// Normalize `id` into a folder identifier.
    ///
    /// An empty id is the current directory as a `file:` URL. The classpath
    /// root (`classpath:` or `classpath:/`) stays `classpath:`. Anything else
    /// gets a trailing `/` if it lacks one.
    pub fn new(id: &str) -> Result<Self> {
        let base = if id.is_empty() {
            let cwd = std::env::current_dir().map_err(|e| ConfigError::access(".", e))?;
            let mut url = file_url(&cwd);
            if !url.ends_with('/') {
                url.push('/');
            }
            url
        } else if id == CLASSPATH_PREFIX || id == "classpath:/" {
            CLASSPATH_PREFIX.to_string()
        } else if id.ends_with('/') {
            id.to_string()
        } else {
            format!("{id}/")
        };
        Ok(Self { base })
    }

    pub fn id(&self) -> &str {
        &self.base
    }

    /// Identifier of `sub` inside this folder. A leading `/` on `sub` is
    /// ignored.
    pub fn resolve(&self, sub: &str) -> String {
        format!("{}{}", self.base, sub.trim_start_matches('/'))
    }
}

impl fmt::Display for FolderResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}
