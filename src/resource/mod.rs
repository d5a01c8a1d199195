//! Locating and reading configuration resources
//!
//! A resource identifier is one of:
//! - `classpath:<relative-path>`: an [`EmbeddedResources`] entry
//! - `stdin:` / `stdin:json` / `stdin:yaml`: standard input, read once
//! - an absolute URI: `file:`, `http:`, `https:` or `jar:<url>!/<entry>`
//! - anything else: a file-system path, absolute or relative to the working
//!   directory

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::format::{self, Format};
use crate::node::ConfigNode;

mod embedded;
mod folder;

pub use embedded::EmbeddedResources;
pub use folder::FolderResource;

pub const CLASSPATH_PREFIX: &str = "classpath:";
const STDIN_PREFIX: &str = "stdin:";

/// A scheme of two or more characters; single letters are Windows drives.
static URI_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]+):").expect("valid regex"));

/// Bytes of one opened resource plus the hints used to pick its format.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Identifier as given by the caller.
    pub id: String,
    /// Where the bytes actually came from (file path, URL, archive entry).
    pub location: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Resource {
    pub fn format(&self) -> Format {
        Format::detect(self.content_type.as_deref(), &self.location)
    }

    /// Parse the bytes into a tree. Failures are reported against the
    /// resource id.
    pub fn parse(&self) -> Result<ConfigNode> {
        format::parse(&self.bytes, self.format()).map_err(|e| ConfigError::access(&self.id, e))
    }
}

/// Opens resources by identifier.
#[derive(Debug, Default)]
pub struct ResourceLocator {
    embedded: EmbeddedResources,
    stdin: OnceCell<Vec<u8>>,
}

impl ResourceLocator {
    pub fn new(embedded: EmbeddedResources) -> Self {
        Self { embedded, stdin: OnceCell::new() }
    }

    /// Use `bytes` in place of the process's standard input.
    pub fn with_stdin(self, bytes: impl Into<Vec<u8>>) -> Self {
        let stdin = OnceCell::with_value(bytes.into());
        Self { stdin, ..self }
    }

    pub fn embedded(&self) -> &EmbeddedResources {
        &self.embedded
    }

    pub fn open(&self, id: &str) -> Result<Resource> {
        debug!(resource = id, "opening config resource");

        if let Some(path) = id.strip_prefix(CLASSPATH_PREFIX) {
            return self.open_embedded(id, path);
        }
        if let Some(kind) = id.strip_prefix(STDIN_PREFIX) {
            return self.open_stdin(id, kind);
        }
        match uri_scheme(id) {
            Some(scheme) => match scheme.to_ascii_lowercase().as_str() {
                "file" => open_file(id, &file_url_path(id)),
                "http" | "https" => open_http(id),
                "jar" => self.open_jar(id),
                other => Err(ConfigError::access(id, format!("unsupported URL scheme '{other}'"))),
            },
            None => open_file(id, Path::new(id)),
        }
    }

    /// Open and parse in one step.
    pub fn load(&self, id: &str) -> Result<ConfigNode> {
        self.open(id)?.parse()
    }

    fn open_embedded(&self, id: &str, path: &str) -> Result<Resource> {
        if path.starts_with('/') {
            return Err(ConfigError::path_syntax(
                id,
                "classpath resource path must be relative, without a leading '/'",
            ));
        }
        if embedded::has_parent_segment(path) {
            return Err(ConfigError::path_syntax(
                id,
                "classpath resource path must not contain '..' segments",
            ));
        }
        match self.embedded.find(path).map_err(|e| ConfigError::access(id, e))? {
            Some((bytes, location)) => {
                Ok(Resource { id: id.to_string(), location, content_type: None, bytes })
            }
            None => Err(ConfigError::ResourceNotFound { id: id.to_string() }),
        }
    }

    fn open_stdin(&self, id: &str, kind: &str) -> Result<Resource> {
        let content_type = match kind.to_ascii_lowercase().as_str() {
            "" => None,
            "json" => Some("application/json"),
            "yaml" | "yml" => Some("application/yaml"),
            _ => return Err(ConfigError::path_syntax(id, "expected stdin:, stdin:json or stdin:yaml")),
        };
        let bytes = self
            .stdin
            .get_or_try_init(|| {
                let mut buf = Vec::new();
                std::io::stdin().read_to_end(&mut buf).map(|_| buf)
            })
            .map_err(|e| ConfigError::access(id, e))?;

        Ok(Resource {
            id: id.to_string(),
            location: "stdin".to_string(),
            content_type: content_type.map(str::to_string),
            bytes: bytes.clone(),
        })
    }

    /// `jar:<archive-url>!/<entry>`; the archive itself may be any locatable
    /// resource.
    fn open_jar(&self, id: &str) -> Result<Resource> {
        let body = &id["jar:".len()..];
        let Some((archive_id, entry)) = body.rsplit_once('!') else {
            return Err(ConfigError::path_syntax(id, "jar URL has no '!/' entry separator"));
        };
        let entry = entry.trim_start_matches('/');

        let archive = self.open(archive_id)?;
        let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes))
            .map_err(|e| ConfigError::access(id, e))?;
        let mut file = zip.by_name(entry).map_err(|e| ConfigError::access(id, e))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| ConfigError::access(id, e))?;

        Ok(Resource { id: id.to_string(), location: id.to_string(), content_type: None, bytes })
    }
}

/// Scheme of an absolute URI, or `None` for a plain path.
pub fn uri_scheme(id: &str) -> Option<&str> {
    URI_SCHEME.captures(id).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// True for identifiers that should be resolved against a base folder.
pub fn is_relative(id: &str) -> bool {
    uri_scheme(id).is_none() && !Path::new(id).is_absolute()
}

fn open_file(id: &str, path: &Path) -> Result<Resource> {
    let bytes = std::fs::read(path).map_err(|e| ConfigError::access(id, e))?;
    Ok(Resource {
        id: id.to_string(),
        location: path.display().to_string(),
        content_type: None,
        bytes,
    })
}

fn open_http(id: &str) -> Result<Resource> {
    let response = ureq::get(id).call().map_err(|e| ConfigError::access(id, e))?;
    let content_type = response.header("Content-Type").map(str::to_string);
    let mut bytes = Vec::new();
    response.into_reader().read_to_end(&mut bytes).map_err(|e| ConfigError::access(id, e))?;
    Ok(Resource { id: id.to_string(), location: id.to_string(), content_type, bytes })
}

/// `file:` URL for a local path.
pub(crate) fn file_url(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    let mut url = String::from("file://");
    if !text.starts_with('/') {
        url.push('/');
    }
    for b in text.bytes() {
        if b.is_ascii_alphanumeric() || b"-._~/:".contains(&b) {
            url.push(b as char);
        } else {
            url.push_str(&format!("%{b:02X}"));
        }
    }
    url
}

/// Local path named by a `file:` URL. Accepts `file:/p`, `file:///p` and
/// `file://localhost/p`.
fn file_url_path(url: &str) -> PathBuf {
    let rest = &url["file:".len()..];
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    let path = match rest.strip_prefix("//") {
        Some(authority_and_path) => match authority_and_path.find('/') {
            Some(0) => authority_and_path,
            Some(i) if authority_and_path[..i].eq_ignore_ascii_case("localhost") => {
                &authority_and_path[i..]
            }
            _ => rest,
        },
        None => rest,
    };
    PathBuf::from(percent_decode(path))
}

fn percent_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
