//! Path expressions over configuration trees
//!
//! Grammar: `path := segment ( '.' segment | '[' index ']' )*`, where an
//! `index` is either a non-negative integer or the literal `.length` (one past
//! the last element). A path may also start with an index to address a root
//! array, and a `\.` inside a field name is a literal dot.
//!
//! Expressions are validated when parsed; navigation never reports syntax
//! problems.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, Result};

mod resolve;

pub use resolve::{
    resolve, resolve_ignore_case, resolve_parent_mut, write, write_ignore_case, MAX_INDEX_GAP,
};

const PAST_END_INDEX: &str = ".length";

/// How field names are matched against object keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMatch {
    #[default]
    Exact,
    /// Exact match first, then ASCII case-insensitive.
    IgnoreCase,
}

/// Array position addressed by an index segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    At(usize),
    /// `[.length]`: the position one past the last element.
    PastEnd,
}

impl Index {
    /// Concrete position in an array of `len` elements.
    pub fn position(self, len: usize) -> usize {
        match self {
            Index::At(i) => i,
            Index::PastEnd => len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(Index),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(&name.replace('.', "\\.")),
            Segment::Index(Index::At(i)) => write!(f, "[{i}]"),
            Segment::Index(Index::PastEnd) => write!(f, "[{PAST_END_INDEX}]"),
        }
    }
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    raw: String,
    segments: Vec<Segment>,
}

impl PathExpr {
    pub fn parse(path: &str) -> Result<Self> {
        let segments = Parser::new(path).parse()?;
        Ok(Self { raw: path.to_string(), segments })
    }

    /// The empty path, which addresses the root node.
    pub fn root() -> Self {
        Self { raw: String::new(), segments: Vec::new() }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for PathExpr {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        PathExpr::parse(s)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

struct Parser<'a> {
    path: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(path: &'a str) -> Self {
        Self { path, chars: path.char_indices().peekable() }
    }

    fn error(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::path_syntax(self.path, reason)
    }

    fn parse(mut self) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        if self.path.is_empty() {
            return Ok(segments);
        }

        match self.chars.peek().map(|&(_, c)| c) {
            Some('[') => {}
            Some('.') => return Err(self.error("path must not start with '.'")),
            _ => segments.push(Segment::Field(self.field()?)),
        }

        while let Some((pos, c)) = self.chars.next() {
            match c {
                '.' => {
                    if self.chars.peek().is_none() {
                        return Err(self.error("path must not end with '.'"));
                    }
                    segments.push(Segment::Field(self.field()?));
                }
                '[' => {
                    segments.push(Segment::Index(self.index(pos)?));
                    match self.chars.peek().copied() {
                        None | Some((_, '.')) | Some((_, '[')) => {}
                        Some((at, _)) => {
                            return Err(self.error(format!(
                                "invalid path after array index at position {at}; expected '.' or '['"
                            )))
                        }
                    }
                }
                other => {
                    return Err(self.error(format!("unexpected '{other}' at position {pos}")));
                }
            }
        }

        Ok(segments)
    }

    /// Field name up to the next unescaped '.' or '['.
    fn field(&mut self) -> Result<String> {
        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                '.' | '[' => break,
                ']' => return Err(self.error("unexpected ']' in field name")),
                '\\' => {
                    self.chars.next();
                    match self.chars.peek().map(|&(_, c)| c) {
                        Some('.') => {
                            self.chars.next();
                            name.push('.');
                        }
                        _ => name.push('\\'),
                    }
                }
                _ => {
                    self.chars.next();
                    name.push(c);
                }
            }
        }

        if name.is_empty() {
            return Err(self.error("empty field name"));
        }
        Ok(name)
    }

    /// Index body after '[' up to and including ']'.
    fn index(&mut self, open: usize) -> Result<Index> {
        let start = open + 1;
        let close = loop {
            match self.chars.next() {
                Some((pos, ']')) => break pos,
                Some(_) => {}
                None => {
                    return Err(self.error(format!(
                        "no closing ']' for array index opened at position {open}"
                    )))
                }
            }
        };

        let body = &self.path[start..close];
        if body == PAST_END_INDEX {
            return Ok(Index::PastEnd);
        }
        if body.is_empty() {
            return Err(self.error("empty array index"));
        }
        if let Some(digits) = body.strip_prefix('-') {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(self.error(format!("invalid negative array index: [{body}]")));
            }
        }
        if !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.error(format!("non-int array index: [{body}]")));
        }
        body.parse::<usize>()
            .map(Index::At)
            .map_err(|_| self.error(format!("array index out of range: [{body}]")))
    }
}
