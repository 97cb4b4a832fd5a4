//! Slash-delimited path expressions.
//!
//! `persons/3/age` addresses one value, `persons/*/age` addresses the `age`
//! of every person. Empty segments are dropped, so `/persons//3/` and
//! `persons/3` are the same path.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::Arc;

use seahash::SeaHasher;

// used to print out readable forms of a path
use std::fmt;

pub type PathHasher = BuildHasherDefault<SeaHasher>;

pub const SEPARATOR: char = '/';
pub const WILDCARD: &str = "*";

// ------------- Segment -------------
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Wildcard,
}

impl Segment {
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Key(key) => key,
            Segment::Wildcard => WILDCARD,
        }
    }
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard)
    }
}

/// Appends `key` to a concrete path prefix.
pub fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{SEPARATOR}{key}")
    }
}

// ------------- PathSpec -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    raw: String,
    segments: Vec<Segment>,
}

impl PathSpec {
    /// Never fails: an all-empty path parses to zero segments, which means
    /// the whole tree.
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split(SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                WILDCARD => Segment::Wildcard,
                key => Segment::Key(key.to_string()),
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }
    pub fn raw(&self) -> &str {
        &self.raw
    }
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
    pub fn len(&self) -> usize {
        self.segments.len()
    }
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(Segment::is_wildcard)
    }
    /// `""` and a lone `*` both address the entire tree.
    pub fn is_whole_tree(&self) -> bool {
        matches!(self.segments.as_slice(), [] | [Segment::Wildcard])
    }
    /// The segments before the first wildcard; all of them for a literal path.
    pub fn literal_prefix(&self) -> &[Segment] {
        let end = self
            .segments
            .iter()
            .position(Segment::is_wildcard)
            .unwrap_or(self.segments.len());
        &self.segments[..end]
    }
    pub fn leaf(&self) -> Option<&Segment> {
        self.segments.last()
    }
    pub fn canonical(&self) -> String {
        self.segments
            .iter()
            .map(Segment::as_str)
            .collect::<Vec<_>>()
            .join("/")
    }
    /// Every non-empty prefix, root to leaf: `a/b/c` gives `a`, `a/b`, `a/b/c`.
    pub fn ancestor_paths(&self) -> Vec<String> {
        let mut prefix = String::new();
        self.segments
            .iter()
            .map(|segment| {
                prefix = join(&prefix, segment.as_str());
                prefix.clone()
            })
            .collect()
    }
    /// True when `concrete` has the same length and every literal segment of
    /// this path matches; wildcards match any single segment.
    pub fn covers(&self, concrete: &PathSpec) -> bool {
        self.len() == concrete.len()
            && self
                .segments
                .iter()
                .zip(concrete.segments())
                .all(|(mine, theirs)| mine.is_wildcard() || mine == theirs)
    }
}

impl From<&str> for PathSpec {
    fn from(raw: &str) -> Self {
        PathSpec::parse(raw)
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

// ------------- PathKeeper -------------
// Owns parsed paths so that a raw string is only parsed once per document.
#[derive(Debug, Default)]
pub struct PathKeeper {
    kept: HashMap<String, Arc<PathSpec>, PathHasher>,
}

impl PathKeeper {
    pub fn new() -> Self {
        Self {
            kept: HashMap::default(),
        }
    }
    pub fn keep(&mut self, raw: &str) -> (Arc<PathSpec>, bool) {
        if let Some(kept) = self.kept.get(raw) {
            return (Arc::clone(kept), true);
        }
        let keepsake = Arc::new(PathSpec::parse(raw));
        self.kept.insert(raw.to_string(), Arc::clone(&keepsake));
        (keepsake, false)
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}
