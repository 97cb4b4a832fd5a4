//! Pattern references and the matcher that evaluates them.
//!
//! A rule names its pattern either symbolically (looked up in a
//! [`PatternTable`]) or by writing the pattern itself. Patterns may be given
//! bare (`^[0-9]+$`) or in delimited form with trailing flags
//! (`#^[a-z ]+$#iu`).

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use tracing::trace;

use crate::error::{PathkeeperError, Result};
use crate::path::PathHasher;

const DELIMITERS: [char; 6] = ['/', '#', '~', '%', '@', '!'];

pub trait PatternMatcher {
    /// `Err` only for a pattern that cannot be compiled.
    fn matches(&mut self, pattern: &str, text: &str) -> Result<bool>;
}

// ------------- PatternTable -------------
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PatternTable {
    patterns: IndexMap<String, String>,
}

impl PatternTable {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, name: &str, pattern: &str) {
        if !name.is_empty() && !pattern.is_empty() {
            self.patterns.insert(name.to_string(), pattern.to_string());
        }
    }
    /// The registered pattern for `reference`, or `reference` itself.
    pub fn resolve<'a>(&'a self, reference: &'a str) -> &'a str {
        self.patterns
            .get(reference)
            .map(String::as_str)
            .unwrap_or(reference)
    }
    pub fn len(&self) -> usize {
        self.patterns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for PatternTable {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut table = PatternTable::new();
        for (name, pattern) in pairs {
            table.insert(name, pattern);
        }
        table
    }
}

/// Rewrites a delimited pattern into plain regex syntax with inline flags.
/// A pattern counts as delimited when it opens with one of `/ # ~ % @ !`
/// and closes with the same character followed by nothing but letters.
/// Anything else, such as `@example\.com$` or `/api/v1`, is returned
/// unchanged.
pub fn translate(pattern: &str) -> Result<String> {
    let Some(delimiter) = pattern.chars().next().filter(|c| DELIMITERS.contains(c)) else {
        return Ok(pattern.to_string());
    };
    let close = match pattern.rfind(delimiter) {
        Some(close) if close > 0 => close,
        _ => return Ok(pattern.to_string()),
    };
    let flags = &pattern[close + delimiter.len_utf8()..];
    if !flags.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(pattern.to_string());
    }
    let body = &pattern[delimiter.len_utf8()..close];
    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' | 'x' | 'U' => {
                if !inline.contains(flag) {
                    inline.push(flag);
                }
            }
            // patterns are unicode aware already
            'u' => (),
            other => {
                return Err(PathkeeperError::MalformedPattern {
                    pattern: pattern.to_string(),
                    message: format!("unknown flag '{other}'"),
                });
            }
        }
    }
    if inline.is_empty() {
        Ok(body.to_string())
    } else {
        Ok(format!("(?{inline}){body}"))
    }
}

// ------------- RegexMatcher -------------
#[derive(Debug, Default)]
pub struct RegexMatcher {
    compiled: HashMap<String, Regex, PathHasher>,
}

impl RegexMatcher {
    pub fn new() -> Self {
        Self::default()
    }
    fn compile(&mut self, pattern: &str) -> Result<&Regex> {
        match self.compiled.entry(pattern.to_string()) {
            Entry::Occupied(e) => Ok(&*e.into_mut()),
            Entry::Vacant(e) => {
                let regex = Regex::new(&translate(pattern)?).map_err(|err| {
                    PathkeeperError::MalformedPattern {
                        pattern: pattern.to_string(),
                        message: err.to_string(),
                    }
                })?;
                trace!(pattern, "pattern compiled");
                Ok(&*e.insert(regex))
            }
        }
    }
    pub fn len(&self) -> usize {
        self.compiled.len()
    }
    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

impl PatternMatcher for RegexMatcher {
    fn matches(&mut self, pattern: &str, text: &str) -> Result<bool> {
        Ok(self.compile(pattern)?.is_match(text))
    }
}
