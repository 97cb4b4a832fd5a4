//! Memoized path resolutions.
//!
//! Entries are keyed by canonical path string and live as long as the owning
//! document. Wildcard paths are never stored as such: only the concrete
//! sub-paths of a fanned result are.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::cursor::Resolved;
use crate::path::{PathHasher, PathSpec};

/// What a write invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Only the exact target path. Ancestors and descendants cached earlier
    /// may go stale.
    Exact,
    /// The whole cache.
    #[default]
    Clear,
}

#[derive(Debug, Default)]
pub struct PathCache {
    entries: HashMap<String, Resolved, PathHasher>,
    policy: CachePolicy,
}

impl PathCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: HashMap::default(),
            policy,
        }
    }
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }
    pub fn get(&self, path: &str) -> Option<&Resolved> {
        self.entries.get(path)
    }
    pub fn has(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
    /// Ignored for paths containing a wildcard.
    pub fn put(&mut self, path: &str, value: Resolved) {
        if PathSpec::parse(path).has_wildcard() {
            return;
        }
        self.entries.insert(path.to_string(), value);
    }
    /// Stores every concrete path of a fanned result as a single value.
    pub fn put_fanned(&mut self, resolved: &Resolved) {
        if let Some(fanned) = resolved.fanned() {
            for (path, node) in fanned {
                self.entries
                    .insert(path.clone(), Resolved::Single(node.clone()));
            }
        }
    }
    pub fn invalidate(&mut self, path: &str) -> bool {
        self.entries.remove(path).is_some()
    }
    /// Applies the write policy for a `set` on `spec`.
    pub fn invalidate_for_write(&mut self, spec: &PathSpec) {
        let everything =
            self.policy == CachePolicy::Clear || spec.is_whole_tree() || spec.has_wildcard();
        if everything {
            debug!(path = %spec, dropped = self.entries.len(), "cache cleared");
            self.clear();
        } else {
            let dropped = self.invalidate(&spec.canonical());
            debug!(path = %spec, dropped, "cache entry invalidated");
        }
    }
    pub fn clear(&mut self) {
        self.entries.clear();
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
