//! A tree together with everything that reads, writes and checks it.
//!
//! A [`Document`] exclusively owns its root node. Reads consult the path
//! cache before walking the tree, writes invalidate the cache and forget
//! validation statuses, and wildcard fan-out is preceded by a memory check.

use tracing::debug;

use crate::cache::PathCache;
use crate::config::DocumentConfig;
use crate::cursor::{Resolved, TreeCursor};
use crate::error::{PathkeeperError, Result};
use crate::filter::FilterEngine;
use crate::guard::{MemoryGuard, ResourceGuard};
use crate::node::Node;
use crate::path::PathKeeper;
use crate::validation::ValidationEngine;

pub struct Document {
    root: Node,
    paths: PathKeeper,
    cache: PathCache,
    validation: ValidationEngine,
    filters: FilterEngine,
    guard: Box<dyn ResourceGuard>,
}

impl Document {
    /// The root must be a sequence or a mapping.
    pub fn new(root: Node, config: DocumentConfig) -> Result<Self> {
        let guard = MemoryGuard::new(config.memory_limit.map(|limit| limit.0));
        Self::with_guard(root, config, Box::new(guard))
    }

    pub fn with_guard(
        root: Node,
        config: DocumentConfig,
        guard: Box<dyn ResourceGuard>,
    ) -> Result<Self> {
        if !root.is_composite() {
            return Err(PathkeeperError::InvalidConstructionInput(format!(
                "expected a sequence or a mapping, got {root}"
            )));
        }
        let mut document = Self {
            root,
            paths: PathKeeper::new(),
            cache: PathCache::new(config.cache),
            validation: ValidationEngine::new(config.rules, config.patterns),
            filters: FilterEngine::new(config.filters, config.inclusive_filters),
            guard,
        };
        if config.eager_validation {
            document.validate()?;
        }
        Ok(document)
    }

    pub fn from_json(json: &str, config: DocumentConfig) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::new(Node::from(value), config)
    }

    /// Resolves `path` without filtering. Literal paths are served from the
    /// cache when possible; wildcard results are cached per concrete path.
    pub fn resolve(&mut self, path: &str) -> Result<Option<Resolved>> {
        let (spec, _) = self.paths.keep(path);
        let key = spec.canonical();
        if !spec.has_wildcard() {
            if let Some(hit) = self.cache.get(&key) {
                debug!(path = %key, "cache hit");
                return Ok(Some(hit.clone()));
            }
        }
        let cursor = TreeCursor::new(self.guard.as_ref());
        let resolved = cursor.resolve(&self.root, &spec)?;
        match &resolved {
            Some(fanned @ Resolved::Fanned(_)) => self.cache.put_fanned(fanned),
            Some(single) => self.cache.put(&key, single.clone()),
            None => debug!(path = %key, "not found"),
        }
        Ok(resolved)
    }

    /// Resolves `path` and passes the result through the filters.
    pub fn get(&mut self, path: &str) -> Result<Option<Resolved>> {
        let resolved = self.resolve(path)?;
        Ok(resolved.map(|resolved| self.filters.filter_resolved(path, resolved)))
    }

    /// Writes `value` at `path`, creating missing intermediate nodes.
    pub fn set(&mut self, path: &str, value: impl Into<Node>) -> Result<()> {
        let (spec, _) = self.paths.keep(path);
        let cursor = TreeCursor::new(self.guard.as_ref());
        cursor.set(&mut self.root, &spec, value.into())?;
        self.cache.invalidate_for_write(&spec);
        self.validation.reset();
        Ok(())
    }

    pub fn exists(&mut self, path: &str) -> Result<bool> {
        let (spec, _) = self.paths.keep(path);
        if !spec.has_wildcard() && self.cache.has(&spec.canonical()) {
            return Ok(true);
        }
        TreeCursor::new(self.guard.as_ref()).exists(&self.root, &spec)
    }

    pub fn is_valid(&mut self, path: &str) -> Result<bool> {
        let cursor = TreeCursor::new(self.guard.as_ref());
        self.validation.is_valid(&self.root, &cursor, path)
    }

    /// Evaluates every rule now instead of on the first query.
    pub fn validate(&mut self) -> Result<()> {
        let cursor = TreeCursor::new(self.guard.as_ref());
        self.validation.validate(&self.root, &cursor)
    }

    pub fn failures(&self) -> Vec<&str> {
        self.validation.failures()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn to_tree(&self) -> Node {
        self.root.clone()
    }

    pub fn cache(&self) -> &PathCache {
        &self.cache
    }

    pub fn validation(&self) -> &ValidationEngine {
        &self.validation
    }

    pub fn validation_mut(&mut self) -> &mut ValidationEngine {
        &mut self.validation
    }

    pub fn filters_mut(&mut self) -> &mut FilterEngine {
        &mut self.filters
    }
}
