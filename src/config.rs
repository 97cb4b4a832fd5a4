//! Document configuration.
//!
//! Everything a document needs besides its tree: validation patterns and
//! rules, read filters, the memory limit and the cache policy. A
//! configuration can be built in code or read from a file (toml, json or
//! yaml, chosen by extension) with `PATHKEEPER__*` environment variables
//! layered on top. Filter callbacks cannot be expressed in a file and are
//! attached in code with [`DocumentConfig::with_callback`].
//!
//! ```toml
//! memory_limit = "64MB"
//! cache = "clear"
//!
//! [patterns]
//! age = '#^[0-9]+$#u'
//!
//! [[rules]]
//! path = "persons/*/age"
//! pattern = "age"
//! required = true
//!
//! [filters."persons/*/age"]
//! type = "int"
//! ```

use ::config::{Config, Environment, File};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::cache::CachePolicy;
use crate::error::Result;
use crate::filter::{FilterCallback, FilterRule};
use crate::guard::ByteSize;
use crate::pattern::PatternTable;
use crate::validation::Rule;

pub const ENV_PREFIX: &str = "PATHKEEPER";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub patterns: PatternTable,
    pub rules: Vec<Rule>,
    pub filters: IndexMap<String, FilterRule>,
    pub memory_limit: Option<ByteSize>,
    pub cache: CachePolicy,
    pub inclusive_filters: bool,
    pub eager_validation: bool,
}

impl DocumentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let loaded: DocumentConfig = settings.try_deserialize()?;
        debug!(
            path,
            rules = loaded.rules.len(),
            patterns = loaded.patterns.len(),
            filters = loaded.filters.len(),
            "configuration loaded"
        );
        Ok(loaded)
    }

    pub fn with_pattern(mut self, name: &str, pattern: &str) -> Self {
        self.patterns.insert(name, pattern);
        self
    }
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
    pub fn with_filter(mut self, path: &str, rule: FilterRule) -> Self {
        self.filters.insert(path.to_string(), rule);
        self
    }
    /// Attaches a callback to the filter at `path`, creating a string filter
    /// there if none is declared.
    pub fn with_callback(mut self, path: &str, callback: FilterCallback) -> Self {
        self.filters.entry(path.to_string()).or_default().callback = Some(callback);
        self
    }
    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit = Some(ByteSize(bytes));
        self
    }
    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache = policy;
        self
    }
    pub fn with_inclusive_filters(mut self, inclusive: bool) -> Self {
        self.inclusive_filters = inclusive;
        self
    }
    pub fn with_eager_validation(mut self, eager: bool) -> Self {
        self.eager_validation = eager;
        self
    }
}
