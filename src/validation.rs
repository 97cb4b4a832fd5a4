//! Rule-driven validation with hierarchical status.
//!
//! Every rule is a `(path, pattern, required)` triple. Evaluating a rule
//! records a pass/fail status for each concrete path it resolves to, then
//! folds those statuses into every ancestor prefix of the declared path. An
//! ancestor keeps the first status written to it, so a later rule never
//! overrides what an earlier rule decided for a shared ancestor.
//!
//! Paths outside every rule are valid. Statuses are computed lazily on the
//! first query and forgotten whenever the tree changes.

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::cursor::TreeCursor;
use crate::error::Result;
use crate::node::Node;
use crate::path::{PathHasher, PathSpec};
use crate::pattern::{PatternMatcher, PatternTable, RegexMatcher};

// ------------- Rule -------------
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rule {
    pub path: String,
    /// A pattern name from the pattern table, or a pattern.
    pub pattern: String,
    #[serde(default)]
    pub required: bool,
}

impl Rule {
    pub fn new(path: &str, pattern: &str, required: bool) -> Self {
        Self {
            path: path.to_string(),
            pattern: pattern.to_string(),
            required,
        }
    }
}

// ------------- ValidationEngine -------------
pub struct ValidationEngine {
    rules: Vec<Rule>,
    patterns: PatternTable,
    matcher: Box<dyn PatternMatcher>,
    status: IndexMap<String, bool, PathHasher>,
    evaluated: bool,
}

impl ValidationEngine {
    pub fn new(rules: Vec<Rule>, patterns: PatternTable) -> Self {
        Self::with_matcher(rules, patterns, Box::new(RegexMatcher::new()))
    }
    pub fn with_matcher(
        rules: Vec<Rule>,
        patterns: PatternTable,
        matcher: Box<dyn PatternMatcher>,
    ) -> Self {
        Self {
            rules,
            patterns,
            matcher,
            status: IndexMap::default(),
            evaluated: false,
        }
    }
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
    pub fn patterns(&self) -> &PatternTable {
        &self.patterns
    }
    /// Appends rules; statuses are recomputed on the next query.
    pub fn add_rules(&mut self, rules: Vec<Rule>) {
        self.rules.extend(rules);
        self.reset();
    }
    /// Replaces the pattern table; statuses are recomputed on the next query.
    pub fn set_patterns(&mut self, patterns: PatternTable) {
        self.patterns = patterns;
        self.reset();
    }
    pub fn reset(&mut self) {
        self.status.clear();
        self.evaluated = false;
    }
    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }
    pub fn status(&self, path: &str) -> Option<bool> {
        self.status.get(&PathSpec::parse(path).canonical()).copied()
    }
    /// Paths recorded as failed, in the order they were evaluated.
    pub fn failures(&self) -> Vec<&str> {
        self.status
            .iter()
            .filter(|(_, passed)| !**passed)
            .map(|(path, _)| path.as_str())
            .collect()
    }

    /// A value passes when it is optional and empty, or when it is a scalar
    /// whose text matches the pattern. The pattern is always compiled, so a
    /// malformed one surfaces even for values that would pass anyway.
    pub fn check_value(&mut self, value: &Node, pattern: &str, required: bool) -> Result<bool> {
        let matched = self.matcher.matches(pattern, &value.to_text())?;
        Ok((!required && value.is_empty()) || (!value.is_composite() && matched))
    }

    /// Evaluates one rule and returns the folded status of its matches.
    pub fn evaluate_rule(&mut self, root: &Node, cursor: &TreeCursor, rule: &Rule) -> Result<bool> {
        let spec = PathSpec::parse(&rule.path);
        let pattern = self.patterns.resolve(&rule.pattern).to_string();
        let mut concrete: Vec<(String, bool)> = Vec::new();
        for (path, value) in cursor.matches(root, &spec)? {
            let passed = self.check_value(value, &pattern, rule.required)?;
            trace!(path = %path, passed, "value checked");
            concrete.push((path, passed));
        }
        if concrete.is_empty() && !cursor.reaches(root, &spec) {
            // an unreachable path is checked as an empty value
            let passed = self.check_value(&Node::null(), &pattern, rule.required)?;
            concrete.push((spec.canonical(), passed));
        }
        let folded = concrete.iter().all(|(_, passed)| *passed);
        debug!(rule = %spec, matches = concrete.len(), passed = folded, "rule evaluated");
        self.status.extend(concrete);
        for ancestor in spec.ancestor_paths() {
            self.status.entry(ancestor).or_insert(folded);
        }
        Ok(folded)
    }

    /// Runs every rule once against `root`. A failing rule leaves no
    /// statuses behind, so the error is raised again on the next query.
    pub fn validate(&mut self, root: &Node, cursor: &TreeCursor) -> Result<()> {
        for rule in self.rules.clone() {
            if let Err(e) = self.evaluate_rule(root, cursor, &rule) {
                self.reset();
                return Err(e);
            }
        }
        self.evaluated = true;
        Ok(())
    }

    /// The status of `path`, evaluating the rules first if nothing is known
    /// about it yet. `""` and `*` ask about the whole document: every
    /// recorded status must have passed.
    pub fn is_valid(&mut self, root: &Node, cursor: &TreeCursor, path: &str) -> Result<bool> {
        let spec = PathSpec::parse(path);
        if spec.is_whole_tree() {
            if !self.evaluated {
                self.validate(root, cursor)?;
            }
            return Ok(self.status.values().all(|passed| *passed));
        }
        let key = spec.canonical();
        if !self.status.contains_key(&key) && !self.evaluated {
            self.validate(root, cursor)?;
        }
        Ok(self.status.get(&key).copied().unwrap_or(true))
    }
}
