//! Read-side post-processing of resolved values.
//!
//! A filter registered for a path coerces the value to a declared type and
//! then runs an optional callback. A rejected value is replaced by `false`.
//! When the value is composite, only scalar leaves whose key equals the last
//! segment of the filter path are touched.

use std::fmt;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::cursor::Resolved;
use crate::node::{Node, Scalar};
use crate::path::{PathSpec, Segment};

lazy_static! {
    static ref LEADING_INT: Regex = Regex::new(r"^\s*([+-]?\d+)").unwrap();
    static ref LEADING_FLOAT: Regex =
        Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)").unwrap();
}

// ------------- CastType -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastType {
    Int,
    Float,
    Bool,
    #[default]
    String,
    Array,
    Object,
    #[serde(alias = "json-parse")]
    Json,
}

fn leading_int(text: &str) -> i64 {
    match LEADING_INT.captures(text) {
        Some(captures) => {
            let digits = &captures[1];
            digits.parse().unwrap_or(if digits.starts_with('-') {
                i64::MIN
            } else {
                i64::MAX
            })
        }
        None => 0,
    }
}

fn leading_float(text: &str) -> f64 {
    LEADING_FLOAT
        .captures(text)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(0.0)
}

fn truthy(node: &Node) -> bool {
    match node {
        Node::Scalar(Scalar::Null) => false,
        Node::Scalar(Scalar::Bool(b)) => *b,
        Node::Scalar(Scalar::Int(i)) => *i != 0,
        Node::Scalar(Scalar::Float(f)) => *f != 0.0,
        Node::Scalar(Scalar::Str(s)) => !s.is_empty() && s != "0",
        composite => !composite.is_empty(),
    }
}

/// Loose coercion in the manner of scripting-language casts.
pub fn cast(value: Node, to: CastType) -> Node {
    match to {
        CastType::Int => Node::from(match &value {
            Node::Scalar(Scalar::Null) => 0,
            Node::Scalar(Scalar::Bool(b)) => i64::from(*b),
            Node::Scalar(Scalar::Int(i)) => *i,
            Node::Scalar(Scalar::Float(f)) => *f as i64,
            Node::Scalar(Scalar::Str(s)) => leading_int(s),
            composite => i64::from(!composite.is_empty()),
        }),
        CastType::Float => Node::from(match &value {
            Node::Scalar(Scalar::Null) => 0.0,
            Node::Scalar(Scalar::Bool(b)) => f64::from(u8::from(*b)),
            Node::Scalar(Scalar::Int(i)) => *i as f64,
            Node::Scalar(Scalar::Float(f)) => *f,
            Node::Scalar(Scalar::Str(s)) => leading_float(s),
            composite => f64::from(u8::from(!composite.is_empty())),
        }),
        CastType::Bool => Node::from(truthy(&value)),
        CastType::String => Node::from(value.to_text()),
        CastType::Array => match value {
            Node::Sequence(items) => Node::Sequence(items),
            Node::Mapping(map) => Node::Sequence(map.into_values().collect()),
            Node::Scalar(Scalar::Null) => Node::Sequence(Vec::new()),
            scalar => Node::Sequence(vec![scalar]),
        },
        CastType::Object => match value {
            Node::Mapping(map) => Node::Mapping(map),
            Node::Sequence(items) => Node::Mapping(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), item))
                    .collect(),
            ),
            Node::Scalar(Scalar::Null) => Node::empty_mapping(),
            scalar => Node::Mapping(IndexMap::from([("scalar".to_string(), scalar)])),
        },
        CastType::Json => match value {
            Node::Scalar(scalar) => serde_json::from_str::<Value>(&scalar.to_text())
                .map(Node::from)
                .unwrap_or_default(),
            composite => composite,
        },
    }
}

// ------------- FilterCallback -------------
pub enum FilterCallback {
    /// Keeps the coerced value when it returns true.
    Predicate(Box<dyn Fn(&Node, &[Node]) -> bool>),
    /// Replaces the coerced value; `None` rejects it.
    Transform(Box<dyn Fn(Node, &[Node]) -> Option<Node>>),
}

impl FilterCallback {
    pub fn predicate(f: impl Fn(&Node, &[Node]) -> bool + 'static) -> Self {
        FilterCallback::Predicate(Box::new(f))
    }
    pub fn transform(f: impl Fn(Node, &[Node]) -> Option<Node> + 'static) -> Self {
        FilterCallback::Transform(Box::new(f))
    }
}

impl fmt::Debug for FilterCallback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FilterCallback::Predicate(_) => write!(f, "Predicate(..)"),
            FilterCallback::Transform(_) => write!(f, "Transform(..)"),
        }
    }
}

// ------------- FilterRule -------------
#[derive(Debug, Default, Deserialize)]
pub struct FilterRule {
    #[serde(rename = "type", default)]
    pub cast: CastType,
    /// Extra arguments handed to the callback after the value.
    #[serde(default)]
    pub args: Vec<Node>,
    #[serde(skip)]
    pub callback: Option<FilterCallback>,
}

impl FilterRule {
    pub fn new(cast: CastType) -> Self {
        Self {
            cast,
            args: Vec::new(),
            callback: None,
        }
    }
    pub fn with_args(mut self, args: Vec<Node>) -> Self {
        self.args = args;
        self
    }
    pub fn with_callback(mut self, callback: FilterCallback) -> Self {
        self.callback = Some(callback);
        self
    }
    /// Coerces `value` and runs the callback.
    pub fn apply(&self, value: Node) -> Node {
        let value = cast(value, self.cast);
        match &self.callback {
            None => value,
            Some(FilterCallback::Predicate(keep)) => {
                if keep(&value, &self.args) {
                    value
                } else {
                    rejected()
                }
            }
            Some(FilterCallback::Transform(transform)) => {
                transform(value, &self.args).unwrap_or_else(rejected)
            }
        }
    }
}

/// The sentinel standing in for a value that failed its filter.
pub fn rejected() -> Node {
    Node::from(false)
}

// ------------- FilterEngine -------------
#[derive(Debug, Default)]
pub struct FilterEngine {
    filters: IndexMap<String, FilterRule>,
    inclusive: bool,
}

impl FilterEngine {
    /// With `inclusive` set, a path without a filter of its own falls back
    /// to the first wildcard filter path that covers it.
    pub fn new(filters: IndexMap<String, FilterRule>, inclusive: bool) -> Self {
        let filters = filters
            .into_iter()
            .map(|(path, rule)| (PathSpec::parse(&path).canonical(), rule))
            .collect();
        Self { filters, inclusive }
    }
    pub fn insert(&mut self, path: &str, rule: FilterRule) {
        self.filters.insert(PathSpec::parse(path).canonical(), rule);
    }
    pub fn len(&self) -> usize {
        self.filters.len()
    }
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    fn lookup(&self, spec: &PathSpec) -> Option<(PathSpec, &FilterRule)> {
        if let Some(rule) = self.filters.get(&spec.canonical()) {
            return Some((spec.clone(), rule));
        }
        if !self.inclusive {
            return None;
        }
        self.filters.iter().find_map(|(path, rule)| {
            let candidate = PathSpec::parse(path);
            (candidate.has_wildcard() && candidate.covers(spec)).then_some((candidate, rule))
        })
    }

    /// Filters a plain value found at `path`.
    pub fn filter(&self, path: &str, value: Node) -> Node {
        let Some((rule_path, rule)) = self.lookup(&PathSpec::parse(path)) else {
            return value;
        };
        trace!(path, rule = %rule_path, "filter applied");
        if value.is_composite() {
            filter_leaves(value, rule_path.leaf(), rule)
        } else {
            rule.apply(value)
        }
    }

    /// Filters a resolution of `path`. Fanned entries are handled one by one,
    /// matched by the last segment of their concrete path.
    pub fn filter_resolved(&self, path: &str, resolved: Resolved) -> Resolved {
        let fanned = match resolved {
            Resolved::Single(node) => return Resolved::Single(self.filter(path, node)),
            Resolved::Fanned(fanned) => fanned,
        };
        let Some((rule_path, rule)) = self.lookup(&PathSpec::parse(path)) else {
            return Resolved::Fanned(fanned);
        };
        let leaf = rule_path.leaf();
        Resolved::Fanned(
            fanned
                .into_iter()
                .map(|(concrete, node)| {
                    let key = concrete.rsplit('/').next().unwrap_or_default().to_string();
                    let node = if node.is_composite() {
                        filter_leaves(node, leaf, rule)
                    } else if leaf_matches(leaf, &key) {
                        rule.apply(node)
                    } else {
                        node
                    };
                    (concrete, node)
                })
                .collect(),
        )
    }
}

fn leaf_matches(leaf: Option<&Segment>, key: &str) -> bool {
    match leaf {
        None | Some(Segment::Wildcard) => true,
        Some(Segment::Key(name)) => name == key,
    }
}

// Applies `rule` to every scalar leaf under `node` whose key matches `leaf`.
fn filter_leaves(mut node: Node, leaf: Option<&Segment>, rule: &FilterRule) -> Node {
    {
        let mut stack: Vec<&mut Node> = vec![&mut node];
        while let Some(current) = stack.pop() {
            let children: Vec<(String, &mut Node)> = match current {
                Node::Mapping(map) => map.iter_mut().map(|(k, v)| (k.clone(), v)).collect(),
                Node::Sequence(items) => items
                    .iter_mut()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
                Node::Scalar(_) => Vec::new(),
            };
            for (key, child) in children {
                if child.is_composite() {
                    stack.push(child);
                } else if leaf_matches(leaf, &key) {
                    let value = std::mem::take(child);
                    *child = rule.apply(value);
                }
            }
        }
    }
    node
}
