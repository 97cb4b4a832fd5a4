//! The tree under management.
//!
//! A [`Node`] is a scalar, an ordered sequence (integer keyed) or a keyed
//! mapping (string keyed, insertion ordered). Traversal code matches on the
//! three shapes exhaustively instead of probing types at runtime.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::{debug, warn};

// used to print out readable forms of a node
use std::fmt;

// ------------- Scalar -------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    // Loose string view: null and false are blank, true is "1".
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(true) => "1".to_string(),
            Scalar::Bool(false) => String::new(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Str(s) => s.clone(),
        }
    }
}

// ------------- Node -------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(IndexMap<String, Node>),
}

impl Default for Node {
    fn default() -> Self {
        Node::Scalar(Scalar::Null)
    }
}

/// Parses a sequence key. Only canonical decimal indices qualify, so `"01"`
/// never addresses element 1.
pub fn index_of(key: &str) -> Option<usize> {
    let index = key.parse::<usize>().ok()?;
    (index.to_string() == key).then_some(index)
}

impl Node {
    pub fn null() -> Self {
        Node::default()
    }
    pub fn empty_mapping() -> Self {
        Node::Mapping(IndexMap::new())
    }
    pub fn is_composite(&self) -> bool {
        !matches!(self, Node::Scalar(_))
    }
    /// Null, the empty string, `false` and empty composites count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Scalar(Scalar::Null) | Node::Scalar(Scalar::Bool(false)) => true,
            Node::Scalar(Scalar::Str(s)) => s.is_empty(),
            Node::Scalar(_) => false,
            Node::Sequence(items) => items.is_empty(),
            Node::Mapping(map) => map.is_empty(),
        }
    }
    /// The string form handed to pattern matchers. Composites render as JSON.
    pub fn to_text(&self) -> String {
        match self {
            Node::Scalar(scalar) => scalar.to_text(),
            composite => Value::from(composite).to_string(),
        }
    }
    pub fn child(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping(map) => map.get(key),
            Node::Sequence(items) => index_of(key).and_then(|i| items.get(i)),
            Node::Scalar(_) => None,
        }
    }
    pub fn child_mut(&mut self, key: &str) -> Option<&mut Node> {
        match self {
            Node::Mapping(map) => map.get_mut(key),
            Node::Sequence(items) => match index_of(key) {
                Some(i) => items.get_mut(i),
                None => None,
            },
            Node::Scalar(_) => None,
        }
    }
    pub fn contains(&self, key: &str) -> bool {
        self.child(key).is_some()
    }
    /// Child keys in native order: insertion order for mappings, ascending
    /// index for sequences.
    pub fn keys(&self) -> Vec<String> {
        self.entries().map(|(key, _)| key).collect()
    }
    pub fn entries(&self) -> Entries<'_> {
        match self {
            Node::Mapping(map) => Entries::Mapping(map.iter()),
            Node::Sequence(items) => Entries::Sequence(items.iter().enumerate()),
            Node::Scalar(_) => Entries::Empty,
        }
    }
    /// Returns the child under `key`, creating an empty mapping when it is
    /// missing. A scalar holding the slot is replaced by a mapping. An index
    /// equal to a sequence's length appends; any other key the sequence does
    /// not hold turns it into a mapping keyed by its stringified indices, so
    /// no filler elements are ever created.
    pub fn slot(&mut self, key: &str) -> &mut Node {
        let index = index_of(key);
        match self {
            Node::Scalar(scalar) => {
                warn!(replaced = %scalar.to_text(), key, "scalar replaced by a mapping");
                *self = Node::empty_mapping();
            }
            Node::Sequence(items) if index.is_none_or(|i| i > items.len()) => {
                debug!(len = items.len(), key, "sequence promoted to a mapping");
                let promoted = std::mem::take(items)
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), item))
                    .collect();
                *self = Node::Mapping(promoted);
            }
            _ => (),
        }
        match self {
            Node::Mapping(map) => map
                .entry(key.to_owned())
                .or_insert_with(Node::empty_mapping),
            Node::Sequence(items) => {
                let index = index.map_or(items.len(), |i| i.min(items.len()));
                if index == items.len() {
                    items.push(Node::empty_mapping());
                }
                &mut items[index]
            }
            Node::Scalar(_) => unreachable!("scalars are replaced above"),
        }
    }
    /// Writes `value` under `key`, replacing an existing child in place.
    pub fn assign(&mut self, key: &str, value: Node) {
        *self.slot(key) = value;
    }
}

// ------------- Entries -------------
pub enum Entries<'a> {
    Mapping(indexmap::map::Iter<'a, String, Node>),
    Sequence(std::iter::Enumerate<std::slice::Iter<'a, Node>>),
    Empty,
}

impl<'a> Iterator for Entries<'a> {
    type Item = (String, &'a Node);
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Entries::Mapping(iter) => iter.next().map(|(k, v)| (k.clone(), v)),
            Entries::Sequence(iter) => iter.next().map(|(i, v)| (i.to_string(), v)),
            Entries::Empty => None,
        }
    }
}

// ------------- Conversions -------------
impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::null(),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Scalar(Scalar::Int(i)),
                None => Node::Scalar(Scalar::Float(n.as_f64().unwrap_or_default())),
            },
            Value::String(s) => Node::Scalar(Scalar::Str(s)),
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => {
                Node::Mapping(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}
impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        match node {
            Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Node::Scalar(Scalar::Int(i)) => Value::from(*i),
            Node::Scalar(Scalar::Float(f)) => {
                Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null)
            }
            Node::Scalar(Scalar::Str(s)) => Value::String(s.clone()),
            Node::Sequence(items) => Value::Array(items.iter().map(Value::from).collect()),
            Node::Mapping(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}
impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}
impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(Scalar::Str(s.to_string()))
    }
}
impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(Scalar::Str(s))
    }
}
impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Scalar(Scalar::Int(i))
    }
}
impl From<i32> for Node {
    fn from(i: i32) -> Self {
        Node::Scalar(Scalar::Int(i64::from(i)))
    }
}
impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Scalar(Scalar::Float(f))
    }
}
impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }
}
impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Sequence(items)
    }
}
impl From<IndexMap<String, Node>> for Node {
    fn from(map: IndexMap<String, Node>) -> Self {
        Node::Mapping(map)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", Value::from(self))
    }
}
