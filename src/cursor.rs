//! Path resolution and mutation over a [`Node`] tree.
//!
//! Literal segments are looked up by exact key; a wildcard segment enumerates
//! every key of the node it meets and continues below each child. Fan-out is
//! driven by an explicit worklist ([`Matches`]) so that deep or wide trees
//! never recurse, and so that callers can stop early.
//!
//! Writes re-walk the tree from the root one key at a time with exclusive
//! access, creating whatever is missing on the way down.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{PathkeeperError, Result};
use crate::guard::ResourceGuard;
use crate::node::Node;
use crate::path::{PathSpec, Segment, join};

// ------------- Resolved -------------
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolved {
    Single(Node),
    /// Concrete path to value, in native enumeration order.
    Fanned(IndexMap<String, Node>),
}

impl Resolved {
    pub fn single(&self) -> Option<&Node> {
        match self {
            Resolved::Single(node) => Some(node),
            Resolved::Fanned(_) => None,
        }
    }
    pub fn fanned(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Resolved::Single(_) => None,
            Resolved::Fanned(map) => Some(map),
        }
    }
    /// A fanned result becomes a mapping keyed by concrete paths.
    pub fn into_node(self) -> Node {
        match self {
            Resolved::Single(node) => node,
            Resolved::Fanned(map) => Node::Mapping(map),
        }
    }
}

// ------------- Matches -------------
/// Lazy `(concrete path, value)` pairs for a path, in the order the tree
/// enumerates them. Children that cannot resolve the remaining suffix are
/// skipped.
pub struct Matches<'a> {
    segments: &'a [Segment],
    stack: Vec<(usize, String, &'a Node)>,
}

impl<'a> Matches<'a> {
    pub fn new(root: &'a Node, spec: &'a PathSpec) -> Self {
        Self {
            segments: spec.segments(),
            stack: vec![(0, String::new(), root)],
        }
    }
}

impl<'a> Iterator for Matches<'a> {
    type Item = (String, &'a Node);
    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, prefix, node)) = self.stack.pop() {
            match self.segments.get(depth) {
                None => return Some((prefix, node)),
                Some(Segment::Key(key)) => {
                    if let Some(child) = node.child(key) {
                        self.stack.push((depth + 1, join(&prefix, key), child));
                    }
                }
                Some(Segment::Wildcard) => {
                    // reversed so that the first key is popped first
                    let mut children: Vec<_> = node
                        .entries()
                        .map(|(key, child)| (depth + 1, join(&prefix, &key), child))
                        .collect();
                    children.reverse();
                    self.stack.extend(children);
                }
            }
        }
        None
    }
}

// ------------- TreeCursor -------------
pub struct TreeCursor<'g> {
    guard: &'g dyn ResourceGuard,
}

impl<'g> TreeCursor<'g> {
    pub fn new(guard: &'g dyn ResourceGuard) -> Self {
        Self { guard }
    }

    /// Fan-out iterator over every concrete match of `spec`. The guard is
    /// consulted first when the path contains a wildcard.
    pub fn matches<'a>(&self, root: &'a Node, spec: &'a PathSpec) -> Result<Matches<'a>> {
        if spec.has_wildcard() {
            self.guard.check()?;
        }
        Ok(Matches::new(root, spec))
    }

    /// True when every literal segment before the first wildcard exists.
    /// For a literal path this is plain existence.
    pub fn reaches(&self, root: &Node, spec: &PathSpec) -> bool {
        walk(root, spec.literal_prefix()).is_some()
    }

    /// `None` when a literal segment outside any fan-out is missing. Below a
    /// wildcard, children missing the suffix are left out of the fanned
    /// result, which may end up empty. The empty path and a lone `*` yield
    /// the whole tree.
    pub fn resolve(&self, root: &Node, spec: &PathSpec) -> Result<Option<Resolved>> {
        if spec.is_whole_tree() {
            return Ok(Some(Resolved::Single(root.clone())));
        }
        if !spec.has_wildcard() {
            let found = walk(root, spec.segments());
            trace!(path = %spec, found = found.is_some(), "literal resolve");
            return Ok(found.map(|node| Resolved::Single(node.clone())));
        }
        if !self.reaches(root, spec) {
            trace!(path = %spec, "wildcard prefix missing");
            return Ok(None);
        }
        let fanned: IndexMap<String, Node> = self
            .matches(root, spec)?
            .map(|(path, node)| (path, node.clone()))
            .collect();
        debug!(path = %spec, matches = fanned.len(), "wildcard resolve");
        Ok(Some(Resolved::Fanned(fanned)))
    }

    pub fn exists(&self, root: &Node, spec: &PathSpec) -> Result<bool> {
        if spec.is_whole_tree() {
            return Ok(true);
        }
        Ok(self.matches(root, spec)?.next().is_some())
    }

    /// Writes `value` at `spec`, synthesizing missing intermediate nodes.
    /// Wildcard segments fan the write out over the keys that exist at that
    /// level; literal segments above a wildcard must exist. The empty path replaces the whole tree, which must stay a
    /// composite.
    pub fn set(&self, root: &mut Node, spec: &PathSpec, value: Node) -> Result<()> {
        if spec.is_empty() && !value.is_composite() {
            return Err(PathkeeperError::InvalidConstructionInput(format!(
                "the root must be a sequence or a mapping, got {value}"
            )));
        }
        if spec.has_wildcard() {
            self.guard.check()?;
        } else {
            let existing = existing_depth(root, spec.segments());
            debug!(
                path = %spec,
                missing = spec.segments().get(existing).map(Segment::as_str),
                created = spec.len().saturating_sub(existing + 1),
                "set"
            );
        }
        write(root, spec.segments(), value);
        Ok(())
    }
}

fn walk<'a>(root: &'a Node, segments: &[Segment]) -> Option<&'a Node> {
    segments
        .iter()
        .try_fold(root, |node, segment| node.child(segment.as_str()))
}

// How many leading literal segments already exist below `root`.
fn existing_depth(root: &Node, segments: &[Segment]) -> usize {
    let mut node = root;
    for (depth, segment) in segments.iter().enumerate() {
        match node.child(segment.as_str()) {
            Some(child) => node = child,
            None => return depth,
        }
    }
    segments.len()
}

fn write(node: &mut Node, segments: &[Segment], value: Node) {
    match segments.split_first() {
        None => *node = value,
        Some((Segment::Key(key), [])) => node.assign(key, value),
        // nothing is created above a wildcard
        Some((Segment::Key(key), rest)) if rest.iter().any(Segment::is_wildcard) => {
            if let Some(child) = node.child_mut(key) {
                write(child, rest, value);
            }
        }
        Some((Segment::Key(key), rest)) => write(node.slot(key), rest, value),
        Some((Segment::Wildcard, rest)) => {
            for key in node.keys() {
                if let Some(child) = node.child_mut(&key) {
                    write(child, rest, value.clone());
                }
            }
        }
    }
}
