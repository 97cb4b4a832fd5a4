use pathkeeper::cursor::{Resolved, TreeCursor};
use pathkeeper::guard::MemoryGuard;
use pathkeeper::node::Node;
use pathkeeper::path::PathSpec;
use pathkeeper::{PathkeeperError, Result, ResourceGuard};
use serde_json::json;

fn setup() -> Node {
    Node::from(json!({
        "persons": [
            {"name": "John Doe", "age": "twelve"},
            {"name": "Molly Doe", "age": "14"}
        ],
        "meta": {"owner": "registry", "version": 3}
    }))
}

fn resolve(root: &Node, path: &str) -> Option<Resolved> {
    let guard = MemoryGuard::unlimited();
    TreeCursor::new(&guard)
        .resolve(root, &PathSpec::parse(path))
        .unwrap()
}

fn set(root: &mut Node, path: &str, value: impl Into<Node>) {
    let guard = MemoryGuard::unlimited();
    TreeCursor::new(&guard)
        .set(root, &PathSpec::parse(path), value.into())
        .unwrap();
}

#[test]
fn literal_paths_resolve_to_single_values() {
    let root = setup();
    assert_eq!(
        resolve(&root, "persons/1/name"),
        Some(Resolved::Single(Node::from("Molly Doe")))
    );
    assert_eq!(
        resolve(&root, "meta/version"),
        Some(Resolved::Single(Node::from(3)))
    );
    assert_eq!(resolve(&root, "persons/2/name"), None);
    assert_eq!(resolve(&root, "persons/name"), None);
    // non-canonical indices never address sequence elements
    assert_eq!(resolve(&root, "persons/01/name"), None);
}

#[test]
fn whole_tree_paths_return_the_root() {
    let root = setup();
    assert_eq!(resolve(&root, ""), Some(Resolved::Single(root.clone())));
    assert_eq!(resolve(&root, "*"), Some(Resolved::Single(root.clone())));
}

#[test]
fn wildcard_fans_out_in_index_order() {
    let root = Node::from(json!({"a": [{"b": 1}, {"b": 2}]}));
    let fanned = resolve(&root, "a/*").unwrap();
    let fanned = fanned.fanned().unwrap();
    let paths: Vec<&str> = fanned.keys().map(String::as_str).collect();
    assert_eq!(paths, vec!["a/0", "a/1"]);
    assert_eq!(fanned["a/0"], Node::from(json!({"b": 1})));
    assert_eq!(fanned["a/1"], Node::from(json!({"b": 2})));
}

#[test]
fn wildcard_fans_out_in_insertion_order() {
    let root = Node::from(json!({"z": {"v": 1}, "a": {"v": 2}, "m": {"v": 3}}));
    let fanned = resolve(&root, "*/v").unwrap();
    let paths: Vec<&str> = fanned.fanned().unwrap().keys().map(String::as_str).collect();
    assert_eq!(paths, vec!["z/v", "a/v", "m/v"]);
}

#[test]
fn wildcard_skips_children_missing_the_suffix() {
    let root = Node::from(json!({"people": [{"age": 1}, {"name": "x"}, 7, {"age": 3}]}));
    let fanned = resolve(&root, "people/*/age").unwrap();
    let fanned = fanned.fanned().unwrap();
    assert_eq!(fanned.len(), 2);
    assert_eq!(fanned["people/0/age"], Node::from(1));
    assert_eq!(fanned["people/3/age"], Node::from(3));
}

#[test]
fn nested_wildcards_flatten() {
    let root = Node::from(json!({"g": [{"m": [1, 2]}, {"m": [3]}]}));
    let fanned = resolve(&root, "g/*/m/*").unwrap();
    let fanned = fanned.fanned().unwrap();
    let paths: Vec<&str> = fanned.keys().map(String::as_str).collect();
    assert_eq!(paths, vec!["g/0/m/0", "g/0/m/1", "g/1/m/0"]);
}

#[test]
fn wildcard_without_matches_is_an_empty_fan() {
    let root = setup();
    let fanned = resolve(&root, "meta/owner/*").unwrap();
    assert!(fanned.fanned().unwrap().is_empty());
    let fanned = resolve(&root, "persons/*/email").unwrap();
    assert!(fanned.fanned().unwrap().is_empty());
}

#[test]
fn missing_literal_prefix_before_a_wildcard_is_not_found() {
    let root = setup();
    assert_eq!(resolve(&root, "nowhere/*"), None);
    assert_eq!(resolve(&root, "persons/7/*"), None);
    assert_eq!(resolve(&root, "meta/history/*/by"), None);

    let guard = MemoryGuard::unlimited();
    let cursor = TreeCursor::new(&guard);
    assert!(!cursor.reaches(&root, &PathSpec::parse("nowhere/*")));
    assert!(cursor.reaches(&root, &PathSpec::parse("persons/*/email")));
    assert!(!cursor.exists(&root, &PathSpec::parse("nowhere/*")).unwrap());
}

#[test]
fn set_overwrites_without_touching_siblings() {
    let mut root = setup();
    set(&mut root, "persons/0/age", "12");
    assert_eq!(resolve(&root, "persons/0/age"), Some(Resolved::Single(Node::from("12"))));
    assert_eq!(
        resolve(&root, "persons/0/name"),
        Some(Resolved::Single(Node::from("John Doe")))
    );
    assert_eq!(resolve(&root, "persons/1/age"), Some(Resolved::Single(Node::from("14"))));
}

#[test]
fn set_creates_missing_structure() {
    let mut root = setup();
    set(&mut root, "meta/history/first/by", "admin");
    assert_eq!(
        resolve(&root, "meta/history"),
        Some(Resolved::Single(Node::from(json!({"first": {"by": "admin"}}))))
    );
    assert_eq!(resolve(&root, "meta/owner"), Some(Resolved::Single(Node::from("registry"))));
}

#[test]
fn set_past_the_end_creates_only_the_missing_key() {
    let mut root = setup();
    set(&mut root, "persons/4/name", "Neo Doe");
    let persons = root.child("persons").unwrap();
    assert_eq!(persons.keys(), vec!["0", "1", "4"]);
    assert_eq!(persons.child("2"), None);
    assert_eq!(
        persons.child("4"),
        Some(&Node::from(json!({"name": "Neo Doe"})))
    );
    assert_eq!(
        persons.child("0"),
        Some(&Node::from(json!({"name": "John Doe", "age": "twelve"})))
    );
}

#[test]
fn set_at_huge_indices_does_not_allocate_filler() {
    let mut root = setup();
    set(&mut root, "persons/18446744073709551614/name", "x");
    set(&mut root, "persons/100000000/name", "y");
    let persons = root.child("persons").unwrap();
    assert_eq!(persons.keys(), vec!["0", "1", "18446744073709551614", "100000000"]);
    assert_eq!(
        resolve(&root, "persons/100000000/name"),
        Some(Resolved::Single(Node::from("y")))
    );
}

#[test]
fn set_at_the_end_appends() {
    let mut root = Node::from(json!({"list": [1, 2]}));
    set(&mut root, "list/2", 3);
    assert_eq!(root, Node::from(json!({"list": [1, 2, 3]})));
}

#[test]
fn set_with_a_name_promotes_sequences() {
    let mut root = Node::from(json!({"list": ["x", "y"]}));
    set(&mut root, "list/extra", "z");
    assert_eq!(
        root,
        Node::from(json!({"list": {"0": "x", "1": "y", "extra": "z"}}))
    );
}

#[test]
fn set_through_a_scalar_replaces_it() {
    let mut root = setup();
    set(&mut root, "meta/owner/name", "registry");
    assert_eq!(
        resolve(&root, "meta/owner"),
        Some(Resolved::Single(Node::from(json!({"name": "registry"}))))
    );
}

#[test]
fn wildcard_set_covers_existing_keys() {
    let mut root = setup();
    set(&mut root, "persons/*/checked", true);
    let fanned = resolve(&root, "persons/*/checked").unwrap();
    let fanned = fanned.fanned().unwrap();
    assert_eq!(fanned.len(), 2);
    assert!(fanned.values().all(|node| *node == Node::from(true)));
    // nothing to fan out over, nothing written
    set(&mut root, "nowhere/*/x", 1);
    assert_eq!(resolve(&root, "nowhere"), None);
}

#[test]
fn empty_path_set_replaces_the_root() {
    let mut root = setup();
    set(&mut root, "", json!({"fresh": true}));
    assert_eq!(root, Node::from(json!({"fresh": true})));

    let guard = MemoryGuard::unlimited();
    let err = TreeCursor::new(&guard)
        .set(&mut root, &PathSpec::parse(""), Node::from(5))
        .unwrap_err();
    assert!(matches!(err, PathkeeperError::InvalidConstructionInput(_)));
    assert_eq!(root, Node::from(json!({"fresh": true})));
}

#[test]
fn exists_matches_resolution() {
    let root = setup();
    let guard = MemoryGuard::unlimited();
    let cursor = TreeCursor::new(&guard);
    assert!(cursor.exists(&root, &PathSpec::parse("persons/0/age")).unwrap());
    assert!(cursor.exists(&root, &PathSpec::parse("persons/*/age")).unwrap());
    assert!(cursor.exists(&root, &PathSpec::parse("")).unwrap());
    assert!(!cursor.exists(&root, &PathSpec::parse("persons/9")).unwrap());
    assert!(!cursor.exists(&root, &PathSpec::parse("meta/*/deeper")).unwrap());
}

struct Exhausted;

impl ResourceGuard for Exhausted {
    fn check(&self) -> Result<()> {
        Err(PathkeeperError::ResourceExhausted {
            usage: "2 gb".into(),
            limit: "1 gb".into(),
        })
    }
}

#[test]
fn guard_stops_fan_out_but_not_literal_access() {
    let mut root = setup();
    let cursor = TreeCursor::new(&Exhausted);
    assert!(cursor.resolve(&root, &PathSpec::parse("persons/0/age")).is_ok());
    let err = cursor
        .resolve(&root, &PathSpec::parse("persons/*/age"))
        .unwrap_err();
    assert!(matches!(err, PathkeeperError::ResourceExhausted { .. }));
    let err = cursor
        .set(&mut root, &PathSpec::parse("persons/*/age"), Node::from("1"))
        .unwrap_err();
    assert!(matches!(err, PathkeeperError::ResourceExhausted { .. }));
    // the failed write left the tree alone
    assert_eq!(
        resolve(&root, "persons/0/age"),
        Some(Resolved::Single(Node::from("twelve")))
    );
}
