use indexmap::IndexMap;
use pathkeeper::cursor::Resolved;
use pathkeeper::filter::{CastType, FilterCallback, FilterEngine, FilterRule, cast, rejected};
use pathkeeper::node::Node;
use regex::Regex;
use serde_json::json;

fn tree() -> Node {
    Node::from(json!({
        "persons": [
            {"name": "John Doe", "age": "twelve"},
            {"name": "Molly Doe", "age": "14"},
            {"name": "Neo Doe", "age": "34 years"},
            {"name": "R2-D2", "age": 8}
        ]
    }))
}

fn setup() -> FilterEngine {
    let letters = Regex::new(r"(?i)^[a-z ]+$").unwrap();
    let filters = IndexMap::from([
        (
            "persons/*/age".to_string(),
            FilterRule::new(CastType::Int).with_callback(FilterCallback::predicate(
                |value, _| matches!(value, Node::Scalar(pathkeeper::Scalar::Int(age)) if *age > 10),
            )),
        ),
        (
            "persons/*/name".to_string(),
            FilterRule::new(CastType::String).with_callback(FilterCallback::predicate(
                move |value, _| letters.is_match(&value.to_text()),
            )),
        ),
    ]);
    FilterEngine::new(filters, false)
}

#[test]
fn filters_apply_to_matching_leaves_of_a_tree() {
    let filters = setup();
    let ages = filters.filter("persons/*/age", tree());
    assert_eq!(ages.child("persons").and_then(|p| p.child("0")).and_then(|p| p.child("age")), Some(&rejected()));
    assert_eq!(ages.child("persons").and_then(|p| p.child("1")).and_then(|p| p.child("age")), Some(&Node::from(14)));
    assert_eq!(ages.child("persons").and_then(|p| p.child("2")).and_then(|p| p.child("age")), Some(&Node::from(34)));
    assert_eq!(ages.child("persons").and_then(|p| p.child("3")).and_then(|p| p.child("age")), Some(&rejected()));
    // names are not touched by the age filter
    assert_eq!(
        ages.child("persons").and_then(|p| p.child("0")).and_then(|p| p.child("name")),
        Some(&Node::from("John Doe"))
    );

    let names = filters.filter("persons/*/name", tree());
    assert_eq!(
        names.child("persons").and_then(|p| p.child("0")).and_then(|p| p.child("name")),
        Some(&Node::from("John Doe"))
    );
    assert_eq!(
        names.child("persons").and_then(|p| p.child("3")).and_then(|p| p.child("name")),
        Some(&rejected())
    );
}

#[test]
fn fanned_results_are_filtered_per_entry() {
    let filters = setup();
    let fanned = Resolved::Fanned(IndexMap::from([
        ("persons/0/age".to_string(), Node::from("twelve")),
        ("persons/2/age".to_string(), Node::from("34 years")),
    ]));
    let filtered = filters.filter_resolved("persons/*/age", fanned);
    let filtered = filtered.fanned().unwrap();
    assert_eq!(filtered["persons/0/age"], rejected());
    assert_eq!(filtered["persons/2/age"], Node::from(34));
}

#[test]
fn lookup_is_exact_unless_inclusive() {
    let filters = setup();
    assert_eq!(filters.filter("persons/0/age", Node::from("twelve")), Node::from("twelve"));

    let mut inclusive = FilterEngine::new(IndexMap::new(), true);
    inclusive.insert("persons/*/age", FilterRule::new(CastType::Int));
    assert_eq!(inclusive.filter("persons/0/age", Node::from("12")), Node::from(12));
    assert_eq!(inclusive.filter("persons/0/name", Node::from("12")), Node::from("12"));
}

#[test]
fn filter_keys_are_canonical() {
    let mut filters = FilterEngine::default();
    filters.insert("/meta//version/", FilterRule::new(CastType::Int));
    assert_eq!(filters.filter("meta/version", Node::from("3")), Node::from(3));
}

#[test]
fn transforms_replace_or_reject() {
    let rule = FilterRule::new(CastType::String)
        .with_args(vec![Node::from("!")])
        .with_callback(FilterCallback::transform(|value, args| {
            let text = value.to_text();
            (!text.is_empty()).then(|| Node::from(format!("{text}{}", args[0].to_text())))
        }));
    assert_eq!(rule.apply(Node::from("hey")), Node::from("hey!"));
    assert_eq!(rule.apply(Node::null()), rejected());
}

#[test]
fn casts_follow_loose_conventions() {
    assert_eq!(cast(Node::from("42abc"), CastType::Int), Node::from(42));
    assert_eq!(cast(Node::from("abc"), CastType::Int), Node::from(0));
    assert_eq!(cast(Node::from(3.9), CastType::Int), Node::from(3));
    assert_eq!(cast(Node::from(true), CastType::Int), Node::from(1));
    assert_eq!(cast(Node::from("2.5kg"), CastType::Float), Node::from(2.5));
    assert_eq!(cast(Node::from("0"), CastType::Bool), Node::from(false));
    assert_eq!(cast(Node::from("no"), CastType::Bool), Node::from(true));
    assert_eq!(cast(Node::from(false), CastType::String), Node::from(""));
    assert_eq!(cast(Node::from(7), CastType::Array), Node::from(vec![Node::from(7)]));
    assert_eq!(
        cast(Node::from(json!(["a", "b"])), CastType::Object),
        Node::from(json!({"0": "a", "1": "b"}))
    );
    assert_eq!(
        cast(Node::from(r#"{"k": [1]}"#), CastType::Json),
        Node::from(json!({"k": [1]}))
    );
    assert_eq!(cast(Node::from("{broken"), CastType::Json), Node::null());
}

#[test]
fn filter_rules_deserialize_from_config_shapes() {
    let rule: FilterRule = serde_json::from_value(json!({"type": "json-parse"})).unwrap();
    assert_eq!(rule.cast, CastType::Json);
    let rule: FilterRule = serde_json::from_value(json!({"args": [1, "x"]})).unwrap();
    assert_eq!(rule.cast, CastType::String);
    assert_eq!(rule.args, vec![Node::from(1), Node::from("x")]);
    assert!(rule.callback.is_none());
}
