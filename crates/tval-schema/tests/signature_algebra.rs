//! # Signature Algebra Integration Tests
//!
//! Exercises the public surface end to end: declarations built through a
//! registry, path-qualified validation, stable digests, and recursive and
//! templated types loaded from a YAML bundle.

use proptest::prelude::*;
use serde_json::{json, Value};
use tval_core::{SchemaError, TvalError, ValidationError};
use tval_schema::{TypeRegistry, TypeSignature};

const BUNDLE: &str = r#"
types:
  User: { id: int, name: string }
  Point3D: [float, float, float]
  Color: [":Red", ":Green", ":Blue"]
  Tree:
    ":Leaf": null
    ":Node": [int, Tree, Tree]
  Scene:
    owner: User
    points: [[User, Point3D]]
    color: Color
    label: MaybeString
"#;

fn registry() -> TypeRegistry {
    TypeRegistry::from_yaml_str(BUNDLE).expect("bundle should load")
}

fn validation(err: TvalError) -> ValidationError {
    match err {
        TvalError::Validation(v) => v,
        other => panic!("expected a validation error, got {other}"),
    }
}

fn check_err(sig: &TypeSignature, value: Value) -> ValidationError {
    validation(sig.check(&value).unwrap_err())
}

#[test]
fn record_field_mismatch_is_pathed() {
    let user = registry().signature("User").unwrap();
    assert!(user.check(&json!({"id": 123, "name": "John"})).is_ok());

    let err = check_err(&user, json!({"id": 123.5, "name": "John"}));
    assert_eq!(err.path.to_string(), "id");
    assert_eq!(err.expected, "an integer");
    assert_eq!(err.actual, "a float (123.5)");
}

#[test]
fn record_key_set_must_match_exactly() {
    let user = registry().signature("User").unwrap();
    let missing = check_err(&user, json!({"id": 1}));
    assert!(missing.path.is_root());
    assert_eq!(missing.expected, "an object with keys (id, name)");
    assert_eq!(missing.actual, "an object with keys (id)");

    let extra = check_err(&user, json!({"id": 1, "name": "x", "email": "x@y"}));
    assert!(extra.path.is_root());
}

#[test]
fn float_positions_accept_integers() {
    let point = registry().signature("Point3D").unwrap();
    assert!(point.check(&json!([1, 2.5, -3])).is_ok());
    let err = check_err(&point, json!([1, 2]));
    assert_eq!(err.expected, "an array of 3 elements");
}

#[test]
fn enum_accepts_tag_or_index() {
    let color = registry().signature("Color").unwrap();
    assert!(color.check(&json!("Green")).is_ok());
    assert!(color.check(&json!(2)).is_ok());
    for bad in [json!(3), json!(-1), json!("Purple"), json!(1.0)] {
        let err = check_err(&color, bad);
        assert_eq!(err.expected, "one of (Red, Green, Blue) or an index from 0 to 2");
    }
}

#[test]
fn variants_pair_rules() {
    let registry = registry();
    let maybe = registry.signature("MaybeInt").unwrap();
    assert!(maybe.check(&json!(["Just", 5])).is_ok());
    assert!(maybe.check(&json!([0, 5])).is_ok());
    assert!(maybe.check(&json!(["Nothing", null])).is_ok());
    assert!(maybe.check(&json!([1, null])).is_ok());

    let err = check_err(&maybe, json!(["Nothing", 5]));
    assert_eq!(err.path.to_string(), "[1]");

    let err = check_err(&maybe, json!(["Just", "five"]));
    assert_eq!(err.path.to_string(), "[1]");
    assert_eq!(err.expected, "an integer");

    let err = check_err(&maybe, json!(["Blah", 5]));
    assert_eq!(err.path.to_string(), "[0]");

    let err = check_err(&maybe, json!(["Just"]));
    assert_eq!(err.expected, "a [constructor, payload] pair");
}

#[test]
fn nested_paths_through_named_types() {
    let scene = registry().signature("Scene").unwrap();
    let good = json!({
        "owner": {"id": 1, "name": "Ann"},
        "points": [[{"id": 2, "name": "Bo"}, [0, 0, 0]]],
        "color": "Red",
        "label": ["Nothing", null]
    });
    assert!(scene.check(&good).is_ok());

    let mut bad = good.clone();
    bad["points"][0][1][2] = json!("up");
    let err = check_err(&scene, bad);
    assert_eq!(err.path.to_string(), "points[0][1][2]");
    assert_eq!(err.expected, "a float");

    let mut bad = good;
    bad["points"][0][0]["name"] = json!(7);
    let err = check_err(&scene, bad);
    assert_eq!(err.path.to_string(), "points[0][0].name");
}

#[test]
fn recursive_type_checks_to_data_depth() {
    let tree = registry().signature("Tree").unwrap();
    let value = json!(["Node", [1, ["Leaf", null], ["Node", [2, ["Leaf", null], ["Leaf", null]]]]]);
    assert!(tree.check(&value).is_ok());

    let bad = json!(["Node", [1, ["Leaf", null], ["Node", [2, ["Leaf", null], ["Twig", null]]]]]);
    let err = check_err(&tree, bad);
    assert_eq!(err.path.to_string(), "[1][2][1][2][0]");
}

#[test]
fn dropped_registry_is_a_schema_error() {
    let sig = registry().signature("Scene").unwrap();
    let err = sig
        .check(&json!({"owner": {"id": 1, "name": "x"}, "points": [], "color": 0, "label": [1, null]}))
        .unwrap_err();
    assert!(matches!(
        err,
        TvalError::Schema(SchemaError::RegistryDropped(ref name)) if name == "User"
    ));
}

#[test]
fn digests_are_stable() {
    let registry = TypeRegistry::new();
    let cases = [
        (json!("int"), "3f2b87a9fe7cc9b13835598c3981cd45e3e355309e5090aa0933d7becb6fba45"),
        (json!(["bool"]), "271a2838dc86ea1a7dd3c01548b29b4671a3497664c63693810f6de94ef25a8d"),
        (
            json!({"id": "int", "name": "string"}),
            "3b8fc6372fdebea04b60186116ee9fb3ef6ebae24321ac989f09753fbf2d21e1",
        ),
        (
            json!({":Just": "int", ":Nothing": null}),
            "742190b8348b527209d1278cb2248f8d312603ac87efed4e8ed9e51038ba125d",
        ),
    ];
    for (declaration, hex) in cases {
        assert_eq!(registry.build(&declaration).unwrap().digest().to_hex(), hex, "{declaration}");
    }
}

#[test]
fn template_instance_equals_spelled_out_declaration() {
    let registry = TypeRegistry::new();
    let instance = registry.signature("MaybeInt").unwrap();
    let spelled = registry
        .build(&json!({":Just": "int", ":Nothing": null}))
        .unwrap();
    assert_eq!(*instance, *spelled);
}

fn declaration() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(json!("int")),
        Just(json!("float")),
        Just(json!("string")),
        Just(json!("bool")),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|d| json!([d])),
            prop::collection::vec(inner.clone(), 2..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 1..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            prop::collection::btree_set("[A-Z][a-z]{0,5}", 2..4).prop_map(|tags| {
                Value::Array(tags.into_iter().map(|t| json!(format!(":{t}"))).collect())
            }),
        ]
    })
}

proptest! {
    /// Two signatures built independently from one declaration are equal.
    #[test]
    fn identical_declarations_build_equal_signatures(decl in declaration()) {
        let registry = TypeRegistry::new();
        let a = registry.build(&decl).unwrap();
        let b = registry.build(&decl).unwrap();
        prop_assert_eq!(a.digest(), b.digest());
        prop_assert_eq!(&*a, &*b);
    }

    /// Rendering back to a declaration and rebuilding preserves identity.
    #[test]
    fn to_declaration_rebuilds_same_signature(decl in declaration()) {
        let registry = TypeRegistry::new();
        let sig = registry.build(&decl).unwrap();
        let rebuilt = registry.build(&sig.to_declaration()).unwrap();
        prop_assert_eq!(&*sig, &*rebuilt);
    }
}
