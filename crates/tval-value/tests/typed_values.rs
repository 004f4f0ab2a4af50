//! # Typed Value Integration Tests
//!
//! Construction, navigation, persistent edits and the wire codec exercised
//! against a registry loaded from a YAML bundle, including nested named
//! types, a recursive type, a template instance and an external type.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};
use tval_core::{AccessError, CodecError, TvalError, ValidationError};
use tval_schema::{ExternalType, TypeRegistry};
use tval_value::{construct, Element, Input, TypedValue};

const BUNDLE: &str = r#"
types:
  User: { id: int, name: string }
  Point3D: [float, float, float]
  Tree:
    ":Leaf": null
    ":Node": [int, Tree, Tree]
  Scene:
    owner: User
    points: [[User, Point3D]]
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

fn typed(element: Element) -> TypedValue {
    element.into_typed().expect("composite position")
}

fn scene_data() -> Value {
    json!({
        "owner": {"id": 1, "name": "Ann"},
        "points": [
            [{"id": 2, "name": "Bob"}, [0.0, 1.5, -2.0]],
            [{"id": 3, "name": "Cy"}, [4, 5, 6]]
        ],
        "label": ["Just", "origin"]
    })
}

// -- end-to-end examples -------------------------------------------------

#[test]
fn record_construct_and_unwrap() {
    let registry = registry();
    let user = construct(&registry, "User", json!({"id": 123, "name": "John"})).unwrap();
    assert_eq!(user.to_value(), json!({"id": 123, "name": "John"}));
    assert_eq!(user.type_name(), Some("User"));

    let err = validation(
        construct(&registry, "User", json!({"id": 123.5, "name": "John"})).unwrap_err(),
    );
    assert_eq!(err.path.to_string(), "id");
    assert_eq!(err.expected, "an integer");
}

#[test]
fn list_push_leaves_original_empty() {
    let sig = registry().build(&json!(["bool"])).unwrap();
    let empty = TypedValue::wrap(sig, json!([])).unwrap();
    let pushed = empty.push([true, false]).unwrap();
    assert_eq!(pushed.to_value(), json!([true, false]));
    assert_eq!(empty.to_value(), json!([]));
}

#[test]
fn maybe_payload_access() {
    let sig = registry()
        .build(&json!({":Just": "int", ":Nothing": null}))
        .unwrap();
    let just = TypedValue::variant(sig, "Just", 5).unwrap();
    assert_eq!(just.to_value(), json!([0, 5]));
    assert!(matches!(
        just.payload("Nothing"),
        Err(TvalError::StateMismatch(_))
    ));
    assert!(matches!(
        just.payload("Blah"),
        Err(TvalError::Access(AccessError::UndeclaredTag { .. }))
    ));
}

#[test]
fn nested_named_types_round_trip() {
    let registry = registry();
    let sig = registry.build(&json!([["User", "Point3D"]])).unwrap();
    let data = json!([
        [{"id": 1, "name": "Ann"}, [1.0, 2.0, 3.0]],
        [{"id": 2, "name": "Bob"}, [0.5, -1, 7]]
    ]);
    let pairs = TypedValue::wrap(Arc::clone(&sig), data.clone()).unwrap();
    assert_eq!(pairs.to_value(), data);

    let decoded = TypedValue::decode(sig, &pairs.encode().unwrap()).unwrap();
    assert_eq!(decoded, pairs);

    let first = typed(decoded.get(0usize).unwrap());
    let user = typed(first.get(0usize).unwrap());
    let point = typed(first.get(1usize).unwrap());
    assert_eq!(user.type_name(), Some("User"));
    assert_eq!(point.type_name(), Some("Point3D"));
    assert_eq!(user, typed(typed(pairs.get(0usize).unwrap()).get(0usize).unwrap()));
}

// -- navigation ----------------------------------------------------------

#[test]
fn children_know_their_path() {
    let scene = construct(&registry(), "Scene", scene_data()).unwrap();
    let points = typed(scene.field("points").unwrap());
    let bob = typed(typed(points.get(0usize).unwrap()).get(0usize).unwrap());
    assert_eq!(bob.path().to_string(), "points[0][0]");
    assert!(!bob.is_root());
    assert!(bob.root().is_root());
    assert_eq!(bob.root().to_value(), scene.to_value());
    assert_eq!(scene.at(&bob.path()).unwrap(), Element::Typed(bob.clone()));
    assert_eq!(bob.field("name").unwrap(), Element::Raw(json!("Bob")));
}

#[test]
fn keys_len_and_iteration() {
    let scene = construct(&registry(), "Scene", scene_data()).unwrap();
    assert_eq!(scene.len().unwrap(), 3);
    let names: Vec<String> = scene.keys().unwrap().iter().map(ToString::to_string).collect();
    assert_eq!(names, ["owner", "points", "label"]);
    assert!(scene.contains("owner").unwrap());
    assert!(!scene.contains("email").unwrap());
    assert!(matches!(
        scene.contains(0usize),
        Err(TvalError::Access(AccessError::KeyKind { .. }))
    ));

    let points = typed(scene.field("points").unwrap());
    let collected: Vec<Value> = points.iter().unwrap().map(|(_, e)| e.to_value()).collect();
    assert_eq!(Value::Array(collected), scene_data()["points"]);
    assert!(matches!(
        points.get(5usize),
        Err(TvalError::Access(AccessError::UndefinedIndex { index: 5, len: 2 }))
    ));
}

#[test]
fn named_access_on_tuple_is_key_kind() {
    let point = construct(&registry(), "Point3D", json!([1, 2, 3])).unwrap();
    assert!(matches!(
        point.field("x"),
        Err(TvalError::Access(AccessError::KeyKind { .. }))
    ));
}

// -- propagation ---------------------------------------------------------

#[test]
fn deep_edit_returns_new_root() {
    let scene = construct(&registry(), "Scene", scene_data()).unwrap();
    let before = scene.to_value();

    let points = typed(scene.field("points").unwrap());
    let bob = typed(typed(points.get(0usize).unwrap()).get(0usize).unwrap());
    let root = bob.with([("name", "Robert")]).unwrap();

    assert!(root.is_root());
    assert_eq!(scene.to_value(), before);
    assert_eq!(bob.field("name").unwrap().to_value(), json!("Bob"));

    let mut expected = before;
    expected["points"][0][0]["name"] = json!("Robert");
    assert_eq!(root.to_value(), expected);
}

#[test]
fn edits_from_one_snapshot_diverge() {
    let scene = construct(&registry(), "Scene", scene_data()).unwrap();
    let owner = typed(scene.field("owner").unwrap());
    let a = owner.with([("id", 10)]).unwrap();
    let b = owner.with([("id", 20)]).unwrap();
    assert_eq!(a.at(&owner.path()).unwrap().to_value()["id"], json!(10));
    assert_eq!(b.at(&owner.path()).unwrap().to_value()["id"], json!(20));
    assert_eq!(scene.field("owner").unwrap().to_value()["id"], json!(1));
}

#[test]
fn list_edit_inside_record() {
    let scene = construct(&registry(), "Scene", scene_data()).unwrap();
    let points = typed(scene.field("points").unwrap());
    let root = points.pop(1).unwrap();
    assert_eq!(root.field("points").unwrap().to_value().as_array().map(Vec::len), Some(1));
    assert_eq!(root.field("owner").unwrap(), scene.field("owner").unwrap());
}

#[test]
fn edit_errors_are_pathed_from_the_root() {
    let scene = construct(&registry(), "Scene", scene_data()).unwrap();
    let points = typed(scene.field("points").unwrap());
    let err = validation(
        points
            .push([json!([{"id": 4, "name": "Di"}, [1, 2]])])
            .unwrap_err(),
    );
    assert_eq!(err.path.to_string(), "points[2][1]");
    assert_eq!(err.expected, "an array of 3 elements");
}

#[test]
fn replace_scalar_root_and_nested_variant() {
    let registry = registry();
    let n = construct(&registry, "int", 5).unwrap();
    assert_eq!(n.replace(6).unwrap().to_value(), json!(6));
    assert!(n.replace("six").is_err());

    let scene = construct(&registry, "Scene", scene_data()).unwrap();
    let label = typed(scene.field("label").unwrap());
    let root = label.replace(json!(["Nothing", null])).unwrap();
    assert_eq!(root.field("label").unwrap().to_value(), json!([1, null]));
    assert_eq!(scene.field("label").unwrap().to_value(), json!([0, "origin"]));
}

// -- recursive and mixed construction ------------------------------------

#[test]
fn recursive_tree() {
    let registry = registry();
    let tree = construct(
        &registry,
        "Tree",
        json!(["Node", [1, ["Leaf", null], ["Node", [2, ["Leaf", null], ["Leaf", null]]]]]),
    )
    .unwrap();
    assert_eq!(
        tree.to_value(),
        json!([1, [1, [0, null], [1, [2, [0, null], [0, null]]]]])
    );

    let node = typed(tree.payload("Node").unwrap());
    let left = typed(node.get(1usize).unwrap());
    assert!(left.matches("Leaf").unwrap());
    assert_eq!(left.path().to_string(), "[1][1]");

    let grown = left
        .replace(json!(["Node", [0, ["Leaf", null], ["Leaf", null]]]))
        .unwrap();
    assert_eq!(
        grown.to_value(),
        json!([1, [1, [1, [0, [0, null], [0, null]]], [1, [2, [0, null], [0, null]]]]])
    );

    let err = validation(
        construct(&registry, "Tree", json!(["Node", [1, ["Leaf", null], ["Node", [2, 3, ["Leaf", null]]]]]))
            .unwrap_err(),
    );
    assert_eq!(err.path.to_string(), "[1][2][1][1]");
}

#[test]
fn mixed_input_adopts_typed_children() {
    let registry = registry();
    let owner = construct(&registry, "User", json!({"id": 9, "name": "Eve"})).unwrap();
    let point = construct(&registry, "Point3D", json!([1, 1, 1])).unwrap();
    let scene = construct(
        &registry,
        "Scene",
        Input::map([
            ("owner", Input::from(&owner)),
            (
                "points",
                Input::seq([Input::seq([Input::from(&owner), Input::from(&point)])]),
            ),
            ("label", Input::seq([Input::from("Nothing"), Input::null()])),
        ]),
    )
    .unwrap();
    assert_eq!(scene.field("owner").unwrap(), Element::Typed(owner.clone()));
    assert_eq!(
        scene.to_value(),
        json!({
            "owner": {"id": 9, "name": "Eve"},
            "points": [[{"id": 9, "name": "Eve"}, [1, 1, 1]]],
            "label": [1, null]
        })
    );

    let err = validation(
        construct(
            &registry,
            "Scene",
            Input::map([
                ("owner", Input::from(&point)),
                ("points", Input::seq(Vec::<Input>::new())),
                ("label", Input::seq([Input::from("Nothing"), Input::null()])),
            ]),
        )
        .unwrap_err(),
    );
    assert_eq!(err.path.to_string(), "owner");
    assert!(err.actual.starts_with("a typed value of type"));
}

#[test]
fn mapping_input_needs_exact_keys() {
    let err = validation(
        construct(&registry(), "User", Input::map([("id", Input::from(1))])).unwrap_err(),
    );
    assert!(err.path.is_root());
    assert_eq!(err.expected, "an object with keys (id, name)");
}

struct Email;

impl ExternalType for Email {
    fn describe(&self) -> String {
        "an email address".to_string()
    }

    fn accepts(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| s.contains('@'))
    }
}

#[test]
fn external_types_stay_raw() {
    let registry = registry();
    registry.define_external("Email", Arc::new(Email)).unwrap();
    registry
        .define("Contact", json!({"who": "User", "email": "Email"}))
        .unwrap();

    let contact = construct(
        &registry,
        "Contact",
        json!({"who": {"id": 1, "name": "Ann"}, "email": "ann@example.org"}),
    )
    .unwrap();
    assert_eq!(contact.field("email").unwrap(), Element::Raw(json!("ann@example.org")));

    let err = validation(
        construct(
            &registry,
            "Contact",
            json!({"who": {"id": 1, "name": "Ann"}, "email": "nope"}),
        )
        .unwrap_err(),
    );
    assert_eq!(err.path.to_string(), "email");
    assert_eq!(err.expected, "an email address");

    let bare = construct(&registry, "Email", "x@y").unwrap();
    assert_eq!(bare.to_value(), json!("x@y"));
}

#[test]
fn alias_of_external_accepts_typed_values() {
    let registry = registry();
    registry.define_external("Email", Arc::new(Email)).unwrap();
    registry.define("Owner", json!("Email")).unwrap();
    registry.define("Mailbox", json!({"owner": "Owner"})).unwrap();

    let email = construct(&registry, "Email", "a@b").unwrap();
    let owner = construct(&registry, "Owner", "c@d").unwrap();
    assert_eq!(owner.signature(), email.signature());

    let from_typed = construct(
        &registry,
        "Mailbox",
        Input::map([("owner", Input::from(&email))]),
    )
    .unwrap();
    let from_raw = construct(&registry, "Mailbox", json!({"owner": "a@b"})).unwrap();
    assert_eq!(from_typed, from_raw);
    assert_eq!(from_raw.field("owner").unwrap().as_raw(), Some(&json!("a@b")));
    assert!(from_raw.field("owner").unwrap().as_typed().is_none());
    assert_eq!(from_raw.with([("owner", &owner)]).unwrap().to_value(), json!({"owner": "c@d"}));
}

#[test]
fn values_keep_their_registry_alive() {
    let (team, lead) = {
        let registry = TypeRegistry::new();
        registry.define("User", json!({"id": "int", "name": "string"})).unwrap();
        registry.define("Team", json!({"lead": "User", "size": "int"})).unwrap();
        let team = construct(
            &registry,
            "Team",
            json!({"lead": {"id": 1, "name": "Ann"}, "size": 2}),
        )
        .unwrap();
        assert!(team.field("lead").unwrap().as_raw().is_none());
        let lead = typed(team.field("lead").unwrap());
        (team, lead)
    };

    let decoded = TypedValue::decode(Arc::clone(team.signature()), &team.encode().unwrap()).unwrap();
    assert_eq!(decoded, team);

    let swapped = team.with([("lead", Input::from(&lead)), ("size", Input::from(3))]).unwrap();
    assert_eq!(
        swapped.to_value(),
        json!({"lead": {"id": 1, "name": "Ann"}, "size": 3})
    );

    let renamed = lead.with([("name", "Bo")]).unwrap();
    assert_eq!(renamed.to_value()["lead"], json!({"id": 1, "name": "Bo"}));
}

#[test]
fn unknown_type_name_is_schema_error() {
    assert!(matches!(
        construct(&registry(), "Nope", json!(1)),
        Err(TvalError::Schema(_))
    ));
}

// -- codec ---------------------------------------------------------------

#[test]
fn integers_beyond_double_precision_encode_exactly() {
    let sig = registry().build(&json!(["int"])).unwrap();
    let big = TypedValue::wrap(Arc::clone(&sig), json!([9007199254740993u64, 1])).unwrap();
    let text = big.encode().unwrap();
    assert_eq!(text, "[9007199254740993,1]");
    let decoded = TypedValue::decode(sig, &text).unwrap();
    assert_eq!(decoded.to_value(), json!([9007199254740993u64, 1]));
    assert_eq!(decoded, big);
}

#[test]
fn decode_distinguishes_malformed_text() {
    let sig = registry().signature("Scene").unwrap();
    assert!(matches!(
        TypedValue::decode(Arc::clone(&sig), "{\"owner\": "),
        Err(TvalError::Codec(CodecError::Malformed { .. }))
    ));
    assert!(matches!(
        TypedValue::decode(sig, "{\"owner\": 1}"),
        Err(TvalError::Validation(_))
    ));
}

#[test]
fn encode_is_stable_across_input_order() {
    let registry = registry();
    let a = construct(&registry, "User", json!({"id": 1, "name": "Ann"})).unwrap();
    let b = construct(&registry, "User", json!({"name": "Ann", "id": 1})).unwrap();
    assert_eq!(a.encode().unwrap(), b.encode().unwrap());
    assert_eq!(a, b);
}

#[test]
fn encoding_a_decoded_value_is_idempotent() {
    let sig = registry().signature("Scene").unwrap();
    let once = TypedValue::decode(Arc::clone(&sig), &scene_data().to_string()).unwrap();
    let text = once.encode().unwrap();
    let twice = TypedValue::decode(sig, &text).unwrap();
    assert_eq!(once, twice);
    assert_eq!(twice.encode().unwrap(), text);
}

// -- properties ----------------------------------------------------------

fn user_strategy() -> impl Strategy<Value = Value> {
    (any::<i32>(), "[a-zA-Z ]{0,12}").prop_map(|(id, name)| json!({"id": id, "name": name}))
}

fn point_strategy() -> impl Strategy<Value = Value> {
    prop::array::uniform3(-1_000_000i32..1_000_000).prop_map(|p| json!(p))
}

fn pairs_strategy() -> impl Strategy<Value = Value> {
    prop::collection::vec((user_strategy(), point_strategy()), 0..6)
        .prop_map(|pairs| Value::Array(pairs.into_iter().map(|(u, p)| json!([u, p])).collect()))
}

proptest! {
    /// Unwrapping a constructed value gives back the input.
    #[test]
    fn unwrap_inverts_construct(data in pairs_strategy()) {
        let sig = registry().build(&json!([["User", "Point3D"]])).unwrap();
        let value = TypedValue::wrap(sig, data.clone()).unwrap();
        prop_assert_eq!(value.to_value(), data);
    }

    /// Decoding an encoding gives an equal value.
    #[test]
    fn decode_inverts_encode(data in pairs_strategy()) {
        let sig = registry().build(&json!([["User", "Point3D"]])).unwrap();
        let value = TypedValue::wrap(Arc::clone(&sig), data).unwrap();
        let back = TypedValue::decode(sig, &value.encode().unwrap()).unwrap();
        prop_assert_eq!(back, value);
    }

    /// An edit anywhere leaves the original root untouched and changes the
    /// new root only at the edited path.
    #[test]
    fn edits_are_persistent(
        items in prop::collection::vec(any::<i32>(), 1..10),
        pick in any::<prop::sample::Index>(),
        replacement in any::<i32>(),
    ) {
        let sig = registry().build(&json!({"items": ["int"], "tag": "string"})).unwrap();
        let data = json!({"items": items, "tag": "t"});
        let root = TypedValue::wrap(sig, data.clone()).unwrap();
        let list = root.field("items").unwrap().into_typed().unwrap();
        let i = pick.index(items.len());

        let edited = list.with([(i, replacement)]).unwrap();
        prop_assert_eq!(root.to_value(), data.clone());

        let mut expected = data;
        expected["items"][i] = json!(replacement);
        prop_assert_eq!(edited.to_value(), expected);
    }
}
