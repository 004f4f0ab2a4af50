//! Construction: validate an [`Input`] against a signature and lift it into
//! nodes.
//!
//! Raw JSON positions are checked in full with
//! [`TypeSignature::check_at`] before anything is built from them, so a
//! lifted subtree is always valid. Sequence and mapping inputs are walked
//! position by position, and typed inputs are adopted when their signature
//! digest matches the position. Scalar and external-type positions are
//! stored raw; every other position becomes a child [`TypedValue`].

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tval_core::{describe_value, TvalError, ValidationError, ValuePath};
use tval_schema::{Resolved, SignatureKind, TypeSignature};

use crate::input::Input;
use crate::node::{Node, Slot};
use crate::value::TypedValue;

/// How a position is stored.
enum Position {
    /// Raw data; carries the signature a root value at this position uses.
    Leaf(Arc<TypeSignature>),
    /// A child typed value with this structural signature.
    Composite(Arc<TypeSignature>),
}

fn position(sig: &Arc<TypeSignature>) -> Result<Position, TvalError> {
    match sig.kind() {
        SignatureKind::Scalar(_) => Ok(Position::Leaf(Arc::clone(sig))),
        SignatureKind::Class(class) => match class.dereference_named()? {
            (last, Resolved::External(_)) if last.name() == class.name() => {
                Ok(Position::Leaf(Arc::clone(sig)))
            }
            (last, Resolved::External(_)) => Ok(Position::Leaf(Arc::new(TypeSignature::from_kind(
                SignatureKind::Class(last),
            )?))),
            (_, Resolved::Declared(target)) if target.is_scalar() => Ok(Position::Leaf(target)),
            (_, Resolved::Declared(target)) => Ok(Position::Composite(target)),
        },
        _ => Ok(Position::Composite(Arc::clone(sig))),
    }
}

fn invariant(sig: &TypeSignature, detail: &str) -> TvalError {
    TvalError::Construction(format!("cannot lift validated data into {sig}: {detail}"))
}

fn describe_input(input: &Input) -> String {
    match input {
        Input::Json(value) => describe_value(value),
        Input::Typed(value) => format!("a typed value of type {}", value.signature()),
        Input::Seq(items) if items.len() == 1 => "an array of 1 element".to_string(),
        Input::Seq(items) => format!("an array of {} elements", items.len()),
        Input::Map(entries) if entries.is_empty() => "an empty object".to_string(),
        Input::Map(entries) => {
            let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
            format!("an object with keys ({})", keys.join(", "))
        }
    }
}

fn mismatch(path: &ValuePath, expected: impl Into<String>, input: &Input) -> TvalError {
    ValidationError::new(path.clone(), expected, describe_input(input)).into()
}

/// Construct a root value.
pub(crate) fn lift_root(
    sig: &Arc<TypeSignature>,
    input: Input,
    path: &mut ValuePath,
) -> Result<TypedValue, TvalError> {
    match lift_input(sig, input, path)? {
        Slot::Typed(value) => Ok(value),
        Slot::Raw(value) => match position(sig)? {
            Position::Leaf(leaf) => Ok(TypedValue::from_parts(leaf, Node::Scalar(value))),
            Position::Composite(target) => Err(invariant(&target, "raw data at a composite root")),
        },
    }
}

/// Validate and lift one position.
pub(crate) fn lift_input(
    sig: &Arc<TypeSignature>,
    input: Input,
    path: &mut ValuePath,
) -> Result<Slot, TvalError> {
    match input {
        Input::Json(value) => {
            sig.check_at(&value, path)?;
            lift_json(sig, value)
        }
        Input::Typed(value) => adopt(sig, value, path),
        Input::Seq(items) => lift_seq(sig, items, path),
        Input::Map(entries) => lift_map(sig, entries, path),
    }
}

fn adopt(sig: &Arc<TypeSignature>, value: TypedValue, path: &ValuePath) -> Result<Slot, TvalError> {
    match position(sig)? {
        Position::Leaf(leaf) if **value.signature() == *leaf => Ok(Slot::Raw(value.to_value())),
        Position::Composite(target) if **value.signature() == *target => {
            Ok(Slot::Typed(value.detached()))
        }
        Position::Leaf(expected) | Position::Composite(expected) => Err(mismatch(
            path,
            format!("a value of type {expected}"),
            &Input::Typed(value),
        )),
    }
}

fn lift_seq(sig: &Arc<TypeSignature>, items: Vec<Input>, path: &mut ValuePath) -> Result<Slot, TvalError> {
    let target = match position(sig)? {
        Position::Composite(target) => target,
        Position::Leaf(leaf) => return Err(mismatch(path, leaf.expected(), &Input::Seq(items))),
    };
    let node = match target.kind() {
        SignatureKind::List(element) => {
            let mut slots = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                path.push(i);
                slots.push(lift_input(element, item, path)?);
                path.pop();
            }
            Node::List(slots)
        }
        SignatureKind::Tuple(elements) if elements.len() == items.len() => {
            let mut slots = Vec::with_capacity(items.len());
            for (i, (element, item)) in elements.iter().zip(items).enumerate() {
                path.push(i);
                slots.push(lift_input(element, item, path)?);
                path.pop();
            }
            Node::Tuple(slots)
        }
        SignatureKind::Variants(constructors) if items.len() == 2 => {
            let mut pair = items.into_iter();
            let (Some(selector), Some(payload)) = (pair.next(), pair.next()) else {
                return Err(invariant(&target, "pair lost an element"));
            };
            let index = match &selector {
                Input::Json(value) => target.tag_position(value),
                _ => None,
            };
            let Some(index) = index else {
                path.push(0usize);
                return Err(mismatch(path, target.selector_expected(), &selector));
            };
            path.push(1usize);
            let payload = match constructors.get_index(index) {
                Some((_, Some(payload_sig))) => Some(lift_input(payload_sig, payload, path)?),
                Some((_, None)) if matches!(payload, Input::Json(Value::Null)) => None,
                Some((name, None)) => {
                    return Err(mismatch(
                        path,
                        format!("null, since \"{name}\" carries no payload"),
                        &payload,
                    ))
                }
                None => return Err(invariant(&target, "selector out of range")),
            };
            path.pop();
            Node::Variant { index, payload }
        }
        _ => return Err(mismatch(path, target.expected(), &Input::Seq(items))),
    };
    Ok(Slot::Typed(TypedValue::from_parts(target, node)))
}

fn lift_map(
    sig: &Arc<TypeSignature>,
    entries: Vec<(String, Input)>,
    path: &mut ValuePath,
) -> Result<Slot, TvalError> {
    let target = match position(sig)? {
        Position::Composite(target) => target,
        Position::Leaf(leaf) => return Err(mismatch(path, leaf.expected(), &Input::Map(entries))),
    };
    let Some(fields) = target.fields() else {
        return Err(mismatch(path, target.expected(), &Input::Map(entries)));
    };
    let keys_match = entries.len() == fields.len()
        && fields
            .keys()
            .all(|f| entries.iter().filter(|(k, _)| k == f).count() == 1);
    if !keys_match {
        return Err(mismatch(path, target.expected(), &Input::Map(entries)));
    }

    let mut given: IndexMap<String, Input> = entries.into_iter().collect();
    let mut slots = IndexMap::with_capacity(fields.len());
    for (name, field_sig) in fields {
        let Some(input) = given.shift_remove(name) else {
            return Err(invariant(&target, "field vanished"));
        };
        path.push(name.as_str());
        slots.insert(name.clone(), lift_input(field_sig, input, path)?);
        path.pop();
    }
    Ok(Slot::Typed(TypedValue::from_parts(target, Node::Record(slots))))
}

/// Lift data that has already passed `check`.
fn lift_json(sig: &Arc<TypeSignature>, value: Value) -> Result<Slot, TvalError> {
    match position(sig)? {
        Position::Leaf(_) => Ok(Slot::Raw(value)),
        Position::Composite(target) => build_json(target, value).map(Slot::Typed),
    }
}

fn build_json(target: Arc<TypeSignature>, value: Value) -> Result<TypedValue, TvalError> {
    let node = match (target.kind(), value) {
        (SignatureKind::List(element), Value::Array(items)) => Node::List(
            items
                .into_iter()
                .map(|item| lift_json(element, item))
                .collect::<Result<_, _>>()?,
        ),
        (SignatureKind::Tuple(elements), Value::Array(items)) if elements.len() == items.len() => {
            Node::Tuple(
                elements
                    .iter()
                    .zip(items)
                    .map(|(element, item)| lift_json(element, item))
                    .collect::<Result<_, _>>()?,
            )
        }
        (SignatureKind::Record(fields), Value::Object(mut map)) => {
            let mut slots = IndexMap::with_capacity(fields.len());
            for (name, field_sig) in fields {
                let item = map
                    .remove(name)
                    .ok_or_else(|| invariant(&target, "missing field"))?;
                slots.insert(name.clone(), lift_json(field_sig, item)?);
            }
            Node::Record(slots)
        }
        (SignatureKind::Enum(_), selector) => Node::Enum(
            target
                .tag_position(&selector)
                .ok_or_else(|| invariant(&target, "unknown tag"))?,
        ),
        (SignatureKind::Variants(constructors), Value::Array(pair)) => {
            let [selector, payload]: [Value; 2] = pair
                .try_into()
                .map_err(|_| invariant(&target, "not a pair"))?;
            let index = target
                .tag_position(&selector)
                .ok_or_else(|| invariant(&target, "unknown constructor"))?;
            let payload = match constructors.get_index(index) {
                Some((_, Some(payload_sig))) => Some(lift_json(payload_sig, payload)?),
                Some((_, None)) => None,
                None => return Err(invariant(&target, "constructor out of range")),
            };
            Node::Variant { index, payload }
        }
        _ => return Err(invariant(&target, "shape does not match")),
    };
    Ok(TypedValue::from_parts(target, node))
}
