//! # Typed Values and Propagation
//!
//! A [`TypedValue`] pairs a signature with an immutable node. Children read
//! from a composite value carry a trail: the parent snapshot they were read
//! from and the key they occupy there. Nodes never point at their parents,
//! so there are no reference cycles; the trail lives on the handle.
//!
//! ## Propagation
//!
//! Every edit builds a new node for the edited value, then walks the trail:
//! each ancestor is copied with the one slot replaced, up to the root, and
//! the new root is returned. Untouched subtrees are shared by `Arc`, and the
//! original root and every handle along the original path stay valid and
//! unchanged.

use std::fmt;
use std::sync::Arc;

use tracing::trace;
use tval_core::{AccessError, Key, TvalError, ValuePath};
use tval_schema::{TypeRegistry, TypeSignature};

use crate::input::Input;
use crate::lift;
use crate::node::{Node, Slot};

#[derive(Debug)]
struct Trail {
    parent: TypedValue,
    key: Key,
}

/// An immutable value checked against a signature.
///
/// A value built from named types holds their registry, so it can still
/// be decoded, edited and re-adopted after every other handle is dropped.
#[derive(Clone)]
pub struct TypedValue {
    signature: Arc<TypeSignature>,
    node: Arc<Node>,
    trail: Option<Arc<Trail>>,
    registry: Option<TypeRegistry>,
}

/// A child read from a composite value.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Scalar or external-type position, held as raw data.
    Raw(serde_json::Value),
    /// Composite position, linked to the parent it was read from.
    Typed(TypedValue),
}

impl Element {
    /// The raw data at a scalar or external-type position.
    pub fn as_raw(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Raw(value) => Some(value),
            Self::Typed(_) => None,
        }
    }

    /// The child at a composite position.
    pub fn as_typed(&self) -> Option<&TypedValue> {
        match self {
            Self::Raw(_) => None,
            Self::Typed(value) => Some(value),
        }
    }

    /// The typed child.
    ///
    /// # Errors
    ///
    /// `AccessError::WrongKind` for a raw position.
    pub fn into_typed(self) -> Result<TypedValue, TvalError> {
        match self {
            Self::Raw(_) => Err(AccessError::WrongKind {
                operation: "into_typed".to_string(),
                kind: "scalar".to_string(),
            }
            .into()),
            Self::Typed(value) => Ok(value),
        }
    }

    /// Wire form of the child.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Self::Raw(value) => value.clone(),
            Self::Typed(value) => value.to_value(),
        }
    }
}

impl TypedValue {
    /// Validate `input` against `signature` and construct.
    ///
    /// Named-type signatures are resolved first, so the result carries the
    /// structural signature of the named type.
    ///
    /// # Errors
    ///
    /// `TvalError::Validation` with the path of the first mismatch, or
    /// `TvalError::Schema` if a named type cannot be resolved. Nothing is
    /// constructed on failure.
    pub fn new(signature: Arc<TypeSignature>, input: impl Into<Input>) -> Result<Self, TvalError> {
        let value = lift::lift_root(&signature, input.into(), &mut ValuePath::root())?
            .anchored(signature.registry());
        trace!(signature = %value.signature, "typed value constructed");
        Ok(value)
    }

    /// Construct from raw wire-form data.
    pub fn wrap(signature: Arc<TypeSignature>, value: serde_json::Value) -> Result<Self, TvalError> {
        Self::new(signature, Input::Json(value))
    }

    pub(crate) fn from_parts(signature: Arc<TypeSignature>, node: Node) -> Self {
        Self {
            signature,
            node: Arc::new(node),
            trail: None,
            registry: None,
        }
    }

    /// Hold `registry` unless a registry is already held.
    fn anchored(mut self, registry: Option<TypeRegistry>) -> Self {
        if self.registry.is_none() {
            self.registry = registry;
        }
        self
    }

    /// A detached value with this signature and registry around `node`.
    fn rebuilt(&self, node: Node) -> Self {
        Self::from_parts(Arc::clone(&self.signature), node).anchored(self.registry.clone())
    }

    pub(crate) fn node(&self) -> &Node {
        &self.node
    }

    /// The structural signature of this value.
    pub fn signature(&self) -> &Arc<TypeSignature> {
        &self.signature
    }

    /// The registered type name, if the value was built from a named type.
    pub fn type_name(&self) -> Option<&str> {
        self.signature.name()
    }

    pub(crate) fn kind_label(&self) -> &'static str {
        self.signature.kind().label()
    }

    pub(crate) fn wrong_kind(&self, operation: &str) -> TvalError {
        AccessError::WrongKind {
            operation: operation.to_string(),
            kind: self.kind_label().to_string(),
        }
        .into()
    }

    /// This value with no trail.
    pub(crate) fn detached(&self) -> Self {
        Self {
            signature: Arc::clone(&self.signature),
            node: Arc::clone(&self.node),
            trail: None,
            registry: self.registry.clone(),
        }
    }

    fn attached(&self, parent: &TypedValue, key: Key) -> Self {
        Self {
            signature: Arc::clone(&self.signature),
            node: Arc::clone(&self.node),
            trail: Some(Arc::new(Trail {
                parent: parent.clone(),
                key,
            })),
            registry: self.registry.clone().or_else(|| parent.registry.clone()),
        }
    }

    // -- navigation ------------------------------------------------------

    pub(crate) fn slot(&self, key: &Key) -> Result<&Slot, TvalError> {
        match (&*self.node, key) {
            (Node::List(items) | Node::Tuple(items), Key::Index(i)) => {
                items.get(*i).ok_or_else(|| {
                    AccessError::UndefinedIndex {
                        index: *i,
                        len: items.len(),
                    }
                    .into()
                })
            }
            (Node::Record(fields), Key::Field(name)) => fields
                .get(name)
                .ok_or_else(|| AccessError::UndefinedField(name.clone()).into()),
            (Node::List(_) | Node::Tuple(_), Key::Field(_)) => Err(AccessError::KeyKind {
                kind: self.kind_label().to_string(),
                expected: "index".to_string(),
            }
            .into()),
            (Node::Record(_), Key::Index(_)) => Err(AccessError::KeyKind {
                kind: self.kind_label().to_string(),
                expected: "field name".to_string(),
            }
            .into()),
            (Node::Variant { index, payload }, Key::Index(1)) => payload.as_ref().ok_or_else(|| {
                let name = self
                    .signature
                    .tag_names()
                    .get(*index)
                    .map_or_else(String::new, |n| n.to_string());
                AccessError::NoPayload(name).into()
            }),
            _ => Err(self.wrong_kind("get")),
        }
    }

    pub(crate) fn element(&self, slot: &Slot, key: Key) -> Element {
        match slot {
            Slot::Raw(value) => Element::Raw(value.clone()),
            Slot::Typed(child) => Element::Typed(child.attached(self, key)),
        }
    }

    /// The child at `key`: a position of a list or tuple, a record field,
    /// or `1` for the payload of a tagged union.
    ///
    /// # Errors
    ///
    /// `AccessError` for an undefined position or field, a key of the
    /// wrong kind, or a value kind with no children.
    pub fn get(&self, key: impl Into<Key>) -> Result<Element, TvalError> {
        let key = key.into();
        let slot = self.slot(&key)?;
        Ok(self.element(slot, key))
    }

    /// The record field `name`.
    pub fn field(&self, name: &str) -> Result<Element, TvalError> {
        self.get(Key::from(name))
    }

    /// Descend along `path`.
    pub fn at(&self, path: &ValuePath) -> Result<Element, TvalError> {
        let mut current = Element::Typed(self.clone());
        for key in path.keys() {
            current = match current {
                Element::Typed(value) => value.get(key.clone())?,
                Element::Raw(_) => {
                    return Err(AccessError::WrongKind {
                        operation: "at".to_string(),
                        kind: "scalar".to_string(),
                    }
                    .into())
                }
            };
        }
        Ok(current)
    }

    /// Whether `key` addresses a defined position or declared field.
    ///
    /// # Errors
    ///
    /// `AccessError::KeyKind` for a positional key on a record or a named
    /// key on a sequence, `AccessError::WrongKind` for non-collections.
    pub fn contains(&self, key: impl Into<Key>) -> Result<bool, TvalError> {
        match self.slot(&key.into()) {
            Ok(_) => Ok(true),
            Err(TvalError::Access(
                AccessError::UndefinedIndex { .. }
                | AccessError::UndefinedField(_)
                | AccessError::NoPayload(_),
            )) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Number of elements or fields.
    pub fn len(&self) -> Result<usize, TvalError> {
        match &*self.node {
            Node::List(items) | Node::Tuple(items) => Ok(items.len()),
            Node::Record(fields) => Ok(fields.len()),
            _ => Err(self.wrong_kind("len")),
        }
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> Result<bool, TvalError> {
        self.len().map(|len| len == 0)
    }

    /// Keys of every element or field, in order.
    pub fn keys(&self) -> Result<Vec<Key>, TvalError> {
        match &*self.node {
            Node::List(items) | Node::Tuple(items) => Ok((0..items.len()).map(Key::Index).collect()),
            Node::Record(fields) => Ok(fields.keys().cloned().map(Key::Field).collect()),
            _ => Err(self.wrong_kind("keys")),
        }
    }

    /// Iterate `(key, child)` pairs in order.
    pub fn iter(&self) -> Result<Iter<'_>, TvalError> {
        Ok(Iter {
            value: self,
            keys: self.keys()?.into_iter(),
        })
    }

    /// Path from the root this value was read from.
    pub fn path(&self) -> ValuePath {
        let mut keys = Vec::new();
        let mut current = self;
        while let Some(trail) = &current.trail {
            keys.push(trail.key.clone());
            current = &trail.parent;
        }
        keys.reverse();
        keys.into_iter().collect()
    }

    /// Whether this value was not read from a parent.
    pub fn is_root(&self) -> bool {
        self.trail.is_none()
    }

    /// The snapshot this value was read from.
    pub fn parent(&self) -> Option<&TypedValue> {
        self.trail.as_ref().map(|trail| &trail.parent)
    }

    /// The outermost snapshot on the trail.
    pub fn root(&self) -> &TypedValue {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    // -- propagation -----------------------------------------------------

    /// A detached copy of this value with one existing slot replaced.
    pub(crate) fn with_slot(&self, key: &Key, slot: Slot) -> Result<TypedValue, TvalError> {
        self.slot(key)?;
        let mut node = (*self.node).clone();
        if !node.set(key, slot) {
            return Err(TvalError::Construction(format!(
                "slot {key} vanished from a {} value",
                self.kind_label()
            )));
        }
        Ok(self.rebuilt(node))
    }

    /// Rebuild every ancestor around `replacement` and return the new root.
    pub(crate) fn propagate(&self, replacement: TypedValue) -> Result<TypedValue, TvalError> {
        match &self.trail {
            None => Ok(replacement),
            Some(trail) => {
                trace!(key = %trail.key, parent = %trail.parent.signature, "propagating edit");
                let parent = trail.parent.with_slot(&trail.key, Slot::Typed(replacement))?;
                trail.parent.propagate(parent)
            }
        }
    }

    /// Replace this value's node and return the new root.
    pub(crate) fn commit(&self, node: Node) -> Result<TypedValue, TvalError> {
        self.propagate(self.rebuilt(node))
    }

    /// Replace the whole value, validating `input` against this value's
    /// signature, and return the new root.
    pub fn replace(&self, input: impl Into<Input>) -> Result<TypedValue, TvalError> {
        let fresh = lift::lift_root(&self.signature, input.into(), &mut self.path())?
            .anchored(self.registry.clone());
        self.propagate(fresh)
    }
}

/// Iterator over the children of a list, tuple or record.
pub struct Iter<'a> {
    value: &'a TypedValue,
    keys: std::vec::IntoIter<Key>,
}

impl Iterator for Iter<'_> {
    type Item = (Key, Element);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.next()?;
        let slot = self.value.slot(&key).ok()?;
        Some((key.clone(), self.value.element(slot, key)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedValue")
            .field("signature", &format_args!("{}", self.signature))
            .field("path", &format_args!("{}", self.path()))
            .field("value", &format_args!("{}", self.to_value()))
            .finish()
    }
}

/// Compact wire form.
impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
