//! Enums and tagged unions.
//!
//! Pattern tests are total over the declared names: asking about a name
//! that was never declared is an [`AccessError::UndeclaredTag`], not
//! `false`. Payload access separates three failures: an undeclared
//! constructor (`AccessError::UndeclaredTag`), a declared but inactive one
//! ([`StateMismatchError`]), and an active one without a payload
//! (`AccessError::NoPayload`).

use std::sync::Arc;

use serde_json::Value;
use tval_core::{AccessError, Key, StateMismatchError, TvalError};
use tval_schema::TypeSignature;

use crate::input::Input;
use crate::node::Node;
use crate::value::{Element, TypedValue};

impl TypedValue {
    /// Construct an enum value from a tag name.
    pub fn tag(signature: Arc<TypeSignature>, name: &str) -> Result<Self, TvalError> {
        Self::new(signature, Input::Json(Value::from(name)))
    }

    /// Construct a tagged-union value. Pass [`Input::null()`] for a
    /// constructor without a payload.
    pub fn variant(
        signature: Arc<TypeSignature>,
        constructor: &str,
        payload: impl Into<Input>,
    ) -> Result<Self, TvalError> {
        Self::new(
            signature,
            Input::Seq(vec![Input::Json(Value::from(constructor)), payload.into()]),
        )
    }

    /// Index of the selected tag or constructor.
    pub fn index(&self) -> Result<usize, TvalError> {
        match self.node() {
            Node::Enum(index) | Node::Variant { index, .. } => Ok(*index),
            _ => Err(self.wrong_kind("index")),
        }
    }

    /// Name of the selected enum tag.
    pub fn tag_name(&self) -> Result<&str, TvalError> {
        match (self.node(), self.signature().tags()) {
            (Node::Enum(index), Some(tags)) => tags
                .get(*index)
                .map(String::as_str)
                .ok_or_else(|| self.wrong_kind("tag_name")),
            _ => Err(self.wrong_kind("tag_name")),
        }
    }

    /// Name of the selected constructor.
    pub fn constructor(&self) -> Result<&str, TvalError> {
        match (self.node(), self.signature().constructors()) {
            (Node::Variant { index, .. }, Some(ctors)) => ctors
                .get_index(*index)
                .map(|(name, _)| name.as_str())
                .ok_or_else(|| self.wrong_kind("constructor")),
            _ => Err(self.wrong_kind("constructor")),
        }
    }

    fn declared_index(&self, name: &str, operation: &str) -> Result<usize, TvalError> {
        if !(self.signature().is_enum() || self.signature().is_variants()) {
            return Err(self.wrong_kind(operation));
        }
        self.signature().tag_index(name).ok_or_else(|| {
            AccessError::UndeclaredTag {
                tag: name.to_string(),
                declared: self.signature().tag_names().join(", "),
            }
            .into()
        })
    }

    /// Whether the selected tag or constructor is `name`.
    ///
    /// # Errors
    ///
    /// `AccessError::UndeclaredTag` if `name` is not declared.
    pub fn matches(&self, name: &str) -> Result<bool, TvalError> {
        let wanted = self.declared_index(name, "matches")?;
        Ok(self.index()? == wanted)
    }

    /// The payload, provided `constructor` is the selected one.
    ///
    /// # Errors
    ///
    /// `AccessError::UndeclaredTag` for an undeclared constructor,
    /// `StateMismatchError` when another constructor is selected,
    /// `AccessError::NoPayload` when the selected constructor carries none.
    pub fn payload(&self, constructor: &str) -> Result<Element, TvalError> {
        if !self.signature().is_variants() {
            return Err(self.wrong_kind("payload"));
        }
        let wanted = self.declared_index(constructor, "payload")?;
        if self.index()? != wanted {
            return Err(StateMismatchError {
                requested: constructor.to_string(),
                active: self.constructor()?.to_string(),
            }
            .into());
        }
        self.get(Key::Index(1))
    }
}
