//! Internal representation of a typed value.
//!
//! Nodes are immutable once built and shared through `Arc`. A slot holds
//! either raw data (scalar and external positions) or a child
//! [`TypedValue`] stored without a trail; trails are attached on access.

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tval_core::Key;

use crate::value::TypedValue;

#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Raw(Value),
    Typed(TypedValue),
}

impl Slot {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Self::Raw(value) => value.clone(),
            Self::Typed(value) => value.to_value(),
        }
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Raw(value) => value.serialize(serializer),
            Self::Typed(value) => value.node().serialize(serializer),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    /// Root scalar or root external value.
    Scalar(Value),
    List(Vec<Slot>),
    Tuple(Vec<Slot>),
    /// Fields in declaration order.
    Record(IndexMap<String, Slot>),
    Enum(usize),
    Variant {
        index: usize,
        payload: Option<Slot>,
    },
}

impl Node {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::List(items) | Self::Tuple(items) => {
                Value::Array(items.iter().map(Slot::to_value).collect())
            }
            Self::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, slot)| (name.clone(), slot.to_value()))
                    .collect(),
            ),
            Self::Enum(index) => Value::from(*index),
            Self::Variant { index, payload } => Value::Array(vec![
                Value::from(*index),
                payload.as_ref().map_or(Value::Null, Slot::to_value),
            ]),
        }
    }

    /// Overwrite an existing slot. The key must already be in range.
    pub(crate) fn set(&mut self, key: &Key, slot: Slot) -> bool {
        match (self, key) {
            (Self::List(items) | Self::Tuple(items), Key::Index(i)) => match items.get_mut(*i) {
                Some(existing) => {
                    *existing = slot;
                    true
                }
                None => false,
            },
            (Self::Record(fields), Key::Field(name)) => match fields.get_mut(name) {
                Some(existing) => {
                    *existing = slot;
                    true
                }
                None => false,
            },
            (Self::Variant { payload: Some(existing), .. }, Key::Index(1)) => {
                *existing = slot;
                true
            }
            _ => false,
        }
    }
}

/// Serializes the wire form directly, without building a `Value` first.
impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(value) => value.serialize(serializer),
            Self::List(items) | Self::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, slot) in fields {
                    map.serialize_entry(name, slot)?;
                }
                map.end()
            }
            Self::Enum(index) => serializer.serialize_u64(*index as u64),
            Self::Variant { index, payload } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(index)?;
                seq.serialize_element(payload)?;
                seq.end()
            }
        }
    }
}
