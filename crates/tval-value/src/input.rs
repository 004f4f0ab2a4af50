//! Construction input.
//!
//! An [`Input`] is raw JSON, an already-typed value, or a sequence or
//! mapping whose positions may mix the two. Raw positions are validated
//! against the signature at that position; typed positions whose signature
//! matches are adopted as they are.

use serde_json::Value;

use crate::value::{Element, TypedValue};

/// Data to construct a typed value from.
#[derive(Debug, Clone)]
pub enum Input {
    /// Raw wire-form data.
    Json(Value),
    /// An already-constructed value.
    Typed(TypedValue),
    /// A sequence (list, tuple or `[constructor, payload]` pair).
    Seq(Vec<Input>),
    /// A mapping of field names to inputs.
    Map(Vec<(String, Input)>),
}

impl Input {
    /// A sequence input.
    pub fn seq<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        Self::Seq(items.into_iter().map(Into::into).collect())
    }

    /// A mapping input.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Input)>,
        K: Into<String>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// The JSON null, as the payload of a constructor that carries none.
    pub fn null() -> Self {
        Self::Json(Value::Null)
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<TypedValue> for Input {
    fn from(value: TypedValue) -> Self {
        Self::Typed(value)
    }
}

impl From<&TypedValue> for Input {
    fn from(value: &TypedValue) -> Self {
        Self::Typed(value.clone())
    }
}

impl From<Element> for Input {
    fn from(element: Element) -> Self {
        match element {
            Element::Raw(value) => Self::Json(value),
            Element::Typed(value) => Self::Typed(value),
        }
    }
}

impl From<Vec<Input>> for Input {
    fn from(items: Vec<Input>) -> Self {
        Self::Seq(items)
    }
}

macro_rules! json_input {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Input {
                fn from(value: $t) -> Self {
                    Self::Json(Value::from(value))
                }
            }
        )*
    };
}

json_input!(bool, i32, i64, u32, u64, usize, f64, &str, String);
