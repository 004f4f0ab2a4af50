//! # Value Paths and Shape Descriptions
//!
//! [`Key`] addresses one slot of a composite value (a position or a field
//! name). [`ValuePath`] is a sequence of keys from some root, rendered in
//! dotted/bracketed form: `items[2].name`. The empty path renders as
//! `(root)`.
//!
//! [`describe_value`] produces the "actual shape" half of a validation
//! error from a raw JSON value.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest string literal quoted verbatim in a shape description.
const MAX_QUOTED_LEN: usize = 32;

/// One step into a composite value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Position in a list, a tuple or a `[tag, payload]` pair.
    Index(usize),
    /// Field of a record.
    Field(String),
}

impl Key {
    /// The position, if this is a positional key.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Field(_) => None,
        }
    }

    /// The field name, if this is a named key.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Index(_) => None,
            Self::Field(name) => Some(name),
        }
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Field(name) => f.write_str(name),
        }
    }
}

/// Path from a root value to a nested node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuePath(Vec<Key>);

impl ValuePath {
    /// The empty path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A new path extended by `key`.
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Self(keys)
    }

    /// Extend this path in place.
    pub fn push(&mut self, key: impl Into<Key>) {
        self.0.push(key.into());
    }

    /// Drop the last key.
    pub fn pop(&mut self) -> Option<Key> {
        self.0.pop()
    }

    /// The keys, outermost first.
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// Whether this is the empty path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Same as [`is_root`](Self::is_root).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Concatenate `suffix` onto this path.
    pub fn join(&self, suffix: &ValuePath) -> Self {
        let mut keys = self.0.clone();
        keys.extend(suffix.0.iter().cloned());
        Self(keys)
    }
}

impl From<Vec<Key>> for ValuePath {
    fn from(keys: Vec<Key>) -> Self {
        Self(keys)
    }
}

impl FromIterator<Key> for ValuePath {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, key) in self.0.iter().enumerate() {
            match key {
                Key::Index(_) => write!(f, "{key}")?,
                Key::Field(_) if i == 0 => write!(f, "{key}")?,
                Key::Field(_) => write!(f, ".{key}")?,
            }
        }
        Ok(())
    }
}

/// Describe the shape of a raw value for a mismatch report.
pub fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("a boolean ({b})"),
        Value::Number(n) if n.is_i64() || n.is_u64() => format!("an integer ({n})"),
        Value::Number(n) => format!("a float ({n})"),
        Value::String(s) if s.chars().count() > MAX_QUOTED_LEN => {
            let head: String = s.chars().take(MAX_QUOTED_LEN).collect();
            format!("a string (\"{head}...\")")
        }
        Value::String(s) => format!("a string (\"{s}\")"),
        Value::Array(items) if items.len() == 1 => "an array of 1 element".to_string(),
        Value::Array(items) => format!("an array of {} elements", items.len()),
        Value::Object(map) if map.is_empty() => "an empty object".to_string(),
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("an object with keys ({})", keys.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_path_renders_as_root() {
        assert_eq!(ValuePath::root().to_string(), "(root)");
    }

    #[test]
    fn mixed_path_renders_dotted_and_bracketed() {
        let path = ValuePath::root()
            .child("items")
            .child(2usize)
            .child("name");
        assert_eq!(path.to_string(), "items[2].name");

        let path = ValuePath::root().child(0usize).child(1usize).child("x");
        assert_eq!(path.to_string(), "[0][1].x");
    }

    #[test]
    fn push_pop_and_join() {
        let mut path = ValuePath::root();
        path.push("a");
        path.push(3usize);
        assert_eq!(path.len(), 2);
        assert_eq!(path.pop(), Some(Key::Index(3)));
        let joined = path.join(&ValuePath::from(vec![Key::from("b")]));
        assert_eq!(joined.to_string(), "a.b");
    }

    #[test]
    fn describe_distinguishes_integers_and_floats() {
        assert_eq!(describe_value(&json!(5)), "an integer (5)");
        assert_eq!(describe_value(&json!(123.5)), "a float (123.5)");
        assert_eq!(describe_value(&json!(null)), "null");
        assert_eq!(describe_value(&json!(true)), "a boolean (true)");
    }

    #[test]
    fn describe_composites() {
        assert_eq!(describe_value(&json!([1])), "an array of 1 element");
        assert_eq!(describe_value(&json!([1, 2, 3])), "an array of 3 elements");
        assert_eq!(describe_value(&json!({})), "an empty object");
        assert_eq!(
            describe_value(&json!({"id": 1, "name": "x"})),
            "an object with keys (id, name)"
        );
    }

    #[test]
    fn describe_truncates_long_strings() {
        let long = "x".repeat(100);
        let described = describe_value(&json!(long));
        assert!(described.ends_with("...\")"));
        assert!(described.len() < 60);
    }

    #[test]
    fn key_accessors() {
        assert_eq!(Key::from(4usize).as_index(), Some(4));
        assert_eq!(Key::from("id").as_field(), Some("id"));
        assert_eq!(Key::from("id").as_index(), None);
    }
}
