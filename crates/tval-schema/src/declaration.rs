//! # Declaration Syntax
//!
//! A declaration is a plain JSON-like value describing a shape:
//!
//! ```text
//! "int" | "float" | "string" | "bool"     scalar
//! "User"                                 reference to a named type
//! [T]                                    list of T
//! [T1, T2, ...]                          tuple
//! [":A", ":B", ...]                      enum (every entry tag-marked)
//! {"id": T, "name": U}                   record
//! {":Just": T, ":Nothing": null}         variants (every key tag-marked)
//! ```
//!
//! Single-letter strings `a`..`h` are template parameters, replaced from a
//! [`Bindings`] table before the declaration is dispatched.

use std::collections::BTreeMap;

use serde_json::Value;
use tval_core::SchemaError;

/// Prefix that marks an enum tag or a variants constructor.
pub const TAG_MARKER: char = ':';

/// Scalar keywords, in declaration spelling.
pub const SCALAR_KEYWORDS: [&str; 4] = ["int", "float", "string", "bool"];

/// Template parameter names.
pub const PARAMETERS: std::ops::RangeInclusive<char> = 'a'..='h';

/// The tag name of a tag-marked string, without its marker.
///
/// A lone marker is not a tag.
pub fn tag_name(entry: &str) -> Option<&str> {
    entry
        .strip_prefix(TAG_MARKER)
        .filter(|rest| !rest.is_empty())
}

/// The name a tag-marked string declares: the marker stripped and the
/// first letter upper-cased, so `:red` declares `Red`.
pub fn declared_tag(entry: &str) -> Option<String> {
    let mut chars = tag_name(entry)?.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// Whether `value` is a tag-marked string.
pub fn is_tag(value: &Value) -> bool {
    value.as_str().and_then(tag_name).is_some()
}

/// Whether `name` is a template parameter.
pub fn is_parameter(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if PARAMETERS.contains(&c))
}

/// Check that `name` can be registered as a type.
///
/// Type names start with an ASCII letter or `_`, contain no whitespace and
/// no braces, and may not shadow a scalar keyword or a parameter.
pub fn validate_type_name(name: &str) -> Result<(), SchemaError> {
    let first_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let body_ok = name
        .chars()
        .all(|c| !c.is_whitespace() && c != '{' && c != '}' && c != TAG_MARKER);
    if !first_ok || !body_ok || SCALAR_KEYWORDS.contains(&name) || is_parameter(name) {
        return Err(SchemaError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Substitution table for template parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(BTreeMap<char, Value>);

impl Bindings {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `param` to a declaration.
    ///
    /// # Errors
    ///
    /// `SchemaError::InvalidName` if `param` is not one of `a`..`h`.
    pub fn bind(&mut self, param: char, declaration: Value) -> Result<(), SchemaError> {
        if !PARAMETERS.contains(&param) {
            return Err(SchemaError::InvalidName(param.to_string()));
        }
        self.0.insert(param, declaration);
        Ok(())
    }

    /// Builder-style [`bind`](Self::bind).
    pub fn with(mut self, param: char, declaration: Value) -> Result<Self, SchemaError> {
        self.bind(param, declaration)?;
        Ok(self)
    }

    /// The declaration bound to a parameter string, if `name` is a bound parameter.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        if !is_parameter(name) {
            return None;
        }
        name.chars().next().and_then(|c| self.0.get(&c))
    }

    /// Whether no parameter is bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace `declaration` by its binding when it is a bound parameter.
    pub fn substitute<'a>(&'a self, declaration: &'a Value) -> &'a Value {
        declaration
            .as_str()
            .and_then(|s| self.lookup(s))
            .unwrap_or(declaration)
    }
}
