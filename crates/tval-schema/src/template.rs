//! # Generic Templates
//!
//! A template pairs a name pattern such as `Either{a}Or{b}` with a
//! declaration written in terms of the parameters `a`..`h`. When a concrete
//! name like `EitherStringOrUser` is first referenced, the pattern is
//! matched against it and each captured argument becomes a binding:
//! `Int`, `Float`, `String` and `Bool` bind the scalar keywords, anything
//! else binds a reference to the named type.
//!
//! Patterns compile to anchored regexes with one greedy `\S+` group per
//! placeholder, so `Either{a}Or{b}` splits `EitherStringOrInt` into
//! `String` and `Int`.

use regex::Regex;
use serde_json::{json, Value};
use tval_core::SchemaError;

use crate::declaration::PARAMETERS;

/// A compiled name pattern and its parameterized declaration.
#[derive(Debug, Clone)]
pub(crate) struct Template {
    pattern: String,
    regex: Regex,
    params: Vec<char>,
    declaration: Value,
}

impl Template {
    pub(crate) fn compile(pattern: &str, declaration: Value) -> Result<Self, SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidTemplate {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut source = String::from("^");
        let mut literal = String::new();
        let mut has_literal = false;
        let mut params = Vec::new();
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let param = chars
                        .next()
                        .filter(|p| PARAMETERS.contains(p))
                        .ok_or_else(|| invalid("placeholders are single letters a to h"))?;
                    if chars.next() != Some('}') {
                        return Err(invalid("unterminated placeholder"));
                    }
                    if params.contains(&param) {
                        return Err(invalid("placeholder used more than once"));
                    }
                    source.push_str(&regex::escape(&literal));
                    literal.clear();
                    source.push_str(&format!(r"(?P<{param}>\S+)"));
                    params.push(param);
                }
                '}' => return Err(invalid("unbalanced '}'")),
                c if c.is_whitespace() => return Err(invalid("patterns cannot contain whitespace")),
                c => {
                    has_literal = true;
                    literal.push(c);
                }
            }
        }
        source.push_str(&regex::escape(&literal));
        source.push('$');

        if params.is_empty() {
            return Err(invalid("no placeholders"));
        }
        if !has_literal {
            return Err(invalid("no literal text"));
        }
        let regex = Regex::new(&source).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            params,
            declaration,
        })
    }

    pub(crate) fn pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn declaration(&self) -> &Value {
        &self.declaration
    }

    /// Arguments captured from a concrete name, in placeholder order.
    pub(crate) fn captures(&self, name: &str) -> Option<Vec<(char, String)>> {
        let caps = self.regex.captures(name)?;
        self.params
            .iter()
            .map(|p| {
                caps.name(&p.to_string())
                    .map(|m| (*p, m.as_str().to_string()))
            })
            .collect()
    }
}

/// Declaration bound for a captured argument.
pub(crate) fn argument_declaration(arg: &str) -> Value {
    match arg {
        "Int" => json!("int"),
        "Float" => json!("float"),
        "String" => json!("string"),
        "Bool" => json!("bool"),
        other => json!(other),
    }
}

/// Whether a captured argument names a scalar.
pub(crate) fn is_scalar_argument(arg: &str) -> bool {
    matches!(arg, "Int" | "Float" | "String" | "Bool")
}

/// Templates every registry starts with unless built empty.
pub(crate) fn builtin_templates() -> Vec<(&'static str, Value)> {
    vec![
        ("ListOf{a}", json!(["a"])),
        ("Maybe{a}", json!({ ":Just": "a", ":Nothing": null })),
        ("Either{a}Or{b}", json!({ ":Left": "a", ":Right": "b" })),
    ]
}
