//! # Validation
//!
//! Deep check of a raw value against a [`TypeSignature`]. The first
//! mismatch found is reported with its path from the validation root, the
//! expected shape and the actual shape. Named-type references are resolved
//! through their registry as they are reached, so recursive declarations
//! are checked to the depth of the data and no further.

use serde_json::Value;
use tval_core::{describe_value, TvalError, ValidationError, ValuePath};

use crate::signature::{Resolved, SignatureKind, TypeSignature};

fn mismatch(path: &ValuePath, expected: impl Into<String>, actual: &Value) -> TvalError {
    ValidationError::new(path.clone(), expected, describe_value(actual)).into()
}

impl TypeSignature {
    /// Check `value` against this signature.
    ///
    /// # Errors
    ///
    /// `TvalError::Validation` on the first mismatch, or `TvalError::Schema`
    /// when a named-type reference cannot be resolved.
    pub fn check(&self, value: &Value) -> Result<(), TvalError> {
        let mut path = ValuePath::root();
        self.check_in(value, &mut path)
    }

    /// Like [`check`](Self::check), reporting paths relative to `base`.
    pub fn check_at(&self, value: &Value, base: &ValuePath) -> Result<(), TvalError> {
        let mut path = base.clone();
        self.check_in(value, &mut path)
    }

    /// Description of the shape this signature accepts at its top level.
    pub fn expected(&self) -> String {
        match self.kind() {
            SignatureKind::Scalar(s) => s.expected().to_string(),
            SignatureKind::Class(c) => format!("a value of type {}", c.name()),
            SignatureKind::List(_) => "an array".to_string(),
            SignatureKind::Tuple(es) if es.len() == 1 => "an array of 1 element".to_string(),
            SignatureKind::Tuple(es) => format!("an array of {} elements", es.len()),
            SignatureKind::Record(fields) => {
                let names: Vec<&str> = fields.keys().map(String::as_str).collect();
                format!("an object with keys ({})", names.join(", "))
            }
            SignatureKind::Enum(_) => self.selector_expected(),
            SignatureKind::Variants(_) => "a [constructor, payload] pair".to_string(),
        }
    }

    /// Description of an acceptable enum tag or variants constructor selector.
    pub fn selector_expected(&self) -> String {
        let names = self.tag_names();
        format!(
            "one of ({}) or an index from 0 to {}",
            names.join(", "),
            names.len().saturating_sub(1)
        )
    }

    fn check_in(&self, value: &Value, path: &mut ValuePath) -> Result<(), TvalError> {
        match self.kind() {
            SignatureKind::Scalar(s) => {
                if s.accepts(value) {
                    Ok(())
                } else {
                    Err(mismatch(path, s.expected(), value))
                }
            }
            SignatureKind::Class(class) => match class.dereference()? {
                Resolved::Declared(sig) => sig.check_in(value, path),
                Resolved::External(external) => {
                    if external.accepts(value) {
                        Ok(())
                    } else {
                        Err(mismatch(path, external.describe(), value))
                    }
                }
            },
            SignatureKind::List(element) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| mismatch(path, self.expected(), value))?;
                for (i, item) in items.iter().enumerate() {
                    path.push(i);
                    element.check_in(item, path)?;
                    path.pop();
                }
                Ok(())
            }
            SignatureKind::Tuple(elements) => {
                let items = value
                    .as_array()
                    .filter(|items| items.len() == elements.len())
                    .ok_or_else(|| mismatch(path, self.expected(), value))?;
                for (i, (sig, item)) in elements.iter().zip(items).enumerate() {
                    path.push(i);
                    sig.check_in(item, path)?;
                    path.pop();
                }
                Ok(())
            }
            SignatureKind::Record(fields) => {
                let map = value
                    .as_object()
                    .filter(|map| {
                        map.len() == fields.len() && fields.keys().all(|f| map.contains_key(f))
                    })
                    .ok_or_else(|| mismatch(path, self.expected(), value))?;
                for (name, sig) in fields {
                    if let Some(field) = map.get(name) {
                        path.push(name.as_str());
                        sig.check_in(field, path)?;
                        path.pop();
                    }
                }
                Ok(())
            }
            SignatureKind::Enum(_) => match self.tag_position(value) {
                Some(_) => Ok(()),
                None => Err(mismatch(path, self.selector_expected(), value)),
            },
            SignatureKind::Variants(constructors) => {
                let pair = value
                    .as_array()
                    .filter(|pair| pair.len() == 2)
                    .ok_or_else(|| mismatch(path, self.expected(), value))?;
                let (selector, payload) = (&pair[0], &pair[1]);
                let Some(index) = self.tag_position(selector) else {
                    path.push(0usize);
                    return Err(mismatch(path, self.selector_expected(), selector));
                };
                path.push(1usize);
                match constructors.get_index(index) {
                    Some((_, Some(sig))) => sig.check_in(payload, path)?,
                    Some((name, None)) if !payload.is_null() => {
                        return Err(mismatch(
                            path,
                            format!("null, since \"{name}\" carries no payload"),
                            payload,
                        ));
                    }
                    _ => {}
                }
                path.pop();
                Ok(())
            }
        }
    }
}
