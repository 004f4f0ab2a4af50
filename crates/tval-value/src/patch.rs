//! Positional and named replacement for lists, tuples and records.

use std::sync::Arc;

use tval_core::{Key, TvalError};
use tval_schema::{SignatureKind, TypeSignature};

use crate::input::Input;
use crate::lift::lift_input;
use crate::value::TypedValue;

impl TypedValue {
    /// Signature of an existing position, for replacement.
    fn position_signature(&self, key: &Key) -> Result<Arc<TypeSignature>, TvalError> {
        // Lookup reports undefined positions and keys of the wrong kind.
        self.slot(key)?;
        let sig = match (self.signature().kind(), key) {
            (SignatureKind::List(element), Key::Index(_)) => Some(element),
            (SignatureKind::Tuple(elements), Key::Index(i)) => elements.get(*i),
            (SignatureKind::Record(fields), Key::Field(name)) => fields.get(name),
            _ => None,
        };
        sig.cloned().ok_or_else(|| self.wrong_kind("with"))
    }

    /// Replace existing elements or fields.
    ///
    /// Keys are list or tuple positions, or record field names. A list
    /// cannot grow this way (use [`splice`](Self::splice)), a tuple's arity
    /// never changes, and a record's field set is fixed.
    ///
    /// # Errors
    ///
    /// `AccessError::UndefinedIndex` or `AccessError::UndefinedField` for a
    /// key that does not exist, `AccessError::KeyKind` for a key of the
    /// wrong kind, `AccessError::WrongKind` on enums, tagged unions and
    /// scalars, and `TvalError::Validation` for a replacement that does not
    /// match its position.
    pub fn with<I, K, V>(&self, patch: I) -> Result<TypedValue, TvalError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Input>,
    {
        if !(self.signature().is_list() || self.signature().is_tuple() || self.signature().is_record()) {
            return Err(self.wrong_kind("with"));
        }
        let base = self.path();
        let mut node = self.node().clone();
        for (key, value) in patch {
            let key = key.into();
            let sig = self.position_signature(&key)?;
            let slot = lift_input(&sig, value.into(), &mut base.child(key.clone()))?;
            if !node.set(&key, slot) {
                return Err(TvalError::Construction(format!(
                    "slot {key} vanished from a {} value",
                    self.kind_label()
                )));
            }
        }
        self.commit(node)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tval_core::AccessError;
    use tval_schema::TypeRegistry;

    use super::*;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry
            .define("User", json!({"id": "int", "name": "string"}))
            .unwrap();
        registry
    }

    #[test]
    fn record_with_replaces_fields() {
        let registry = registry();
        let user = TypedValue::wrap(
            registry.signature("User").unwrap(),
            json!({"id": 1, "name": "John"}),
        )
        .unwrap();
        let renamed = user.with([("name", "Jane")]).unwrap();
        assert_eq!(renamed.to_value(), json!({"id": 1, "name": "Jane"}));
        assert_eq!(user.to_value(), json!({"id": 1, "name": "John"}));
    }

    #[test]
    fn record_with_unknown_field() {
        let registry = registry();
        let user = TypedValue::wrap(
            registry.signature("User").unwrap(),
            json!({"id": 1, "name": "John"}),
        )
        .unwrap();
        assert!(matches!(
            user.with([("email", "j@x")]),
            Err(TvalError::Access(AccessError::UndefinedField(ref f))) if f == "email"
        ));
        assert!(matches!(
            user.with([(0usize, 5)]),
            Err(TvalError::Access(AccessError::KeyKind { .. }))
        ));
    }

    #[test]
    fn record_with_validates_replacement() {
        let registry = registry();
        let user = TypedValue::wrap(
            registry.signature("User").unwrap(),
            json!({"id": 1, "name": "John"}),
        )
        .unwrap();
        let err = user.with([("id", 1.5)]).unwrap_err();
        let v = err.as_validation().unwrap();
        assert_eq!(v.path.to_string(), "id");
        assert_eq!(v.expected, "an integer");
    }

    #[test]
    fn tuple_with_never_grows() {
        let sig = registry().build(&json!(["int", "string"])).unwrap();
        let pair = TypedValue::wrap(sig, json!([1, "a"])).unwrap();
        assert_eq!(pair.with([(1usize, "b")]).unwrap().to_value(), json!([1, "b"]));
        assert!(matches!(
            pair.with([(2usize, "c")]),
            Err(TvalError::Access(AccessError::UndefinedIndex { index: 2, len: 2 }))
        ));
    }

    #[test]
    fn list_with_only_existing_indices() {
        let sig = registry().build(&json!(["int"])).unwrap();
        let list = TypedValue::wrap(sig, json!([1, 2, 3])).unwrap();
        assert_eq!(
            list.with([(0usize, 10), (2usize, 30)]).unwrap().to_value(),
            json!([10, 2, 30])
        );
        assert!(matches!(
            list.with([(3usize, 4)]),
            Err(TvalError::Access(AccessError::UndefinedIndex { index: 3, len: 3 }))
        ));
    }

    #[test]
    fn with_on_enum_is_wrong_kind() {
        let sig = registry().build(&json!([":A", ":B"])).unwrap();
        let tag = TypedValue::wrap(sig, json!("A")).unwrap();
        assert!(matches!(
            tag.with([(0usize, 1)]),
            Err(TvalError::Access(AccessError::WrongKind { .. }))
        ));
    }
}
