//! # Wire Codec and Equality
//!
//! The wire form of a value is plain JSON: lists and tuples as arrays,
//! records as objects with exactly the declared keys, enums as the tag
//! index, tagged unions as `[index, payload-or-null]`, and named types
//! inline as their own wire form.
//!
//! [`TypedValue::encode`] emits the JCS canonical text, so the output is
//! stable however the value was built. Two values are equal when their
//! signatures have the same digest and their canonical bytes match.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use tval_core::{sha256_digest, CanonicalBytes, CodecError, ContentDigest, TvalError};
use tval_schema::TypeSignature;

use crate::input::Input;
use crate::value::TypedValue;

impl TypedValue {
    /// The wire form as a JSON value (unwrap).
    pub fn to_value(&self) -> Value {
        self.node().to_value()
    }

    /// Consume and unwrap.
    pub fn into_value(self) -> Value {
        self.to_value()
    }

    /// Canonical bytes of the wire form.
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, TvalError> {
        Ok(CanonicalBytes::new(self.node())?)
    }

    /// Canonical (JCS) text of the wire form.
    pub fn encode(&self) -> Result<String, TvalError> {
        Ok(self.canonical_bytes()?.as_str().to_string())
    }

    /// Indented text of the wire form, with record fields in declaration
    /// order.
    pub fn encode_pretty(&self) -> Result<String, TvalError> {
        serde_json::to_string_pretty(self.node()).map_err(|e| CodecError::Encode(e).into())
    }

    /// Parse wire text and construct a value of `signature`.
    ///
    /// # Errors
    ///
    /// `CodecError::Malformed` if `text` is not JSON at all, otherwise
    /// whatever [`TypedValue::new`] reports for the parsed data.
    pub fn decode(signature: Arc<TypeSignature>, text: &str) -> Result<Self, TvalError> {
        let value: Value = serde_json::from_str(text).map_err(|e| CodecError::malformed(&e))?;
        Self::new(signature, Input::Json(value))
    }

    /// Digest over the signature digest and the canonical wire form.
    pub fn content_digest(&self) -> Result<ContentDigest, TvalError> {
        let envelope = json!([self.signature().digest().to_hex(), self.to_value()]);
        Ok(sha256_digest(&CanonicalBytes::new(&envelope)?))
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        if self.signature() != other.signature() {
            return false;
        }
        match (self.canonical_bytes(), other.canonical_bytes()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// Serializes the wire form.
impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.node().serialize(serializer)
    }
}
