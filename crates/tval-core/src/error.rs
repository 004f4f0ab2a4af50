//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error kinds raised anywhere in tval. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Every public operation either returns a fully valid value or exactly
//!   one of these kinds. Nothing is downgraded to a default.
//! - Validation errors include the value path, the expected shape and the
//!   actual shape.
//! - Pattern accessors distinguish "undeclared" (`AccessError`) from
//!   "declared but not active" (`StateMismatchError`).

use thiserror::Error;

use crate::path::ValuePath;

/// Top-level error type for tval.
#[derive(Error, Debug)]
pub enum TvalError {
    /// Malformed or self-contradictory type declaration.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A raw value does not match a signature.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A validated value could not be lifted into a typed value.
    #[error("construction error: {0}")]
    Construction(String),

    /// Operation requested against the wrong kind, or an undefined slot.
    #[error("access error: {0}")]
    Access(#[from] AccessError),

    /// Pattern accessor naming a declared but inactive tag or constructor.
    #[error("state mismatch: {0}")]
    StateMismatch(#[from] StateMismatchError),

    /// Malformed wire text.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Canonical serialization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl TvalError {
    /// The validation failure carried by this error, if it is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

/// Error in a type declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A list, tuple, enum, record or variants declaration with no entries.
    #[error("complex type declaration is empty")]
    EmptyComplex,

    /// A string declaration that is neither a scalar keyword nor a known type.
    #[error("unknown scalar type \"{0}\"")]
    UnknownScalar(String),

    /// A type reference that the registry cannot resolve.
    #[error("type reference \"{0}\" cannot be resolved")]
    UnresolvedClass(String),

    /// The declaration mixes syntactic markers so its kind is not decidable.
    #[error("ambiguous declaration: {0}")]
    Ambiguous(String),

    /// The same tag or constructor name is declared twice.
    #[error("tag \"{0}\" is declared more than once")]
    DuplicateTag(String),

    /// A record field declared as null (only variant payloads may be absent).
    #[error("field \"{0}\" has no type; only variant constructors may omit a payload")]
    NullField(String),

    /// The declaration is not a string, an array or an object.
    #[error("incorrect type declaration: {0}")]
    Malformed(String),

    /// A named type was redefined with a different declaration.
    #[error("type \"{0}\" is already defined with a different declaration")]
    Conflict(String),

    /// A type or template name that cannot be registered.
    #[error("invalid type name \"{0}\"")]
    InvalidName(String),

    /// A template pattern with no placeholders, unknown placeholders or bad syntax.
    #[error("invalid template pattern \"{pattern}\": {reason}")]
    InvalidTemplate {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A type reference outlived the registry that produced it.
    #[error("type reference \"{0}\" outlived its registry")]
    RegistryDropped(String),

    /// A schema bundle could not be parsed.
    #[error("schema bundle error: {0}")]
    Bundle(String),
}

/// A raw value does not match a signature.
///
/// Always carries where the mismatch is, what was expected there and what
/// was actually found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("value at {path} was expected to be {expected}, but it is {actual}")]
pub struct ValidationError {
    /// Path from the validation root to the offending node.
    pub path: ValuePath,
    /// Description of the expected shape, e.g. `an integer`.
    pub expected: String,
    /// Description of what was found, e.g. `a float (123.5)`.
    pub actual: String,
}

impl ValidationError {
    /// Create a mismatch at `path`.
    pub fn new(path: ValuePath, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            path,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Error in reading or editing a typed value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The operation does not exist for this kind of value.
    #[error("operation \"{operation}\" is not available on {kind} values")]
    WrongKind {
        /// The attempted operation.
        operation: String,
        /// The kind of value it was attempted on.
        kind: String,
    },

    /// Index beyond the current elements.
    #[error("element [{index}] is not defined (length {len})")]
    UndefinedIndex {
        /// Requested index.
        index: usize,
        /// Number of elements present.
        len: usize,
    },

    /// Field name not in the declared set.
    #[error("field \"{0}\" is not defined")]
    UndefinedField(String),

    /// Tag or constructor name not in the declared set.
    #[error("\"{tag}\" is not declared; declared: ({declared})")]
    UndeclaredTag {
        /// The requested name.
        tag: String,
        /// Comma-separated declared names.
        declared: String,
    },

    /// The active constructor declares no payload.
    #[error("constructor \"{0}\" carries no payload")]
    NoPayload(String),

    /// A positional key used on a record, or a named key on a sequence.
    #[error("{kind} values are addressed by {expected}")]
    KeyKind {
        /// The kind of value addressed.
        kind: String,
        /// `index` or `field name`.
        expected: String,
    },

    /// A splice or removal range outside the list.
    #[error("range starting at {offset} is outside a list of length {len}")]
    OutOfRange {
        /// Start of the requested range.
        offset: usize,
        /// Number of elements present.
        len: usize,
    },
}

/// A declared tag or constructor was requested while another one is active.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("value holds \"{active}\", but \"{requested}\" was requested")]
pub struct StateMismatchError {
    /// The requested tag or constructor.
    pub requested: String,
    /// The active tag or constructor.
    pub active: String,
}

/// Error at the wire boundary.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The input text is not well-formed JSON.
    #[error("malformed JSON at line {line}, column {column}: {reason}")]
    Malformed {
        /// 1-based line of the syntax error.
        line: usize,
        /// 1-based column of the syntax error.
        column: usize,
        /// Parser message.
        reason: String,
    },

    /// Encoding to text failed.
    #[error("encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
}

impl CodecError {
    /// Build a `Malformed` error from a `serde_json` parse failure.
    pub fn malformed(err: &serde_json::Error) -> Self {
        Self::Malformed {
            line: err.line(),
            column: err.column(),
            reason: err.to_string(),
        }
    }
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JCS serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
