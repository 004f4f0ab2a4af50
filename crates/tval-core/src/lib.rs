//! # tval-core: Foundational Types for tval
//!
//! This crate is the leaf of the tval workspace. It defines the pieces every
//! other crate agrees on: the error taxonomy, the path and shape vocabulary
//! used by validation errors, and the canonical byte form that structural
//! equality is computed over.
//!
//! ## Key Design Principles
//!
//! 1. **One error taxonomy.** `SchemaError`, `ValidationError`, `AccessError`,
//!    `StateMismatchError` and `CodecError` are distinct kinds that all
//!    convert into [`TvalError`]. Callers match on the kind, never on a
//!    message string.
//!
//! 2. **Pathed mismatches.** A [`ValidationError`] always carries the
//!    [`ValuePath`] from the validation root plus an expected and an actual
//!    shape description. There is no bare-boolean validation result.
//!
//! 3. **`CanonicalBytes` newtype.** Signature hashes and value equality both
//!    flow through `CanonicalBytes::new()` (RFC 8785 / JCS). Digests accept
//!    only `&CanonicalBytes`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tval-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod path;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{
    AccessError, CanonicalizationError, CodecError, SchemaError, StateMismatchError, TvalError,
    ValidationError,
};
pub use path::{describe_value, Key, ValuePath};
