//! # tval-value: Typed Values
//!
//! Immutable values checked against a [`TypeSignature`](tval_schema::TypeSignature),
//! with persistent updates that hand back a new root.
//!
//! ## Key Design Principles
//!
//! 1. **Validate, then build.** Construction checks the whole input first and
//!    reports the first mismatch with its path. Nothing partial is returned.
//!
//! 2. **Edits return the new root.** A child read from a parent remembers
//!    the snapshot it came from. Editing it rebuilds each ancestor with one
//!    slot replaced; the old root stays as it was.
//!
//! 3. **One wire form.** [`TypedValue::to_value`] and
//!    [`TypedValue::encode`] produce the same JSON; equality compares its
//!    canonical bytes under the same signature digest.
//!
//! ## Crate Policy
//!
//! - Depends on `tval-core` and `tval-schema` only.
//! - No `panic!()` or `.unwrap()` outside tests.

mod choice;
mod codec;
pub mod input;
mod lift;
mod list;
mod node;
mod patch;
pub mod value;

pub use input::Input;
pub use value::{Element, Iter, TypedValue};

use tval_core::TvalError;
use tval_schema::TypeRegistry;

/// Construct a value of the type `name` (a scalar keyword, a declared or
/// external type, or a template instance) from `input`.
///
/// # Errors
///
/// `TvalError::Schema` if `name` does not resolve, otherwise whatever
/// [`TypedValue::new`] reports.
pub fn construct(
    registry: &TypeRegistry,
    name: &str,
    input: impl Into<Input>,
) -> Result<TypedValue, TvalError> {
    let signature = registry.reference(name)?;
    TypedValue::new(signature, input)
}
