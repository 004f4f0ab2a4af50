//! # tval-schema: Signature Algebra
//!
//! Turns declarations into [`TypeSignature`]s, checks raw values against
//! them, and keeps the registry of named types they refer to.
//!
//! ## Declarations (`declaration`, `signature`)
//!
//! A declaration is a plain JSON value. Its kind is decided once, when the
//! signature is built, by these rules in order: scalar keyword, known type
//! name, empty (error), one-element array (list), all-tagged array (enum),
//! other array (tuple), all-tagged object (variants), other object (record).
//! Signatures compare by the SHA-256 digest of their canonical descriptor.
//!
//! ## Validation (`validate`)
//!
//! [`TypeSignature::check`] reports the first mismatch with its path, the
//! expected shape and the actual shape.
//!
//! ## Registry (`registry`, `template`, `bundle`)
//!
//! [`TypeRegistry`] holds named value types (which may be recursive),
//! external leaf types with their own predicate, and generic templates such
//! as `Maybe{a}` that are instantiated and cached on first reference. A
//! registry can be loaded from a YAML [`SchemaBundle`].
//!
//! ## Crate Policy
//!
//! - Depends only on `tval-core` internally.
//! - A signature's kind never changes after it is built.
//! - The signature cache is populated at most once per name.

pub mod bundle;
pub mod declaration;
pub mod registry;
pub mod signature;
mod template;
pub mod validate;

pub use bundle::SchemaBundle;
pub use declaration::{Bindings, TAG_MARKER};
pub use registry::{ExternalType, TypeRegistry};
pub use signature::{ClassRef, Resolved, ScalarKind, SignatureKind, TypeSignature};
