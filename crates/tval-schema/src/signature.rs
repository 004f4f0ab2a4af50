//! # Type Signatures
//!
//! [`TypeSignature`] is the immutable, recursively-defined descriptor of a
//! data shape. Its kind is one of the closed [`SignatureKind`] variants and
//! is fixed when the signature is built from a declaration; it is never
//! re-derived from data.
//!
//! ## Structural Identity
//!
//! Every signature carries a canonical descriptor and the SHA-256 digest of
//! its JCS bytes, both computed once at build time. `PartialEq`, `Eq` and
//! `Hash` compare digests only, so two signatures built independently from
//! identical declarations are equal and comparison never walks the tree.
//!
//! Descriptor forms:
//!
//! ```text
//! Scalar     "int" | "float" | "string" | "bool"
//! Class      {"class": "User"}
//! List       {"list": D}
//! Tuple      {"tuple": [D, ...]}
//! Record     {"record": [["id", D], ["name", D], ...]}
//! Enum       {"enum": ["A", "B", ...]}
//! Variants   {"variants": [["Just", D], ["Nothing", null], ...]}
//! ```
//!
//! Record fields and variant constructors are ordered pairs, so a record
//! declared `{id, name}` and one declared `{name, id}` are different
//! signatures.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use tval_core::{describe_value, sha256_digest, CanonicalBytes, ContentDigest, SchemaError};

use crate::declaration::{declared_tag, is_tag, tag_name, Bindings, TAG_MARKER};
use crate::registry::{ExternalType, RegistryInner, TypeRegistry};

/// Scalar leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Integer.
    Int,
    /// Float; integers are accepted in float positions.
    Float,
    /// String.
    String,
    /// Boolean.
    Bool,
}

impl ScalarKind {
    /// Parse a scalar keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "string" => Some(Self::String),
            "bool" => Some(Self::Bool),
            _ => None,
        }
    }

    /// The declaration keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Bool => "bool",
        }
    }

    /// Expected-shape description used in validation errors.
    pub fn expected(self) -> &'static str {
        match self {
            Self::Int => "an integer",
            Self::Float => "a float",
            Self::String => "a string",
            Self::Bool => "a boolean",
        }
    }

    /// Whether a raw value is acceptable at a position of this kind.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Float, Value::Number(_)) => true,
            (Self::String, Value::String(_)) => true,
            (Self::Bool, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Reference to a named type held by a [`TypeRegistry`](crate::TypeRegistry).
///
/// The registry is held weakly. Resolution happens when a value is checked
/// or constructed, which is what lets a declaration mention itself.
#[derive(Clone)]
pub struct ClassRef {
    name: String,
    registry: Weak<RegistryInner>,
}

/// What a [`ClassRef`] resolves to.
#[derive(Clone)]
pub enum Resolved {
    /// A named value type; values are built against its signature.
    Declared(Arc<TypeSignature>),
    /// A leaf type with its own predicate; values pass through untouched.
    External(Arc<dyn ExternalType>),
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared(sig) => f.debug_tuple("Declared").field(sig).finish(),
            Self::External(ext) => f.debug_tuple("External").field(&ext.describe()).finish(),
        }
    }
}

impl ClassRef {
    pub(crate) fn new(name: &str, registry: &Arc<RegistryInner>) -> Self {
        Self {
            name: name.to_string(),
            registry: Arc::downgrade(registry),
        }
    }

    /// The referenced type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve against the owning registry.
    ///
    /// # Errors
    ///
    /// `SchemaError::RegistryDropped` when the registry no longer exists,
    /// or whatever building the named type's signature fails with.
    pub fn resolve(&self) -> Result<Resolved, SchemaError> {
        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| SchemaError::RegistryDropped(self.name.clone()))?;
        registry.resolve(&self.name)
    }

    /// A strong handle on the owning registry, while it still exists.
    pub fn registry(&self) -> Option<TypeRegistry> {
        self.registry.upgrade().map(TypeRegistry::from_inner)
    }

    /// Resolve, following declared aliases (`Age: int`, `Owner: User`)
    /// until a structural signature or an external type is reached.
    ///
    /// # Errors
    ///
    /// As [`resolve`](Self::resolve), plus `SchemaError::Ambiguous` for a
    /// chain of aliases that leads back to itself.
    pub fn dereference(&self) -> Result<Resolved, SchemaError> {
        self.dereference_named().map(|(_, resolved)| resolved)
    }

    /// As [`dereference`](Self::dereference), also returning the last
    /// reference on the alias chain: `Email` for `Owner: Email`.
    pub fn dereference_named(&self) -> Result<(ClassRef, Resolved), SchemaError> {
        let mut seen = vec![self.name.clone()];
        let mut current = self.clone();
        let mut resolved = current.resolve()?;
        loop {
            let next = match &resolved {
                Resolved::Declared(sig) => sig.class().cloned(),
                Resolved::External(_) => None,
            };
            let Some(next) = next else {
                return Ok((current, resolved));
            };
            if seen.iter().any(|name| name == next.name()) {
                return Err(SchemaError::Ambiguous(format!(
                    "type \"{}\" is an alias of itself",
                    next.name()
                )));
            }
            seen.push(next.name().to_string());
            resolved = next.resolve()?;
            current = next;
        }
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassRef").field(&self.name).finish()
    }
}

/// The closed set of signature kinds.
#[derive(Debug, Clone)]
pub enum SignatureKind {
    /// Scalar leaf.
    Scalar(ScalarKind),
    /// Named type, resolved lazily.
    Class(ClassRef),
    /// Homogeneous sequence.
    List(Arc<TypeSignature>),
    /// Fixed-arity heterogeneous sequence.
    Tuple(Vec<Arc<TypeSignature>>),
    /// Fixed named fields, in declaration order.
    Record(IndexMap<String, Arc<TypeSignature>>),
    /// Payload-free tags, in declaration order.
    Enum(Vec<String>),
    /// Constructors with an optional payload, in declaration order.
    Variants(IndexMap<String, Option<Arc<TypeSignature>>>),
}

impl SignatureKind {
    /// Short kind name used in access errors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Class(_) => "class",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Record(_) => "record",
            Self::Enum(_) => "enum",
            Self::Variants(_) => "variants",
        }
    }
}

/// Immutable descriptor of a data shape.
#[derive(Clone)]
pub struct TypeSignature {
    kind: SignatureKind,
    name: Option<String>,
    descriptor: Value,
    digest: ContentDigest,
}

impl TypeSignature {
    /// Build a signature from an already-dispatched kind.
    ///
    /// # Errors
    ///
    /// `SchemaError::EmptyComplex` for a tuple, record, enum or variants
    /// kind with no entries, `SchemaError::DuplicateTag` for a repeated enum
    /// tag.
    pub fn from_kind(kind: SignatureKind) -> Result<Self, SchemaError> {
        let descriptor = match &kind {
            SignatureKind::Scalar(s) => json!(s.keyword()),
            SignatureKind::Class(c) => json!({ "class": c.name() }),
            SignatureKind::List(element) => json!({ "list": element.descriptor }),
            SignatureKind::Tuple(elements) => {
                if elements.is_empty() {
                    return Err(SchemaError::EmptyComplex);
                }
                let inner: Vec<&Value> = elements.iter().map(|e| &e.descriptor).collect();
                json!({ "tuple": inner })
            }
            SignatureKind::Record(fields) => {
                if fields.is_empty() {
                    return Err(SchemaError::EmptyComplex);
                }
                let pairs: Vec<Value> = fields
                    .iter()
                    .map(|(name, sig)| json!([name, sig.descriptor]))
                    .collect();
                json!({ "record": pairs })
            }
            SignatureKind::Enum(tags) => {
                if tags.is_empty() {
                    return Err(SchemaError::EmptyComplex);
                }
                for (i, tag) in tags.iter().enumerate() {
                    if tags[..i].contains(tag) {
                        return Err(SchemaError::DuplicateTag(tag.clone()));
                    }
                }
                json!({ "enum": tags })
            }
            SignatureKind::Variants(constructors) => {
                if constructors.is_empty() {
                    return Err(SchemaError::EmptyComplex);
                }
                let pairs: Vec<Value> = constructors
                    .iter()
                    .map(|(name, payload)| {
                        json!([name, payload.as_ref().map(|p| p.descriptor.clone())])
                    })
                    .collect();
                json!({ "variants": pairs })
            }
        };
        let canonical =
            CanonicalBytes::new(&descriptor).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        Ok(Self {
            kind,
            name: None,
            digest: sha256_digest(&canonical),
            descriptor,
        })
    }

    /// A scalar signature.
    pub fn scalar(kind: ScalarKind) -> Self {
        Self {
            kind: SignatureKind::Scalar(kind),
            name: None,
            digest: scalar_digest(kind),
            descriptor: json!(kind.keyword()),
        }
    }

    /// Attach the registered type name. Does not affect identity.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The kind.
    pub fn kind(&self) -> &SignatureKind {
        &self.kind
    }

    /// Registered type name, for signatures built from a named declaration.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Structural digest.
    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }

    /// Canonical descriptor the digest is computed over.
    pub fn descriptor(&self) -> &Value {
        &self.descriptor
    }

    /// Whether this is a scalar leaf.
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, SignatureKind::Scalar(_))
    }

    /// Whether this is a named-type reference.
    pub fn is_class(&self) -> bool {
        matches!(self.kind, SignatureKind::Class(_))
    }

    /// Whether this is a list.
    pub fn is_list(&self) -> bool {
        matches!(self.kind, SignatureKind::List(_))
    }

    /// Whether this is a tuple.
    pub fn is_tuple(&self) -> bool {
        matches!(self.kind, SignatureKind::Tuple(_))
    }

    /// Whether this is a record.
    pub fn is_record(&self) -> bool {
        matches!(self.kind, SignatureKind::Record(_))
    }

    /// Whether this is an enum.
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, SignatureKind::Enum(_))
    }

    /// Whether this is a tagged union.
    pub fn is_variants(&self) -> bool {
        matches!(self.kind, SignatureKind::Variants(_))
    }

    /// Scalar kind of a scalar leaf.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.kind {
            SignatureKind::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Named-type reference of a class leaf.
    pub fn class(&self) -> Option<&ClassRef> {
        match &self.kind {
            SignatureKind::Class(c) => Some(c),
            _ => None,
        }
    }

    /// A strong handle on the registry behind the first named-type
    /// reference in this signature, or `None` when it names no types (or
    /// its registry is gone).
    pub fn registry(&self) -> Option<TypeRegistry> {
        match &self.kind {
            SignatureKind::Scalar(_) | SignatureKind::Enum(_) => None,
            SignatureKind::Class(class) => class.registry(),
            SignatureKind::List(element) => element.registry(),
            SignatureKind::Tuple(elements) => elements.iter().find_map(|e| e.registry()),
            SignatureKind::Record(fields) => fields.values().find_map(|f| f.registry()),
            SignatureKind::Variants(constructors) => constructors
                .values()
                .flatten()
                .find_map(|payload| payload.registry()),
        }
    }

    /// Element signature of a list.
    pub fn element(&self) -> Option<&Arc<TypeSignature>> {
        match &self.kind {
            SignatureKind::List(e) => Some(e),
            _ => None,
        }
    }

    /// Position signatures of a tuple.
    pub fn elements(&self) -> Option<&[Arc<TypeSignature>]> {
        match &self.kind {
            SignatureKind::Tuple(e) => Some(e),
            _ => None,
        }
    }

    /// Field signatures of a record.
    pub fn fields(&self) -> Option<&IndexMap<String, Arc<TypeSignature>>> {
        match &self.kind {
            SignatureKind::Record(f) => Some(f),
            _ => None,
        }
    }

    /// Tags of an enum.
    pub fn tags(&self) -> Option<&[String]> {
        match &self.kind {
            SignatureKind::Enum(t) => Some(t),
            _ => None,
        }
    }

    /// Constructors of a tagged union.
    pub fn constructors(&self) -> Option<&IndexMap<String, Option<Arc<TypeSignature>>>> {
        match &self.kind {
            SignatureKind::Variants(c) => Some(c),
            _ => None,
        }
    }

    /// Declared tag or constructor names, in index order.
    pub fn tag_names(&self) -> Vec<&str> {
        match &self.kind {
            SignatureKind::Enum(tags) => tags.iter().map(String::as_str).collect(),
            SignatureKind::Variants(ctors) => ctors.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Position of an enum tag or variants constructor, by name.
    pub fn tag_index(&self, name: &str) -> Option<usize> {
        match &self.kind {
            SignatureKind::Enum(tags) => tags.iter().position(|t| t == name),
            SignatureKind::Variants(ctors) => ctors.get_index_of(name),
            _ => None,
        }
    }

    /// Resolve a wire selector (a tag name or an in-range integer index)
    /// to a tag or constructor position.
    pub fn tag_position(&self, selector: &Value) -> Option<usize> {
        match selector {
            Value::String(name) => self.tag_index(name),
            Value::Number(n) => {
                let index = usize::try_from(n.as_u64()?).ok()?;
                (index < self.tag_names().len()).then_some(index)
            }
            _ => None,
        }
    }

    /// Render the signature back into declaration syntax.
    ///
    /// Building the result yields a signature equal to this one.
    pub fn to_declaration(&self) -> Value {
        match &self.kind {
            SignatureKind::Scalar(s) => json!(s.keyword()),
            SignatureKind::Class(c) => json!(c.name()),
            SignatureKind::List(e) => json!([e.to_declaration()]),
            SignatureKind::Tuple(es) => {
                Value::Array(es.iter().map(|e| e.to_declaration()).collect())
            }
            SignatureKind::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, sig)| (name.clone(), sig.to_declaration()))
                    .collect::<Map<String, Value>>(),
            ),
            SignatureKind::Enum(tags) => Value::Array(
                tags.iter()
                    .map(|t| Value::String(format!("{TAG_MARKER}{t}")))
                    .collect(),
            ),
            SignatureKind::Variants(ctors) => Value::Object(
                ctors
                    .iter()
                    .map(|(name, payload)| {
                        (
                            format!("{TAG_MARKER}{name}"),
                            payload.as_ref().map_or(Value::Null, |p| p.to_declaration()),
                        )
                    })
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

/// A JSON string always canonicalizes; the zero digest is unreachable.
fn scalar_digest(kind: ScalarKind) -> ContentDigest {
    match CanonicalBytes::new(&kind.keyword()) {
        Ok(canonical) => sha256_digest(&canonical),
        Err(_) => ContentDigest::new([0u8; 32]),
    }
}

impl PartialEq for TypeSignature {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for TypeSignature {}

impl Hash for TypeSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
    }
}

impl fmt::Debug for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("TypeSignature");
        if let Some(name) = &self.name {
            s.field("name", name);
        }
        s.field("shape", &format_args!("{self}")).finish()
    }
}

/// Compact human form: `int`, `User`, `[bool]`, `(int, string)`,
/// `{id: int, name: string}`, `Red | Green`, `Just(int) | Nothing`.
impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SignatureKind::Scalar(s) => write!(f, "{s}"),
            SignatureKind::Class(c) => f.write_str(c.name()),
            SignatureKind::List(e) => write!(f, "[{e}]"),
            SignatureKind::Tuple(es) => {
                f.write_str("(")?;
                for (i, e) in es.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{e}")?;
                }
                f.write_str(")")
            }
            SignatureKind::Record(fields) => {
                f.write_str("{")?;
                for (i, (name, sig)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {sig}")?;
                }
                f.write_str("}")
            }
            SignatureKind::Enum(tags) => f.write_str(&tags.join(" | ")),
            SignatureKind::Variants(ctors) => {
                for (i, (name, payload)) in ctors.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    match payload {
                        Some(p) => write!(f, "{name}({p})")?,
                        None => f.write_str(name)?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// Builds signatures from declarations against one registry.
pub(crate) struct SignatureBuilder<'a> {
    registry: &'a Arc<RegistryInner>,
    bindings: &'a Bindings,
}

impl<'a> SignatureBuilder<'a> {
    pub(crate) fn new(registry: &'a Arc<RegistryInner>, bindings: &'a Bindings) -> Self {
        Self { registry, bindings }
    }

    /// Dispatch a declaration to its kind and build it.
    pub(crate) fn build(&self, declaration: &Value) -> Result<TypeSignature, SchemaError> {
        let substituted = self.bindings.substitute(declaration);
        if !std::ptr::eq(substituted, declaration) {
            // Bound declarations are taken as written.
            let unbound = Bindings::new();
            return SignatureBuilder::new(self.registry, &unbound).build(substituted);
        }
        match declaration {
            Value::String(name) => self.build_name(name),
            Value::Array(items) => self.build_sequence(items),
            Value::Object(map) => self.build_mapping(map),
            other => Err(SchemaError::Malformed(describe_value(other))),
        }
    }

    fn build_inner(&self, declaration: &Value) -> Result<Arc<TypeSignature>, SchemaError> {
        self.build(declaration).map(Arc::new)
    }

    fn build_name(&self, name: &str) -> Result<TypeSignature, SchemaError> {
        if let Some(scalar) = ScalarKind::from_keyword(name) {
            return Ok(TypeSignature::scalar(scalar));
        }
        if self.registry.is_known(name) {
            return TypeSignature::from_kind(SignatureKind::Class(ClassRef::new(
                name,
                self.registry,
            )));
        }
        Err(SchemaError::UnknownScalar(name.to_string()))
    }

    fn build_sequence(&self, items: &[Value]) -> Result<TypeSignature, SchemaError> {
        match items {
            [] => Err(SchemaError::EmptyComplex),
            [element] => TypeSignature::from_kind(SignatureKind::List(self.build_inner(element)?)),
            _ => {
                let tagged = items.iter().filter(|item| is_tag(item)).count();
                if tagged == items.len() {
                    let tags = items
                        .iter()
                        .filter_map(|item| item.as_str().and_then(declared_tag))
                        .collect();
                    TypeSignature::from_kind(SignatureKind::Enum(tags))
                } else if tagged > 0 {
                    Err(SchemaError::Ambiguous(
                        "sequence mixes enum tags with element types".to_string(),
                    ))
                } else {
                    let elements = items
                        .iter()
                        .map(|item| self.build_inner(item))
                        .collect::<Result<Vec<_>, _>>()?;
                    TypeSignature::from_kind(SignatureKind::Tuple(elements))
                }
            }
        }
    }

    fn build_mapping(&self, map: &Map<String, Value>) -> Result<TypeSignature, SchemaError> {
        if map.is_empty() {
            return Err(SchemaError::EmptyComplex);
        }
        let tagged = map.keys().filter(|key| tag_name(key).is_some()).count();
        if tagged == map.len() {
            let mut constructors = IndexMap::with_capacity(map.len());
            for (key, payload) in map {
                let name = declared_tag(key).unwrap_or_else(|| key.clone());
                let payload = match payload {
                    Value::Null => None,
                    declared => Some(self.build_inner(declared)?),
                };
                if constructors.insert(name.clone(), payload).is_some() {
                    return Err(SchemaError::DuplicateTag(name));
                }
            }
            return TypeSignature::from_kind(SignatureKind::Variants(constructors));
        }
        if tagged > 0 {
            return Err(SchemaError::Ambiguous(
                "mapping mixes constructor tags with field names".to_string(),
            ));
        }
        let mut fields = IndexMap::with_capacity(map.len());
        for (name, declared) in map {
            if declared.is_null() {
                return Err(SchemaError::NullField(name.clone()));
            }
            fields.insert(name.clone(), self.build_inner(declared)?);
        }
        TypeSignature::from_kind(SignatureKind::Record(fields))
    }
}
