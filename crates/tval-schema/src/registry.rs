//! # Type Registry
//!
//! [`TypeRegistry`] owns every named type a program uses: declared value
//! types, external leaf types and generic templates. It also memoizes the
//! signature built for each declared or instantiated name.
//!
//! ## Concurrency
//!
//! All state sits behind `parking_lot::RwLock`s inside one shared
//! `Arc<RegistryInner>`; cloning a `TypeRegistry` clones the handle. The
//! signature cache is write-once per name: a cache miss builds without
//! holding any lock, then inserts with `entry().or_insert_with()` under the
//! write lock, so racing builders converge on the first stored
//! `Arc<TypeSignature>`. No lock is ever held while another is acquired,
//! except `declarations` before `externals`, always in that order.
//!
//! ## Resolution
//!
//! Signatures refer to named types through [`ClassRef`](crate::ClassRef),
//! which holds the registry weakly. A name is known at build time if it is
//! declared, external, already cached, or matches a template whose
//! arguments are themselves known; the reference is only resolved when a
//! value is checked or constructed.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{json, Value};
use tracing::debug;
use tval_core::SchemaError;

use crate::declaration::{validate_type_name, Bindings};
use crate::signature::{Resolved, SignatureBuilder, TypeSignature};
use crate::template::{argument_declaration, builtin_templates, is_scalar_argument, Template};

/// A leaf type that validates raw values with its own predicate.
///
/// Values of an external type are stored and emitted untouched.
pub trait ExternalType: Send + Sync {
    /// Expected-shape description used in validation errors.
    fn describe(&self) -> String;

    /// Whether a raw value belongs to this type.
    fn accepts(&self, value: &Value) -> bool;
}

#[derive(Default)]
pub(crate) struct RegistryInner {
    declarations: RwLock<IndexMap<String, Value>>,
    externals: RwLock<IndexMap<String, Arc<dyn ExternalType>>>,
    templates: RwLock<Vec<Template>>,
    signatures: RwLock<HashMap<String, Arc<TypeSignature>>>,
}

impl RegistryInner {
    pub(crate) fn is_known(&self, name: &str) -> bool {
        let cached = self.signatures.read().contains_key(name);
        let declared = self.declarations.read().contains_key(name);
        let external = self.externals.read().contains_key(name);
        if cached || declared || external {
            return true;
        }
        match self.match_template(name) {
            Some((_, _, args)) => args
                .iter()
                .all(|(_, arg)| is_scalar_argument(arg) || self.is_known(arg)),
            None => false,
        }
    }

    pub(crate) fn resolve(self: &Arc<Self>, name: &str) -> Result<Resolved, SchemaError> {
        let external = self.externals.read().get(name).cloned();
        match external {
            Some(external) => Ok(Resolved::External(external)),
            None => self.signature(name).map(Resolved::Declared),
        }
    }

    pub(crate) fn signature(self: &Arc<Self>, name: &str) -> Result<Arc<TypeSignature>, SchemaError> {
        if let Some(cached) = self.signatures.read().get(name) {
            return Ok(Arc::clone(cached));
        }

        let declared = self.declarations.read().get(name).cloned();
        let (declaration, bindings) = match declared {
            Some(declaration) => (declaration, Bindings::new()),
            None => self
                .instantiate(name)?
                .ok_or_else(|| SchemaError::UnresolvedClass(name.to_string()))?,
        };
        let built = SignatureBuilder::new(self, &bindings)
            .build(&declaration)?
            .with_name(name);

        let mut cache = self.signatures.write();
        let stored = cache.entry(name.to_string()).or_insert_with(|| {
            debug!(type_name = name, digest = %built.digest(), "signature cached");
            Arc::new(built)
        });
        Ok(Arc::clone(stored))
    }

    /// First template matching `name`: its pattern, declaration and arguments.
    fn match_template(&self, name: &str) -> Option<(String, Value, Vec<(char, String)>)> {
        self.templates.read().iter().find_map(|t| {
            t.captures(name)
                .map(|args| (t.pattern().to_string(), t.declaration().clone(), args))
        })
    }

    fn instantiate(&self, name: &str) -> Result<Option<(Value, Bindings)>, SchemaError> {
        let Some((pattern, declaration, args)) = self.match_template(name) else {
            return Ok(None);
        };
        let mut bindings = Bindings::new();
        for (param, arg) in &args {
            if !is_scalar_argument(arg) && !self.is_known(arg) {
                return Err(SchemaError::UnresolvedClass(arg.clone()));
            }
            bindings.bind(*param, argument_declaration(arg))?;
        }
        debug!(type_name = name, pattern = %pattern, "template instantiated");
        Ok(Some((declaration, bindings)))
    }

    fn forget(&self, names: &[String]) {
        let mut declarations = self.declarations.write();
        for name in names {
            declarations.shift_remove(name);
        }
        drop(declarations);
        let mut cache = self.signatures.write();
        for name in names {
            cache.remove(name);
        }
    }
}

/// Registry of named types, external types and generic templates.
#[derive(Clone)]
pub struct TypeRegistry {
    inner: Arc<RegistryInner>,
}

impl TypeRegistry {
    /// A registry with the built-in templates `ListOf{a}`, `Maybe{a}` and
    /// `Either{a}Or{b}`.
    pub fn new() -> Self {
        let registry = Self::empty();
        {
            let mut templates = registry.inner.templates.write();
            for (pattern, declaration) in builtin_templates() {
                if let Ok(template) = Template::compile(pattern, declaration) {
                    templates.push(template);
                }
            }
        }
        registry
    }

    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self::from_inner(Arc::new(RegistryInner::default()))
    }

    pub(crate) fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }

    /// Register a named value type and return its signature.
    ///
    /// Redefining a name with an identical declaration is a no-op.
    ///
    /// # Errors
    ///
    /// `SchemaError::InvalidName` for a name that cannot be registered,
    /// `SchemaError::Conflict` when the name is taken by a different
    /// declaration or an external type, or whatever building the
    /// declaration fails with. A failed definition leaves no trace.
    pub fn define(&self, name: &str, declaration: Value) -> Result<Arc<TypeSignature>, SchemaError> {
        self.define_all([(name.to_string(), declaration)])?;
        self.signature(name)
    }

    /// Register several named types at once.
    ///
    /// Every name is registered before any declaration is built, so the
    /// declarations may refer to each other in any order, including
    /// mutually. Either all of them are registered or none is.
    pub fn define_all<I>(&self, types: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let pending: Vec<(String, Value)> = types.into_iter().collect();
        for (name, _) in &pending {
            validate_type_name(name)?;
        }

        let mut added: Vec<String> = Vec::new();
        {
            let mut declarations = self.inner.declarations.write();
            let externals = self.inner.externals.read();
            for (name, declaration) in pending {
                let conflict = externals.contains_key(&name)
                    || declarations
                        .get(&name)
                        .is_some_and(|existing| *existing != declaration);
                if conflict {
                    for added_name in &added {
                        declarations.shift_remove(added_name);
                    }
                    return Err(SchemaError::Conflict(name));
                }
                if !declarations.contains_key(&name) {
                    declarations.insert(name.clone(), declaration);
                    added.push(name);
                }
            }
        }

        for name in &added {
            let built = self.inner.signature(name).and_then(|sig| match sig.class() {
                Some(alias) => alias.dereference().map(|_| ()),
                None => Ok(()),
            });
            if let Err(e) = built {
                self.inner.forget(&added);
                return Err(e);
            }
            debug!(type_name = %name, "type defined");
        }
        Ok(())
    }

    /// Register an external leaf type.
    ///
    /// # Errors
    ///
    /// `SchemaError::InvalidName` or `SchemaError::Conflict` as for
    /// [`define`](Self::define).
    pub fn define_external(
        &self,
        name: &str,
        external: Arc<dyn ExternalType>,
    ) -> Result<(), SchemaError> {
        validate_type_name(name)?;
        let declarations = self.inner.declarations.read();
        let mut externals = self.inner.externals.write();
        if declarations.contains_key(name) || externals.contains_key(name) {
            return Err(SchemaError::Conflict(name.to_string()));
        }
        externals.insert(name.to_string(), external);
        debug!(type_name = name, "external type defined");
        Ok(())
    }

    /// Register a generic template such as `Pair{a}And{b}`.
    ///
    /// The declaration is built only when a concrete name matching the
    /// pattern is first referenced. Registering the same pattern with the
    /// same declaration again is a no-op.
    pub fn template(&self, pattern: &str, declaration: Value) -> Result<(), SchemaError> {
        let template = Template::compile(pattern, declaration)?;
        let mut templates = self.inner.templates.write();
        if let Some(existing) = templates.iter().find(|t| t.pattern() == pattern) {
            if existing.declaration() == template.declaration() {
                return Ok(());
            }
            return Err(SchemaError::Conflict(pattern.to_string()));
        }
        debug!(pattern, "template registered");
        templates.push(template);
        Ok(())
    }

    /// Build an anonymous signature from a declaration.
    pub fn build(&self, declaration: &Value) -> Result<Arc<TypeSignature>, SchemaError> {
        self.build_with(declaration, &Bindings::new())
    }

    /// Build an anonymous signature with explicit parameter bindings.
    pub fn build_with(
        &self,
        declaration: &Value,
        bindings: &Bindings,
    ) -> Result<Arc<TypeSignature>, SchemaError> {
        SignatureBuilder::new(&self.inner, bindings)
            .build(declaration)
            .map(Arc::new)
    }

    /// The cached signature of a declared or template-instantiated type.
    ///
    /// # Errors
    ///
    /// `SchemaError::UnresolvedClass` if the name is neither declared nor
    /// matched by a template (external types have no signature of their
    /// own; see [`resolve`](Self::resolve)).
    pub fn signature(&self, name: &str) -> Result<Arc<TypeSignature>, SchemaError> {
        self.inner.signature(name)
    }

    /// Resolve a name to a declared signature or an external type.
    pub fn resolve(&self, name: &str) -> Result<Resolved, SchemaError> {
        self.inner.resolve(name)
    }

    /// Signature for a name in declaration position: a scalar keyword,
    /// or a reference to a known type.
    pub fn reference(&self, name: &str) -> Result<Arc<TypeSignature>, SchemaError> {
        self.build(&json!(name))
    }

    /// Whether `name` would resolve.
    pub fn is_known(&self, name: &str) -> bool {
        self.inner.is_known(name)
    }

    /// Declared type names, in definition order.
    pub fn names(&self) -> Vec<String> {
        self.inner.declarations.read().keys().cloned().collect()
    }

    /// External type names, in definition order.
    pub fn external_names(&self) -> Vec<String> {
        self.inner.externals.read().keys().cloned().collect()
    }

    /// Registered template patterns, in registration order.
    pub fn template_patterns(&self) -> Vec<String> {
        self.inner
            .templates
            .read()
            .iter()
            .map(|t| t.pattern().to_string())
            .collect()
    }

    /// The declaration a named type was defined with.
    pub fn declaration(&self, name: &str) -> Option<Value> {
        self.inner.declarations.read().get(name).cloned()
    }

    /// The declaration a template was registered with.
    pub fn template_declaration(&self, pattern: &str) -> Option<Value> {
        self.inner
            .templates
            .read()
            .iter()
            .find(|t| t.pattern() == pattern)
            .map(|t| t.declaration().clone())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.names())
            .field("externals", &self.external_names())
            .field("templates", &self.template_patterns())
            .finish()
    }
}
