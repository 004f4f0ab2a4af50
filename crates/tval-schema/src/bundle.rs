//! # Schema Bundles
//!
//! A schema bundle is the YAML configuration a registry is loaded from:
//!
//! ```yaml
//! builtin_templates: true
//! templates:
//!   "Pair{a}And{b}": [a, b]
//! types:
//!   User: { id: int, name: string }
//!   Tree: { ":Leaf": null, ":Node": [int, Tree, Tree] }
//! ```
//!
//! Declarations keep their YAML key order. Templates are registered before
//! types, and all types are registered together so they may refer to each
//! other in any order.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use tval_core::SchemaError;

use crate::registry::TypeRegistry;

fn default_builtin_templates() -> bool {
    true
}

/// Serde form of a registry's named types and templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaBundle {
    /// Whether `ListOf{a}`, `Maybe{a}` and `Either{a}Or{b}` are available.
    #[serde(default = "default_builtin_templates")]
    pub builtin_templates: bool,
    /// Generic templates by pattern.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub templates: IndexMap<String, Value>,
    /// Named value types.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub types: IndexMap<String, Value>,
}

impl Default for SchemaBundle {
    fn default() -> Self {
        Self {
            builtin_templates: true,
            templates: IndexMap::new(),
            types: IndexMap::new(),
        }
    }
}

impl SchemaBundle {
    /// Parse a bundle from YAML text.
    ///
    /// # Errors
    ///
    /// `SchemaError::Bundle` if the text is not a well-formed bundle.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(text)
            .map_err(|e| SchemaError::Bundle(format!("failed to parse schema bundle: {e}")))
    }

    /// Read and parse a bundle file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::Bundle(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml_str(&content)
    }

    /// Render as YAML.
    pub fn to_yaml_string(&self) -> Result<String, SchemaError> {
        serde_yaml::to_string(self).map_err(|e| SchemaError::Bundle(e.to_string()))
    }
}

impl TypeRegistry {
    /// Build a registry from a bundle.
    ///
    /// # Errors
    ///
    /// The first template or type that fails to register.
    pub fn from_bundle(bundle: &SchemaBundle) -> Result<Self, SchemaError> {
        let registry = if bundle.builtin_templates {
            Self::new()
        } else {
            Self::empty()
        };
        for (pattern, declaration) in &bundle.templates {
            registry.template(pattern, declaration.clone())?;
        }
        registry.define_all(
            bundle
                .types
                .iter()
                .map(|(name, declaration)| (name.clone(), declaration.clone())),
        )?;
        debug!(
            types = bundle.types.len(),
            templates = bundle.templates.len(),
            "schema bundle loaded"
        );
        Ok(registry)
    }

    /// Parse YAML bundle text and build a registry from it.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        Self::from_bundle(&SchemaBundle::from_yaml_str(text)?)
    }

    /// The declared types and user templates of this registry as a bundle.
    ///
    /// External types have no declaration and are not included.
    pub fn to_bundle(&self) -> SchemaBundle {
        let patterns = self.template_patterns();
        let builtin: Vec<&str> = crate::template::builtin_templates()
            .into_iter()
            .map(|(pattern, _)| pattern)
            .collect();
        let builtin_templates = builtin.iter().all(|b| patterns.iter().any(|p| p == b));
        let templates = patterns
            .iter()
            .filter(|p| !(builtin_templates && builtin.contains(&p.as_str())))
            .filter_map(|p| self.template_declaration(p).map(|d| (p.clone(), d)))
            .collect();
        let types = self
            .names()
            .into_iter()
            .filter_map(|name| self.declaration(&name).map(|d| (name, d)))
            .collect();
        SchemaBundle {
            builtin_templates,
            templates,
            types,
        }
    }
}
