//! Type names available to declarations.

use std::collections::HashMap;

use cmdtree_core::ValueType;

use crate::decl::TypeDecl;
use crate::error::{ConfigError, Result};

/// Maps type names used in declarations to [`ValueType`]s.
///
/// Preloaded with `Boolean`, `Number` and `String`, plus the lowercase
/// spellings `boolean`, `bool`, `number` and `string`.
///
/// # Examples
///
/// ```
/// use cmdtree_config::{TypeDecl, TypeRegistry};
/// use cmdtree_core::ValueType;
///
/// let mut registry = TypeRegistry::default();
/// registry.register("Port", ValueType::parsed::<u16>());
///
/// assert_eq!(registry.resolve(&TypeDecl::Named("bool".into())).unwrap(), ValueType::Bool);
/// assert!(registry.contains("Port"));
/// assert!(registry.resolve(&TypeDecl::Named("Date".into())).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, ValueType>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for name in ["Boolean", "boolean", "bool"] {
            registry.register(name, ValueType::Bool);
        }
        for name in ["Number", "number"] {
            registry.register(name, ValueType::Number);
        }
        for name in ["String", "string"] {
            registry.register(name, ValueType::String);
        }
        registry
    }
}

impl TypeRegistry {
    /// A registry with no names at all, not even the built-in ones.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Registers `value_type` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, value_type: ValueType) -> &mut Self {
        self.types.insert(name.into(), value_type);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ValueType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves a declared type. Inline lists become [`ValueType::Enum`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownType`] for a name that was never registered.
    pub fn resolve(&self, decl: &TypeDecl) -> Result<ValueType> {
        match decl {
            TypeDecl::Named(name) => self
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownType(name.clone())),
            TypeDecl::Enum(values) => Ok(ValueType::enumeration(values.iter().cloned())),
        }
    }
}
