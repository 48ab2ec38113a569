//! definition::registry
//!
//! Name-keyed lookup of compiled definitions.
//!
//! The registry is built once at startup and then shared read-only.
//!
//! # Example
//!
//! ```
//! use metahead::definition::{default_definition, Registry};
//!
//! let mut registry = Registry::new();
//! registry.register(default_definition()).unwrap();
//!
//! // With exactly one definition, anonymous lookup is allowed
//! assert_eq!(registry.get(None).unwrap().name(), "DefaultMetadata");
//! assert!(registry.get(Some("Missing")).is_err());
//! ```

use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

use super::builder::CompiledDefinition;
use super::DefinitionError;

/// Errors from registry lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No definition is registered under the name.
    #[error("metadata definition '{0}' does not exist")]
    UnknownDefinition(String),

    /// An anonymous lookup was made without exactly one definition.
    #[error("anonymous lookup needs exactly one registered definition, found {0}")]
    Ambiguous(usize),
}

/// Compiled definitions keyed by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    definitions: IndexMap<String, Arc<CompiledDefinition>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiled definition under its name.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::DuplicateDefinition` if the name is taken.
    pub fn register(&mut self, definition: CompiledDefinition) -> Result<(), DefinitionError> {
        let name = definition.name().to_string();
        if self.definitions.contains_key(&name) {
            return Err(DefinitionError::DuplicateDefinition(name));
        }
        self.definitions.insert(name, Arc::new(definition));
        Ok(())
    }

    /// Look up a definition by name, or the only one when `name` is `None`.
    pub fn get(&self, name: Option<&str>) -> Result<Arc<CompiledDefinition>, RegistryError> {
        match name {
            Some(name) => self
                .definitions
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::UnknownDefinition(name.to_string())),
            None => {
                if self.definitions.len() != 1 {
                    return Err(RegistryError::Ambiguous(self.definitions.len()));
                }
                self.definitions
                    .values()
                    .next()
                    .cloned()
                    .ok_or(RegistryError::Ambiguous(0))
            }
        }
    }

    /// All definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CompiledDefinition>> {
        self.definitions.values()
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no definitions are registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
