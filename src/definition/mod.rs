//! definition
//!
//! Metadata definitions: field descriptors, options, compilation and the
//! registry compiled definitions are looked up in.
//!
//! # Modules
//!
//! - [`field`] - Field kinds, populate rules and field descriptors
//! - [`options`] - Definition options and backend kinds
//! - [`builder`] - Compilation into record schemas
//! - [`registry`] - Name-keyed lookup of compiled definitions
//! - [`default`] - A ready-made title/keywords/description definition
//!
//! # Lifecycle
//!
//! Definitions are built once at startup and are immutable afterwards.
//! A [`Registry`] is constructed explicitly and passed to the resolver;
//! there is no process-global state.

pub mod builder;
pub mod default;
pub mod field;
pub mod options;
pub mod registry;

pub use builder::{Column, ColumnType, CompiledDefinition, DefinitionBuilder, RecordSchema};
pub use default::default_definition;
pub use field::{FieldDefinition, FieldKind, Helper, PopulateFrom, PopulateFn, Storage};
pub use options::{BackendKind, DefinitionOptions};
pub use registry::{Registry, RegistryError};

use thiserror::Error;

/// Configuration errors found while compiling a definition.
///
/// These are fatal: a definition that fails to compile cannot be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("definition name cannot be empty")]
    EmptyName,

    #[error("field name '{0}' is reserved")]
    ReservedFieldName(String),

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("group name '{0}' clashes with a field name")]
    GroupClashesWithField(String),

    #[error("group '{group}' member '{member}' is not a declared field")]
    UnknownGroupMember { group: String, member: String },

    #[error("field '{0}' is not editable, so it must set populate_from")]
    MissingPopulateFrom(String),

    #[error("field '{key}' has an invalid tag name '{name}'")]
    InvalidTagName { key: String, name: String },

    #[error("field '{key}' populates from '{target}', which is neither a field nor a helper")]
    UnresolvedReference { key: String, target: String },

    #[error("backend '{0}' is listed more than once")]
    DuplicateBackend(BackendKind),

    #[error("a definition named '{0}' is already registered")]
    DuplicateDefinition(String),
}
