//! backend
//!
//! Record sources consulted while resolving metadata.
//!
//! # Modules
//!
//! - [`chain`] - Ordered, memoized candidate lookup across backends
//! - [`linkage`] - Save/delete hooks that maintain instance records
//! - [`memory`] - In-memory [`RecordStore`] for tests and fixtures
//! - [`routes`] - Path to view name resolution
//!
//! # Records
//!
//! Each enabled backend of a definition owns one table of [`Record`]s. The
//! record's [`RecordIdentity`] says which table it lives in and what it is
//! keyed by. Persistence itself sits behind the [`RecordStore`] trait;
//! the resolver only needs simple get/filter/create/save/delete calls.

pub mod chain;
pub mod linkage;
pub mod memory;
pub mod routes;

pub use chain::{Candidate, CandidateChain, Lookup};
pub use linkage::{LinkageError, LinkedObjectHandler, LinkedObjects, ObjectTable};
pub use memory::MemoryStore;
pub use routes::{NoRoutes, RouteResolver, StaticRoutes};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::types::{Language, ObjectId, ObjectRef, ObjectType, RecordId, SiteId, ViewName};
use crate::definition::BackendKind;

/// Errors from record store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The record does not exist.
    #[error("record {0} not found")]
    NotFound(RecordId),

    /// The write would break a uniqueness constraint.
    #[error("uniqueness violation: {0}")]
    Conflict(String),

    /// Fixture data could not be parsed.
    #[error("invalid fixture: {0}")]
    Fixture(String),

    /// The store could not be reached or failed internally.
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// How a nullable column is matched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldMatch<T> {
    /// No restriction.
    #[default]
    Any,
    /// The column must be null.
    Null,
    /// The column must equal the value.
    Eq(T),
    /// The column must equal the value or be null.
    EqOrNull(T),
}

impl<T: PartialEq> FieldMatch<T> {
    /// Whether a column value satisfies this match.
    pub fn matches(&self, value: Option<&T>) -> bool {
        match self {
            FieldMatch::Any => true,
            FieldMatch::Null => value.is_none(),
            FieldMatch::Eq(expected) => value == Some(expected),
            FieldMatch::EqOrNull(expected) => value.is_none() || value == Some(expected),
        }
    }
}

/// What a record is keyed by. The variant determines the backend table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum RecordIdentity {
    /// Path-level record.
    Path { path: String },
    /// Record linked to one object. `path` mirrors the object's own path and
    /// may be empty after the record was relocated.
    #[serde(rename = "model_instance")]
    Instance {
        path: String,
        linked_type: ObjectType,
        linked_id: ObjectId,
    },
    /// Record shared by all objects of a type.
    #[serde(rename = "model")]
    Type { linked_type: ObjectType },
    /// Record attached to a routed view.
    View { view_name: ViewName },
}

impl RecordIdentity {
    /// The backend table this identity belongs to.
    pub fn backend(&self) -> BackendKind {
        match self {
            RecordIdentity::Path { .. } => BackendKind::Path,
            RecordIdentity::Instance { .. } => BackendKind::ModelInstance,
            RecordIdentity::Type { .. } => BackendKind::Model,
            RecordIdentity::View { .. } => BackendKind::View,
        }
    }

    /// The stored path, for path and instance records.
    pub fn path(&self) -> Option<&str> {
        match self {
            RecordIdentity::Path { path } | RecordIdentity::Instance { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The linked object, for instance records.
    pub fn linked(&self) -> Option<ObjectRef> {
        match self {
            RecordIdentity::Instance {
                linked_type,
                linked_id,
                ..
            } => Some(ObjectRef::new(linked_type.clone(), *linked_id)),
            _ => None,
        }
    }

    /// The key that must be unique within a site/language scope.
    fn unique_key(&self) -> String {
        match self {
            RecordIdentity::Path { path } => path.clone(),
            RecordIdentity::Instance {
                linked_type,
                linked_id,
                ..
            } => format!("{linked_type}#{linked_id}"),
            RecordIdentity::Type { linked_type } => linked_type.to_string(),
            RecordIdentity::View { view_name } => view_name.to_string(),
        }
    }
}

/// A persisted row of metadata values for one backend of one definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identity.
    pub id: RecordId,
    /// Name of the owning definition.
    pub definition: String,
    /// Table and key.
    #[serde(flatten)]
    pub identity: RecordIdentity,
    /// Site scope; `None` applies to every site.
    #[serde(default)]
    pub site: Option<SiteId>,
    /// Language scope.
    #[serde(default)]
    pub language: Option<Language>,
    /// Editable field values by field key.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl Record {
    /// The backend table this record lives in.
    pub fn backend(&self) -> BackendKind {
        self.identity.backend()
    }

    /// A stored field value that is non-empty after trimming.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Whether two records occupy the same unique slot.
    pub(crate) fn collides_with(&self, other: &NewRecord) -> bool {
        self.definition == other.definition
            && self.backend() == other.identity.backend()
            && self.identity.unique_key() == other.identity.unique_key()
            && self.site == other.site
            && self.language == other.language
    }
}

/// A record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    /// Name of the owning definition.
    pub definition: String,
    /// Table and key.
    #[serde(flatten)]
    pub identity: RecordIdentity,
    /// Site scope.
    #[serde(default)]
    pub site: Option<SiteId>,
    /// Language scope.
    #[serde(default)]
    pub language: Option<Language>,
    /// Editable field values by field key.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl NewRecord {
    /// An unscoped record with no values.
    pub fn new(definition: impl Into<String>, identity: RecordIdentity) -> Self {
        Self {
            definition: definition.into(),
            identity,
            site: None,
            language: None,
            values: BTreeMap::new(),
        }
    }

    /// Set a field value.
    pub fn value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Scope the record to a site.
    pub fn site(mut self, site: SiteId) -> Self {
        self.site = Some(site);
        self
    }

    /// Scope the record to a language.
    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Attach a store-assigned id.
    pub fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            definition: self.definition,
            identity: self.identity,
            site: self.site,
            language: self.language,
            values: self.values,
        }
    }
}

/// Selection criteria for record lookups.
///
/// Identity columns match by equality when set. Site and language use
/// [`FieldMatch`] so callers can ask for null-scoped records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    pub definition: String,
    pub backend: BackendKind,
    pub path: Option<String>,
    pub linked_type: Option<ObjectType>,
    pub linked_id: Option<ObjectId>,
    pub view_name: Option<ViewName>,
    pub site: FieldMatch<SiteId>,
    pub language: FieldMatch<Language>,
}

impl Criteria {
    /// Match every record of one backend table.
    pub fn new(definition: impl Into<String>, backend: BackendKind) -> Self {
        Self {
            definition: definition.into(),
            backend,
            path: None,
            linked_type: None,
            linked_id: None,
            view_name: None,
            site: FieldMatch::Any,
            language: FieldMatch::Any,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Match one linked object (type and id).
    pub fn linked(mut self, object: &ObjectRef) -> Self {
        self.linked_type = Some(object.object_type.clone());
        self.linked_id = Some(object.id);
        self
    }

    pub fn linked_type(mut self, linked_type: ObjectType) -> Self {
        self.linked_type = Some(linked_type);
        self
    }

    pub fn view_name(mut self, view_name: ViewName) -> Self {
        self.view_name = Some(view_name);
        self
    }

    pub fn site(mut self, site: FieldMatch<SiteId>) -> Self {
        self.site = site;
        self
    }

    pub fn language(mut self, language: FieldMatch<Language>) -> Self {
        self.language = language;
        self
    }

    /// Whether a record satisfies every criterion.
    pub fn matches(&self, record: &Record) -> bool {
        if record.definition != self.definition || record.backend() != self.backend {
            return false;
        }
        if let Some(path) = &self.path {
            if record.identity.path() != Some(path.as_str()) {
                return false;
            }
        }
        match &record.identity {
            RecordIdentity::Instance {
                linked_type,
                linked_id,
                ..
            } => {
                if self.linked_type.as_ref().is_some_and(|t| t != linked_type)
                    || self.linked_id.is_some_and(|id| id != *linked_id)
                {
                    return false;
                }
            }
            RecordIdentity::Type { linked_type } => {
                if self.linked_type.as_ref().is_some_and(|t| t != linked_type) {
                    return false;
                }
            }
            RecordIdentity::View { view_name } => {
                if self.view_name.as_ref().is_some_and(|v| v != view_name) {
                    return false;
                }
            }
            RecordIdentity::Path { .. } => {}
        }
        self.site.matches(record.site.as_ref()) && self.language.matches(record.language.as_ref())
    }
}

/// Persistence for metadata records.
///
/// Implementations must be safe to share across threads. Lookups that find
/// nothing return `Ok(None)` or an empty list, never an error.
pub trait RecordStore: Send + Sync {
    /// The first record matching the criteria.
    fn get(&self, criteria: &Criteria) -> Result<Option<Record>, StoreError>;

    /// Every record matching the criteria, in id order.
    fn filter(&self, criteria: &Criteria) -> Result<Vec<Record>, StoreError>;

    /// Store a new record and return it with its assigned id.
    fn create(&self, record: NewRecord) -> Result<Record, StoreError>;

    /// Overwrite an existing record.
    fn save(&self, record: &Record) -> Result<(), StoreError>;

    /// Remove a record.
    fn delete(&self, id: RecordId) -> Result<(), StoreError>;
}
