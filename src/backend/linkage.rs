//! backend::linkage
//!
//! Keeps instance records in step with the objects they describe.
//!
//! # Hooks
//!
//! The host calls [`on_saved`] after an object is saved and [`on_deleted`]
//! after it is deleted. Both are idempotent and only act for object types
//! listed in the definition's `seo_models`.
//!
//! On save:
//! 1. Compute the object's path through its [`LinkedObjectHandler`].
//!    Objects without a path are skipped.
//! 2. Any instance record already sitting at that path but linked to a
//!    different object is moved to that object's own path (or to `""` if
//!    it has none or it is the same path).
//! 3. The instance record for the object is created, or its path updated.
//!
//! # Example
//!
//! ```
//! use metahead::backend::linkage::{on_saved, SaveOutcome};
//! use metahead::backend::{LinkedObjects, MemoryStore, ObjectTable};
//! use metahead::core::types::{ObjectRef, ObjectType};
//! use metahead::definition::{DefinitionBuilder, DefinitionOptions, FieldDefinition};
//!
//! let page = ObjectType::new("page").unwrap();
//! let definition = DefinitionBuilder::new("Site")
//!     .field("title", FieldDefinition::tag())
//!     .options(DefinitionOptions { seo_models: vec![page.clone()], ..Default::default() })
//!     .build()
//!     .unwrap();
//!
//! let pages = ObjectTable::new();
//! pages.insert(1, Some("/pages/1/"), serde_json::json!({ "title": "One" }));
//! let mut objects = LinkedObjects::new();
//! objects.register(page.clone(), pages);
//!
//! let store = MemoryStore::new();
//! let report = on_saved(&definition, &store, &objects, &ObjectRef::new(page, 1)).unwrap();
//! assert_eq!(report.outcome, SaveOutcome::Created);
//! assert_eq!(store.len(), 1);
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{Criteria, NewRecord, RecordIdentity, RecordStore, StoreError};
use crate::core::types::{ObjectId, ObjectRef, ObjectType};
use crate::definition::{BackendKind, CompiledDefinition};

/// Errors from linkage hooks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkageError {
    /// The host failed to compute an object's path.
    #[error("could not compute the path of {object}: {message}")]
    Developer { object: ObjectRef, message: String },

    /// No handler is registered for a linked object type.
    #[error("no handler registered for object type '{0}'")]
    NoHandler(ObjectType),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Host-side knowledge about objects of one type.
pub trait LinkedObjectHandler: Send + Sync {
    /// The object's public path, or `None` if it has none.
    fn path_for(&self, id: ObjectId) -> Result<Option<String>, LinkageError>;

    /// The value exposed to substitution templates for this object.
    fn template_value(&self, _id: ObjectId) -> Option<Value> {
        None
    }
}

/// Handlers for every linked object type, keyed by type.
#[derive(Clone, Default)]
pub struct LinkedObjects {
    handlers: HashMap<ObjectType, Arc<dyn LinkedObjectHandler>>,
}

impl std::fmt::Debug for LinkedObjects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedObjects")
            .field("types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LinkedObjects {
    /// Create an empty handler registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for an object type, replacing any previous one.
    pub fn register(&mut self, object_type: ObjectType, handler: impl LinkedObjectHandler + 'static) {
        self.handlers.insert(object_type, Arc::new(handler));
    }

    /// Whether a handler is registered for the type.
    pub fn handles(&self, object_type: &ObjectType) -> bool {
        self.handlers.contains_key(object_type)
    }

    /// Compute an object's path. Empty paths count as no path.
    pub fn path_for(&self, object: &ObjectRef) -> Result<Option<String>, LinkageError> {
        let handler = self
            .handlers
            .get(&object.object_type)
            .ok_or_else(|| LinkageError::NoHandler(object.object_type.clone()))?;
        Ok(handler.path_for(object.id)?.filter(|p| !p.is_empty()))
    }

    /// The template value for an object, if its handler provides one.
    pub fn template_value(&self, object: &ObjectRef) -> Option<Value> {
        self.handlers
            .get(&object.object_type)
            .and_then(|h| h.template_value(object.id))
    }
}

#[derive(Debug, Clone)]
struct TableEntry {
    path: Option<String>,
    value: Value,
}

/// A [`LinkedObjectHandler`] over an in-memory table of objects.
///
/// Clones share the table, so objects can be changed after the handler
/// is registered.
#[derive(Debug, Clone, Default)]
pub struct ObjectTable {
    entries: Arc<RwLock<HashMap<ObjectId, TableEntry>>>,
}

impl ObjectTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    pub fn insert(&self, id: ObjectId, path: Option<&str>, value: Value) {
        let entry = TableEntry {
            path: path.map(str::to_string),
            value,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, entry);
    }

    /// Change an object's path.
    pub fn set_path(&self, id: ObjectId, path: Option<&str>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(&id) {
            entry.path = path.map(str::to_string);
        }
    }

    /// Remove an object.
    pub fn remove(&self, id: ObjectId) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

impl LinkedObjectHandler for ObjectTable {
    fn path_for(&self, id: ObjectId) -> Result<Option<String>, LinkageError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(&id).and_then(|e| e.path.clone()))
    }

    fn template_value(&self, id: ObjectId) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&id).map(|e| e.value.clone())
    }
}

/// What the save hook did with the object's own record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The type is not linked, or instance records are disabled.
    Skipped,
    /// The object has no path.
    NoPath,
    /// A new instance record was created.
    Created,
    /// Existing instance records got the new path.
    Updated,
    /// Existing instance records already had the path.
    Unchanged,
}

/// Result of the save hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub outcome: SaveOutcome,
    /// Records of other objects moved off the object's path.
    pub relocated: usize,
}

impl SaveReport {
    fn new(outcome: SaveOutcome) -> Self {
        Self {
            outcome,
            relocated: 0,
        }
    }
}

fn maintains(definition: &CompiledDefinition, object_type: &ObjectType) -> bool {
    definition.options().uses(BackendKind::ModelInstance) && definition.options().links(object_type)
}

/// Create or update the instance record of a saved object.
///
/// # Errors
///
/// Propagates path computation failures and store errors.
pub fn on_saved(
    definition: &CompiledDefinition,
    store: &dyn RecordStore,
    objects: &LinkedObjects,
    object: &ObjectRef,
) -> Result<SaveReport, LinkageError> {
    if !maintains(definition, &object.object_type) {
        return Ok(SaveReport::new(SaveOutcome::Skipped));
    }
    let Some(path) = objects.path_for(object)? else {
        debug!(definition = definition.name(), %object, "object has no path; skipping");
        return Ok(SaveReport::new(SaveOutcome::NoPath));
    };

    let name = definition.name();
    let mut relocated = 0;
    let at_path = Criteria::new(name, BackendKind::ModelInstance).path(path.clone());
    for mut record in store.filter(&at_path)? {
        let Some(other) = record.identity.linked() else {
            continue;
        };
        if &other == object {
            continue;
        }
        let new_path = match objects.path_for(&other) {
            Ok(Some(p)) if p != path => p,
            Ok(_) | Err(LinkageError::NoHandler(_)) => String::new(),
            Err(e) => return Err(e),
        };
        warn!(
            definition = name,
            path = %path,
            record = %record.id,
            %other,
            new_path = %new_path,
            "relocating instance record linked to another object"
        );
        set_path(&mut record.identity, new_path);
        store.save(&record)?;
        relocated += 1;
    }

    let own = Criteria::new(name, BackendKind::ModelInstance).linked(object);
    let existing = store.filter(&own)?;
    let outcome = if existing.is_empty() {
        let record = store.create(NewRecord::new(
            name,
            RecordIdentity::Instance {
                path: path.clone(),
                linked_type: object.object_type.clone(),
                linked_id: object.id,
            },
        ))?;
        info!(definition = name, %object, path = %path, record = %record.id, "created instance record");
        SaveOutcome::Created
    } else {
        let mut changed = false;
        for mut record in existing {
            if record.identity.path() == Some(path.as_str()) {
                continue;
            }
            set_path(&mut record.identity, path.clone());
            store.save(&record)?;
            changed = true;
        }
        if changed {
            info!(definition = name, %object, path = %path, "updated instance record path");
            SaveOutcome::Updated
        } else {
            SaveOutcome::Unchanged
        }
    };

    Ok(SaveReport { outcome, relocated })
}

fn set_path(identity: &mut RecordIdentity, new_path: String) {
    if let RecordIdentity::Instance { path, .. } = identity {
        *path = new_path;
    }
}

/// Delete the instance records of a deleted object.
///
/// Returns the number of records removed. Records that are already gone
/// are not an error.
pub fn on_deleted(
    definition: &CompiledDefinition,
    store: &dyn RecordStore,
    object: &ObjectRef,
) -> Result<usize, LinkageError> {
    if !maintains(definition, &object.object_type) {
        return Ok(0);
    }
    let own = Criteria::new(definition.name(), BackendKind::ModelInstance).linked(object);
    let mut removed = 0;
    for record in store.filter(&own)? {
        match store.delete(record.id) {
            Ok(()) => removed += 1,
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    if removed > 0 {
        info!(definition = definition.name(), %object, removed, "deleted instance records");
    }
    Ok(removed)
}

/// Counts from a bulk [`populate_all`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub without_path: usize,
    pub relocated: usize,
}

/// Run the save hook for every object, e.g. after enabling a definition
/// for existing content.
pub fn populate_all<'o>(
    definition: &CompiledDefinition,
    store: &dyn RecordStore,
    objects: &LinkedObjects,
    items: impl IntoIterator<Item = &'o ObjectRef>,
) -> Result<PopulateSummary, LinkageError> {
    let mut summary = PopulateSummary::default();
    for object in items {
        let report = on_saved(definition, store, objects, object)?;
        summary.relocated += report.relocated;
        match report.outcome {
            SaveOutcome::Created => summary.created += 1,
            SaveOutcome::Updated => summary.updated += 1,
            SaveOutcome::Unchanged => summary.unchanged += 1,
            SaveOutcome::Skipped => summary.skipped += 1,
            SaveOutcome::NoPath => summary.without_path += 1,
        }
    }
    Ok(summary)
}
