//! backend::memory
//!
//! In-memory record store.
//!
//! # Design
//!
//! `MemoryStore` keeps records in a map behind `Arc<Mutex<...>>`, so clones
//! share state. Every call is recorded, which lets tests assert how many
//! lookups a resolution performed, and a single operation can be configured
//! to fail. Records can be seeded from JSON fixtures.
//!
//! # Example
//!
//! ```
//! use metahead::backend::memory::MemoryStore;
//! use metahead::backend::{Criteria, NewRecord, RecordIdentity, RecordStore};
//! use metahead::definition::BackendKind;
//!
//! let store = MemoryStore::new();
//! store
//!     .create(NewRecord::new("Site", RecordIdentity::Path { path: "/".into() }).value("title", "Home"))
//!     .unwrap();
//!
//! let found = store
//!     .get(&Criteria::new("Site", BackendKind::Path).path("/"))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(found.value("title"), Some("Home"));
//! assert_eq!(store.lookup_count(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Criteria, NewRecord, Record, RecordStore, StoreError};
use crate::core::types::RecordId;
use crate::definition::BackendKind;

/// In-memory [`RecordStore`].
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    records: BTreeMap<RecordId, Record>,
    next_id: u64,
    fail_on: Option<FailOn>,
    operations: Vec<StoreOperation>,
}

/// Which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    Get(StoreError),
    Filter(StoreError),
    Create(StoreError),
    Save(StoreError),
    Delete(StoreError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Get { backend: BackendKind },
    Filter { backend: BackendKind },
    Create { backend: BackendKind },
    Save { id: RecordId },
    Delete { id: RecordId },
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with records. Ids are assigned in order.
    pub fn with_records(records: impl IntoIterator<Item = NewRecord>) -> Result<Self, StoreError> {
        let store = Self::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    /// Create a store from a JSON array of records.
    ///
    /// Each element has `definition`, `backend` and the backend's identity
    /// columns, plus optional `site`, `language` and `values`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Fixture` if the JSON does not parse, or
    /// `StoreError::Conflict` if two records occupy the same slot.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let records: Vec<NewRecord> =
            serde_json::from_str(json).map_err(|e| StoreError::Fixture(e.to_string()))?;
        Self::with_records(records)
    }

    /// Configure one operation to fail.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// All recorded operations.
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.lock().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Number of `get` and `filter` calls made so far.
    pub fn lookup_count(&self) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, StoreOperation::Get { .. } | StoreOperation::Filter { .. }))
            .count()
    }

    /// Every stored record, in id order.
    pub fn records(&self) -> Vec<Record> {
        self.lock().records.values().cloned().collect()
    }

    /// A stored record by id.
    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.lock().records.get(&id).cloned()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_op(&self, op: StoreOperation) {
        self.lock().operations.push(op);
    }

    fn check_fail(&self, expected: &str) -> Result<(), StoreError> {
        let inner = self.lock();
        match &inner.fail_on {
            Some(FailOn::Get(e)) if expected == "get" => Err(e.clone()),
            Some(FailOn::Filter(e)) if expected == "filter" => Err(e.clone()),
            Some(FailOn::Create(e)) if expected == "create" => Err(e.clone()),
            Some(FailOn::Save(e)) if expected == "save" => Err(e.clone()),
            Some(FailOn::Delete(e)) if expected == "delete" => Err(e.clone()),
            _ => Ok(()),
        }
    }

    fn insert(&self, record: NewRecord) -> Result<Record, StoreError> {
        let mut inner = self.lock();
        if let Some(existing) = inner.records.values().find(|r| r.collides_with(&record)) {
            return Err(StoreError::Conflict(format!(
                "record {} already holds this slot",
                existing.id
            )));
        }
        inner.next_id += 1;
        let record = record.into_record(RecordId(inner.next_id));
        inner.records.insert(record.id, record.clone());
        Ok(record)
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, criteria: &Criteria) -> Result<Option<Record>, StoreError> {
        self.record_op(StoreOperation::Get {
            backend: criteria.backend,
        });
        self.check_fail("get")?;

        let inner = self.lock();
        Ok(inner.records.values().find(|r| criteria.matches(r)).cloned())
    }

    fn filter(&self, criteria: &Criteria) -> Result<Vec<Record>, StoreError> {
        self.record_op(StoreOperation::Filter {
            backend: criteria.backend,
        });
        self.check_fail("filter")?;

        let inner = self.lock();
        Ok(inner
            .records
            .values()
            .filter(|r| criteria.matches(r))
            .cloned()
            .collect())
    }

    fn create(&self, record: NewRecord) -> Result<Record, StoreError> {
        self.record_op(StoreOperation::Create {
            backend: record.identity.backend(),
        });
        self.check_fail("create")?;
        self.insert(record)
    }

    fn save(&self, record: &Record) -> Result<(), StoreError> {
        self.record_op(StoreOperation::Save { id: record.id });
        self.check_fail("save")?;

        let mut inner = self.lock();
        if !inner.records.contains_key(&record.id) {
            return Err(StoreError::NotFound(record.id));
        }
        let candidate = NewRecord {
            definition: record.definition.clone(),
            identity: record.identity.clone(),
            site: record.site,
            language: record.language.clone(),
            values: BTreeMap::new(),
        };
        if let Some(other) = inner
            .records
            .values()
            .find(|r| r.id != record.id && r.collides_with(&candidate))
        {
            return Err(StoreError::Conflict(format!(
                "record {} already holds this slot",
                other.id
            )));
        }
        inner.records.insert(record.id, record.clone());
        Ok(())
    }

    fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        self.record_op(StoreOperation::Delete { id });
        self.check_fail("delete")?;

        self.lock()
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
