//! Integration tests for reactive instance-record maintenance.
//!
//! Objects are saved and deleted through the resolver's hooks; the tests
//! then check both the stored records and what resolution sees.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::*;
use metahead::backend::linkage::{PopulateSummary, SaveOutcome};
use metahead::backend::{
    LinkageError, LinkedObjectHandler, LinkedObjects, MemoryStore, ObjectTable, RecordIdentity,
};
use metahead::core::types::{ObjectId, ObjectRef, ObjectType};
use metahead::definition::{BackendKind, DefinitionOptions};
use metahead::resolve::{RequestScope, ResolveError, Resolver};

fn instance_paths(store: &MemoryStore) -> Vec<(u64, String)> {
    let mut paths: Vec<(u64, String)> = store
        .records()
        .into_iter()
        .filter_map(|r| match r.identity {
            RecordIdentity::Instance {
                path, linked_id, ..
            } => Some((linked_id, path)),
            _ => None,
        })
        .collect();
    paths.sort();
    paths
}

#[test]
fn saving_creates_then_tracks_the_path() {
    let pages = ObjectTable::new();
    pages.insert(1, Some("/p/1/"), json!({ "title": "One" }));
    let store = MemoryStore::new();
    let resolver = resolver(coverage(options()), &store, &pages);

    let reports = resolver.object_saved(&page(1)).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, SaveOutcome::Created);
    assert_eq!(instance_paths(&store), vec![(1, "/p/1/".to_string())]);

    let reports = resolver.object_saved(&page(1)).unwrap();
    assert_eq!(reports[0].outcome, SaveOutcome::Unchanged);

    pages.set_path(1, Some("/pages/one/"));
    let reports = resolver.object_saved(&page(1)).unwrap();
    assert_eq!(reports[0].outcome, SaveOutcome::Updated);
    assert_eq!(instance_paths(&store), vec![(1, "/pages/one/".to_string())]);
}

#[test]
fn created_records_are_found_at_the_new_path() {
    let pages = ObjectTable::new();
    pages.insert(1, Some("/p/1/"), json!({ "title": "One" }));
    let store = MemoryStore::with_records([for_type().value("title", "Page {{ page.title }}")])
        .unwrap();
    let resolver = resolver(coverage(options()), &store, &pages);

    let before = resolver
        .resolve(None, "/p/1/", &RequestScope::new())
        .unwrap();
    assert_eq!(before.value("title").unwrap(), None);

    resolver.object_saved(&page(1)).unwrap();
    let after = resolver
        .resolve(None, "/p/1/", &RequestScope::new())
        .unwrap();
    assert_eq!(after.value("title").unwrap(), Some("Page One"));
}

#[test]
fn objects_without_a_path_are_skipped() {
    let pages = ObjectTable::new();
    pages.insert(1, None, json!({}));
    let store = MemoryStore::new();
    let resolver = resolver(coverage(options()), &store, &pages);

    let reports = resolver.object_saved(&page(1)).unwrap();
    assert_eq!(reports[0].outcome, SaveOutcome::NoPath);
    assert!(store.is_empty());
}

#[test]
fn colliding_records_are_relocated() {
    let pages = ObjectTable::new();
    pages.insert(1, Some("/p/1/"), json!({}));
    pages.insert(2, Some("/p/2/"), json!({}));
    pages.insert(3, None, json!({}));
    let store = MemoryStore::with_records([
        for_instance("/p/1/", 2).value("title", "Stale two"),
        for_instance("/p/1/", 3).value("title", "Stale three"),
    ])
    .unwrap();
    let resolver = resolver(coverage(options()), &store, &pages);

    let reports = resolver.object_saved(&page(1)).unwrap();
    assert_eq!(reports[0].outcome, SaveOutcome::Created);
    assert_eq!(reports[0].relocated, 2);
    assert_eq!(
        instance_paths(&store),
        vec![
            (1, "/p/1/".to_string()),
            (2, "/p/2/".to_string()),
            (3, String::new()),
        ]
    );
}

#[test]
fn unlinked_types_are_ignored() {
    let posts = ObjectTable::new();
    posts.insert(1, Some("/posts/1/"), json!({}));
    let mut objects = LinkedObjects::new();
    objects.register(ObjectType::new("post").unwrap(), posts);
    let store = MemoryStore::new();
    let resolver = Resolver::new(registry(coverage(options())), Arc::new(store.clone()))
        .with_linked_objects(objects);

    let post = ObjectRef::new(ObjectType::new("post").unwrap(), 1);
    let reports = resolver.object_saved(&post).unwrap();
    assert_eq!(reports[0].outcome, SaveOutcome::Skipped);
    assert_eq!(resolver.object_deleted(&post).unwrap(), 0);
    assert!(store.is_empty());
}

#[test]
fn instance_backend_disabled_means_no_records() {
    let pages = ObjectTable::new();
    pages.insert(1, Some("/p/1/"), json!({}));
    let store = MemoryStore::new();
    let options = DefinitionOptions {
        backends: vec![BackendKind::Path, BackendKind::View],
        ..options()
    };
    let resolver = resolver(coverage(options), &store, &pages);

    let reports = resolver.object_saved(&page(1)).unwrap();
    assert_eq!(reports[0].outcome, SaveOutcome::Skipped);
    assert!(store.is_empty());
}

#[test]
fn deleting_removes_the_record_once() {
    let pages = ObjectTable::new();
    pages.insert(1, Some("/p/1/"), json!({}));
    let store = MemoryStore::new();
    let resolver = resolver(coverage(options()), &store, &pages);

    resolver.object_saved(&page(1)).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(resolver.object_deleted(&page(1)).unwrap(), 1);
    assert_eq!(resolver.object_deleted(&page(1)).unwrap(), 0);
    assert!(store.is_empty());
}

struct BrokenPages;

impl LinkedObjectHandler for BrokenPages {
    fn path_for(&self, id: ObjectId) -> Result<Option<String>, LinkageError> {
        Err(LinkageError::Developer {
            object: page(id),
            message: "no route for page".to_string(),
        })
    }
}

#[test]
fn path_failures_reach_the_caller() {
    let mut objects = LinkedObjects::new();
    objects.register(page_type(), BrokenPages);
    let store = MemoryStore::new();
    let resolver = Resolver::new(registry(coverage(options())), Arc::new(store.clone()))
        .with_linked_objects(objects);

    let err = resolver.object_saved(&page(1)).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Linkage(LinkageError::Developer { .. })
    ));
    assert!(store.is_empty());
}

#[test]
fn missing_handlers_are_errors() {
    let store = MemoryStore::new();
    let resolver = Resolver::new(registry(coverage(options())), Arc::new(store));

    let err = resolver.object_saved(&page(1)).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Linkage(LinkageError::NoHandler(_))
    ));
}

#[test]
fn populate_all_counts_outcomes() {
    let pages = ObjectTable::new();
    pages.insert(1, Some("/p/1/"), json!({}));
    pages.insert(2, Some("/p/2/"), json!({}));
    pages.insert(3, None, json!({}));
    let store = MemoryStore::new();
    let resolver = resolver(coverage(options()), &store, &pages);
    resolver.object_saved(&page(2)).unwrap();

    let post = ObjectRef::new(ObjectType::new("post").unwrap(), 9);
    let summary = resolver
        .populate_all(None, &[page(1), page(2), page(3), post])
        .unwrap();
    assert_eq!(
        summary,
        PopulateSummary {
            created: 1,
            unchanged: 1,
            without_path: 1,
            skipped: 1,
            ..Default::default()
        }
    );
    assert_eq!(store.len(), 2);
}
