//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use metahead::backend::{LinkedObjects, MemoryStore, NewRecord, ObjectTable, RecordIdentity};
use metahead::core::types::{ObjectRef, ObjectType, ViewName};
use metahead::definition::{
    CompiledDefinition, DefinitionBuilder, DefinitionOptions, FieldDefinition, PopulateFrom,
    Registry,
};
use metahead::resolve::Resolver;

pub const DEFINITION: &str = "Coverage";

/// A definition touching every field kind and fallback rule.
pub fn coverage(options: DefinitionOptions) -> CompiledDefinition {
    DefinitionBuilder::new(DEFINITION)
        .field("title", FieldDefinition::tag().head(true).max_length(68))
        .field("heading", FieldDefinition::tag().with_name("h1"))
        .field("description", FieldDefinition::meta_tag())
        .field("keywords", FieldDefinition::keyword_tag())
        .field("raw1", FieldDefinition::raw())
        .field("raw2", FieldDefinition::raw().head(false))
        .field(
            "example_literal",
            FieldDefinition::tag()
                .head(false)
                .populate_from(PopulateFrom::literal("example literal")),
        )
        .field(
            "og_title",
            FieldDefinition::meta_tag()
                .with_name("og:title")
                .editable(false)
                .populate_from(PopulateFrom::field("title")),
        )
        .group("advanced", ["raw1", "raw2"])
        .options(options)
        .build()
        .unwrap()
}

pub fn page_type() -> ObjectType {
    ObjectType::new("page").unwrap()
}

pub fn page(id: u64) -> ObjectRef {
    ObjectRef::new(page_type(), id)
}

pub fn options() -> DefinitionOptions {
    DefinitionOptions {
        seo_models: vec![page_type()],
        ..Default::default()
    }
}

pub fn at_path(path: &str) -> NewRecord {
    NewRecord::new(DEFINITION, RecordIdentity::Path { path: path.into() })
}

pub fn for_instance(path: &str, id: u64) -> NewRecord {
    NewRecord::new(
        DEFINITION,
        RecordIdentity::Instance {
            path: path.into(),
            linked_type: page_type(),
            linked_id: id,
        },
    )
}

pub fn for_type() -> NewRecord {
    NewRecord::new(
        DEFINITION,
        RecordIdentity::Type {
            linked_type: page_type(),
        },
    )
}

pub fn for_view(view: &str) -> NewRecord {
    NewRecord::new(
        DEFINITION,
        RecordIdentity::View {
            view_name: ViewName::new(view).unwrap(),
        },
    )
}

pub fn registry(definition: CompiledDefinition) -> Arc<Registry> {
    let mut registry = Registry::new();
    registry.register(definition).unwrap();
    Arc::new(registry)
}

/// A resolver over `store` with a `page` object table.
pub fn resolver(definition: CompiledDefinition, store: &MemoryStore, pages: &ObjectTable) -> Resolver {
    let mut objects = LinkedObjects::new();
    objects.register(page_type(), pages.clone());
    Resolver::new(registry(definition), Arc::new(store.clone())).with_linked_objects(objects)
}
