//! resolve
//!
//! The value resolver: turns a request path into per-field metadata.
//!
//! # Algorithm
//!
//! For each field of the definition, in declaration order:
//!
//! 1. With caching enabled, a cached entry wins (`""` means nothing).
//! 2. Editable fields walk the candidate chain; the first record whose
//!    stored value is non-empty after trimming supplies the value. Values
//!    from instance, type and view records containing `{` are rendered as
//!    templates first.
//! 3. Otherwise the field's `populate_from` rule applies: a literal is used
//!    verbatim, a callable or named helper is invoked, a field reference
//!    resolves that field. Reference cycles resolve to nothing.
//!
//! The result is a [`ResolvedMetadata`] that renders single fields, groups
//! and the whole head block.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use metahead::backend::{MemoryStore, NewRecord, RecordIdentity};
//! use metahead::definition::{default_definition, Registry};
//! use metahead::resolve::{RequestScope, Resolver};
//!
//! let mut registry = Registry::new();
//! registry.register(default_definition()).unwrap();
//!
//! let store = MemoryStore::with_records([NewRecord::new(
//!     "DefaultMetadata",
//!     RecordIdentity::Path { path: "/about/".into() },
//! )
//! .value("title", "About us")
//! .value("description", "Who we are")])
//! .unwrap();
//!
//! let resolver = Resolver::new(Arc::new(registry), Arc::new(store));
//! let metadata = resolver.resolve(None, "/about/", &RequestScope::new()).unwrap();
//!
//! assert_eq!(metadata.get("title").unwrap(), "<title>About us</title>");
//! assert_eq!(metadata.value("heading").unwrap(), None);
//! assert_eq!(
//!     metadata.to_string(),
//!     "<title>About us</title>\n\n<meta name=\"description\" content=\"Who we are\" />"
//! );
//! ```

pub mod template;

pub use template::{LiquidRenderer, TemplateError, TemplateRenderer};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::linkage::{self, PopulateSummary, SaveReport};
use crate::backend::{
    Candidate, CandidateChain, LinkageError, LinkedObjects, Lookup, NoRoutes, RecordStore,
    RouteResolver, StoreError,
};
use crate::cache::{CacheKeys, CacheStore};
use crate::core::types::{Language, ObjectRef, Site};
use crate::definition::{
    BackendKind, CompiledDefinition, FieldDefinition, PopulateFrom, Registry, RegistryError,
};

/// Errors from resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The name is neither a field nor a group of the definition.
    #[error("'{name}' is not a field or group of metadata definition '{definition}'")]
    UnknownField { definition: String, name: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Linkage(#[from] LinkageError),
}

/// Per-request inputs besides the path.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    /// Current site.
    pub site: Option<Site>,
    /// Current language.
    pub language: Option<Language>,
    /// Variables for view-level templates.
    pub context: Option<Map<String, Value>>,
}

impl RequestScope {
    /// An empty scope: no site, no language, no context.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site(mut self, site: Site) -> Self {
        self.site = Some(site);
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = Some(context);
        self
    }
}

/// Resolves metadata for paths and linked objects.
///
/// Holds only shared, immutable collaborators; one resolver can serve
/// concurrent requests.
pub struct Resolver {
    registry: Arc<Registry>,
    store: Arc<dyn RecordStore>,
    routes: Arc<dyn RouteResolver>,
    objects: Arc<LinkedObjects>,
    renderer: Arc<dyn TemplateRenderer>,
    cache: Option<Arc<dyn CacheStore>>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("definitions", &self.registry.len())
            .field("objects", &self.objects)
            .field("cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

/// Mutable state of one resolution.
struct Run<'a> {
    definition: &'a CompiledDefinition,
    chain: CandidateChain<'a>,
    keys: Option<&'a CacheKeys>,
    scope: &'a RequestScope,
    memo: HashMap<String, Option<String>>,
    visiting: Vec<String>,
}

impl Resolver {
    /// A resolver with no routes, no linked objects, Liquid templates and
    /// no cache.
    pub fn new(registry: Arc<Registry>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            registry,
            store,
            routes: Arc::new(NoRoutes),
            objects: Arc::new(LinkedObjects::new()),
            renderer: Arc::new(LiquidRenderer::new()),
            cache: None,
        }
    }

    pub fn with_routes(mut self, routes: impl RouteResolver + 'static) -> Self {
        self.routes = Arc::new(routes);
        self
    }

    pub fn with_linked_objects(mut self, objects: LinkedObjects) -> Self {
        self.objects = Arc::new(objects);
        self
    }

    pub fn with_renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Use a cache for definitions with `use_cache`.
    pub fn with_cache(mut self, cache: impl CacheStore + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// The definitions this resolver serves.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve metadata for a request path.
    ///
    /// `definition` may be `None` when exactly one definition is registered.
    pub fn resolve(
        &self,
        definition: Option<&str>,
        path: &str,
        scope: &RequestScope,
    ) -> Result<ResolvedMetadata, ResolveError> {
        let definition = self.registry.get(definition)?;
        debug!(definition = definition.name(), path, "resolving metadata");
        let lookup = Lookup::path(path)
            .with_site(scope.site.as_ref().map(|s| s.id))
            .with_language(scope.language.clone());
        let keys = self.cache_keys(&definition, Some(path), scope);
        self.run(definition, lookup, keys, scope)
    }

    /// Resolve metadata for a linked object.
    ///
    /// The object's path (if it has one) drives the path and view stages;
    /// its instance and type records are found by the object itself.
    pub fn resolve_linked(
        &self,
        definition: Option<&str>,
        object: &ObjectRef,
        scope: &RequestScope,
    ) -> Result<ResolvedMetadata, ResolveError> {
        let definition = self.registry.get(definition)?;
        let path = self.objects.path_for(object)?;
        debug!(definition = definition.name(), %object, path = ?path, "resolving linked metadata");
        let lookup = Lookup::object(object.clone(), path.clone())
            .with_site(scope.site.as_ref().map(|s| s.id))
            .with_language(scope.language.clone());
        let keys = self.cache_keys(&definition, path.as_deref(), scope);
        self.run(definition, lookup, keys, scope)
    }

    /// Run the save hook of every registered definition for an object.
    pub fn object_saved(&self, object: &ObjectRef) -> Result<Vec<SaveReport>, ResolveError> {
        self.registry
            .iter()
            .map(|definition| {
                linkage::on_saved(definition, self.store.as_ref(), &self.objects, object)
                    .map_err(ResolveError::from)
            })
            .collect()
    }

    /// Run the delete hook of every registered definition for an object.
    pub fn object_deleted(&self, object: &ObjectRef) -> Result<usize, ResolveError> {
        let mut removed = 0;
        for definition in self.registry.iter() {
            removed += linkage::on_deleted(definition, self.store.as_ref(), object)?;
        }
        Ok(removed)
    }

    /// Run the save hook of one definition for many objects.
    pub fn populate_all(
        &self,
        definition: Option<&str>,
        objects: &[ObjectRef],
    ) -> Result<PopulateSummary, ResolveError> {
        let definition = self.registry.get(definition)?;
        Ok(linkage::populate_all(
            &definition,
            self.store.as_ref(),
            &self.objects,
            objects,
        )?)
    }

    fn cache_keys(
        &self,
        definition: &CompiledDefinition,
        path: Option<&str>,
        scope: &RequestScope,
    ) -> Option<CacheKeys> {
        if self.cache.is_none() || !definition.options().use_cache {
            return None;
        }
        path.map(|path| {
            CacheKeys::new(definition, path, scope.site.as_ref(), scope.language.as_ref())
        })
    }

    fn run(
        &self,
        definition: Arc<CompiledDefinition>,
        lookup: Lookup,
        keys: Option<CacheKeys>,
        scope: &RequestScope,
    ) -> Result<ResolvedMetadata, ResolveError> {
        let values = {
            let mut run = Run {
                definition: &definition,
                chain: CandidateChain::new(
                    &definition,
                    self.store.as_ref(),
                    self.routes.as_ref(),
                    lookup,
                ),
                keys: keys.as_ref(),
                scope,
                memo: HashMap::new(),
                visiting: Vec::new(),
            };
            let mut values = IndexMap::new();
            for (key, _) in definition.fields() {
                let value = self.resolve_field(&mut run, key)?;
                values.insert(key.to_string(), value);
            }
            values
        };

        let head_cache = match (keys, &self.cache) {
            (Some(keys), Some(cache)) => Some((Arc::clone(cache), keys.head().to_string())),
            _ => None,
        };
        Ok(ResolvedMetadata {
            definition,
            values,
            head_cache,
        })
    }

    fn resolve_field(&self, run: &mut Run<'_>, key: &str) -> Result<Option<String>, ResolveError> {
        if let Some(value) = run.memo.get(key) {
            return Ok(value.clone());
        }
        let definition = run.definition;
        let Some(field) = definition.field(key) else {
            return Ok(None);
        };

        // Cached values are final, so they are taken before the cycle check.
        if let (Some(keys), Some(cache)) = (run.keys, &self.cache) {
            if let Some(cached) = cache.get(&keys.field(key)) {
                let value = Some(cached).filter(|v| !v.is_empty());
                run.memo.insert(key.to_string(), value.clone());
                return Ok(value);
            }
        }

        // A key already on the stack closes a cycle in which no field has a
        // stored value, so nothing on it can resolve. The stack never holds
        // more keys than the definition has fields.
        if run.visiting.iter().any(|k| k == key) {
            warn!(
                definition = definition.name(),
                field = key,
                via = ?run.visiting,
                "populate_from cycle; field resolves to nothing"
            );
            return Ok(None);
        }

        run.visiting.push(key.to_string());
        let computed = self.compute(run, field);
        run.visiting.pop();
        let value = computed?.filter(|v| !v.trim().is_empty());

        if let (Some(keys), Some(cache)) = (run.keys, &self.cache) {
            cache.set(&keys.field(key), value.as_deref().unwrap_or(""));
        }
        run.memo.insert(key.to_string(), value.clone());
        Ok(value)
    }

    fn compute(&self, run: &mut Run<'_>, field: &FieldDefinition) -> Result<Option<String>, ResolveError> {
        if field.is_editable() {
            let mut index = 0;
            while let Some(candidate) = run.chain.get(index)? {
                if let Some(raw) = candidate.record.value(field.key()) {
                    return Ok(Some(self.substitute(candidate, raw, run.scope)));
                }
                index += 1;
            }
        }

        let definition = run.definition;
        match field.populate() {
            PopulateFrom::NotSet => Ok(None),
            PopulateFrom::Literal(value) => Ok(Some(value.clone())),
            PopulateFrom::Callable(helper) => Ok(helper.call(definition)),
            PopulateFrom::FieldRef(target) => {
                if definition.field(target).is_some() {
                    self.resolve_field(run, target)
                } else if let Some(helper) = definition.helper(target) {
                    Ok(helper.call(definition))
                } else {
                    warn!(
                        definition = definition.name(),
                        field = field.key(),
                        target = %target,
                        "populate_from names no field or helper"
                    );
                    Ok(None)
                }
            }
        }
    }

    fn substitute(&self, candidate: &Candidate, raw: &str, scope: &RequestScope) -> String {
        if !candidate.substitutes() || !raw.contains('{') {
            return raw.to_string();
        }

        let mut context = Map::new();
        if let Some(object) = &candidate.linked {
            if let Some(value) = self.objects.template_value(object) {
                context.insert(object.object_type.template_name().to_string(), value);
            }
        }
        if candidate.backend() == BackendKind::View {
            match &scope.context {
                Some(extra) => context.extend(extra.clone()),
                None => {
                    warn!(
                        record = %candidate.record.id,
                        "no request context for view metadata; value left unsubstituted"
                    );
                    return raw.to_string();
                }
            }
        }

        match self.renderer.render(raw, &context) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(record = %candidate.record.id, error = %e, "template failed; using raw value");
                raw.to_string()
            }
        }
    }
}

/// The metadata resolved for one request.
pub struct ResolvedMetadata {
    definition: Arc<CompiledDefinition>,
    values: IndexMap<String, Option<String>>,
    head_cache: Option<(Arc<dyn CacheStore>, String)>,
}

impl fmt::Debug for ResolvedMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedMetadata")
            .field("definition", &self.definition.name())
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

impl ResolvedMetadata {
    /// The definition these values belong to.
    pub fn definition(&self) -> &CompiledDefinition {
        &self.definition
    }

    /// The resolved raw value of a field.
    pub fn value(&self, key: &str) -> Result<Option<&str>, ResolveError> {
        self.values
            .get(key)
            .map(Option::as_deref)
            .ok_or_else(|| self.unknown(key))
    }

    /// Every field's raw value, in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// A field bound to its value.
    pub fn field(&self, key: &str) -> Result<BoundField<'_>, ResolveError> {
        let field = self.definition.field(key).ok_or_else(|| self.unknown(key))?;
        Ok(BoundField {
            field,
            value: self.values.get(key).and_then(Option::as_deref),
        })
    }

    /// The rendered members of a group, one per line.
    pub fn group(&self, name: &str) -> Result<String, ResolveError> {
        let members = self.definition.group(name).ok_or_else(|| self.unknown(name))?;
        let mut rendered = Vec::with_capacity(members.len());
        for member in members {
            rendered.push(self.field(member)?.render());
        }
        Ok(rendered.join("\n").trim().to_string())
    }

    /// Render a field or a group by name.
    pub fn get(&self, name: &str) -> Result<String, ResolveError> {
        if self.definition.field(name).is_some() {
            return Ok(self.field(name)?.render());
        }
        self.group(name)
    }

    /// The rendered head block: every head field, one per line.
    pub fn head(&self) -> String {
        if let Some((cache, key)) = &self.head_cache {
            if let Some(cached) = cache.get(key) {
                return cached;
            }
        }
        let rendered = self
            .definition
            .head_fields()
            .map(|key| self.field(key).map(|f| f.render()).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n");
        if let Some((cache, key)) = &self.head_cache {
            cache.set(key, &rendered);
        }
        rendered
    }

    fn unknown(&self, name: &str) -> ResolveError {
        ResolveError::UnknownField {
            definition: self.definition.name().to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ResolvedMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.head())
    }
}

/// A field paired with its resolved value.
#[derive(Debug, Clone, Copy)]
pub struct BoundField<'a> {
    field: &'a FieldDefinition,
    value: Option<&'a str>,
}

impl<'a> BoundField<'a> {
    pub fn key(&self) -> &'a str {
        self.field.key()
    }

    pub fn definition(&self) -> &'a FieldDefinition {
        self.field
    }

    /// The resolved raw value.
    pub fn value(&self) -> Option<&'a str> {
        self.value
    }

    /// The cleaned value, if any remains after cleaning.
    pub fn cleaned(&self) -> Option<String> {
        self.value
            .map(|v| self.field.clean(v))
            .filter(|v| !v.is_empty())
    }

    /// The rendered markup, or `""` when there is no value.
    pub fn render(&self) -> String {
        self.cleaned()
            .map(|v| self.field.render(&v))
            .unwrap_or_default()
    }
}

impl fmt::Display for BoundField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryStore, NewRecord, RecordIdentity};
    use crate::cache::MemoryCache;
    use crate::definition::{DefinitionBuilder, DefinitionOptions, Helper};

    fn resolver(definition: CompiledDefinition, store: &MemoryStore) -> Resolver {
        let mut registry = Registry::new();
        registry.register(definition).unwrap();
        Resolver::new(Arc::new(registry), Arc::new(store.clone()))
    }

    fn at(path: &str) -> NewRecord {
        NewRecord::new("Test", RecordIdentity::Path { path: path.into() })
    }

    #[test]
    fn field_references_resolve_recursively() {
        let def = DefinitionBuilder::new("Test")
            .field("title", FieldDefinition::tag())
            .field(
                "og_title",
                FieldDefinition::meta_tag()
                    .editable(false)
                    .populate_from(PopulateFrom::field("title")),
            )
            .build()
            .unwrap();
        let store = MemoryStore::with_records([at("/").value("title", "Home")]).unwrap();
        let metadata = resolver(def, &store)
            .resolve(None, "/", &RequestScope::new())
            .unwrap();
        assert_eq!(metadata.value("og_title").unwrap(), Some("Home"));
    }

    #[test]
    fn cycles_resolve_to_nothing() {
        let def = DefinitionBuilder::new("Test")
            .field("a", FieldDefinition::tag().populate_from(PopulateFrom::field("b")))
            .field("b", FieldDefinition::tag().populate_from(PopulateFrom::field("a")))
            .field("c", FieldDefinition::tag().populate_from(PopulateFrom::field("c")))
            .build()
            .unwrap();
        let store = MemoryStore::new();
        let metadata = resolver(def, &store)
            .resolve(None, "/", &RequestScope::new())
            .unwrap();
        assert_eq!(metadata.value("a").unwrap(), None);
        assert_eq!(metadata.value("b").unwrap(), None);
        assert_eq!(metadata.value("c").unwrap(), None);
    }

    #[test]
    fn cycle_is_broken_by_a_stored_value() {
        let def = DefinitionBuilder::new("Test")
            .field("a", FieldDefinition::tag().populate_from(PopulateFrom::field("b")))
            .field("b", FieldDefinition::tag().populate_from(PopulateFrom::field("a")))
            .build()
            .unwrap();
        let store = MemoryStore::with_records([at("/").value("b", "B")]).unwrap();
        let metadata = resolver(def, &store)
            .resolve(None, "/", &RequestScope::new())
            .unwrap();
        assert_eq!(metadata.value("a").unwrap(), Some("B"));
        assert_eq!(metadata.value("b").unwrap(), Some("B"));
    }

    #[test]
    fn long_reference_chains_resolve_in_any_order() {
        let chain = |forward: bool| {
            let mut keys: Vec<usize> = (0..20).collect();
            if !forward {
                keys.reverse();
            }
            keys.into_iter()
                .fold(DefinitionBuilder::new("Test"), |builder, i| {
                    let populate = if i == 19 {
                        PopulateFrom::literal("x")
                    } else {
                        PopulateFrom::field(format!("f{}", i + 1))
                    };
                    builder.field(format!("f{i}"), FieldDefinition::tag().populate_from(populate))
                })
                .build()
                .unwrap()
        };

        for forward in [true, false] {
            let store = MemoryStore::new();
            let metadata = resolver(chain(forward), &store)
                .resolve(None, "/", &RequestScope::new())
                .unwrap();
            for i in 0..20 {
                assert_eq!(
                    metadata.value(&format!("f{i}")).unwrap(),
                    Some("x"),
                    "f{i} (forward: {forward})"
                );
            }
        }
    }

    #[test]
    fn long_reference_chains_are_cached_whole() {
        let def = (0..20)
            .fold(DefinitionBuilder::new("Test"), |builder, i| {
                let populate = if i == 19 {
                    PopulateFrom::literal("x")
                } else {
                    PopulateFrom::field(format!("f{}", i + 1))
                };
                builder.field(format!("f{i}"), FieldDefinition::tag().populate_from(populate))
            })
            .options(DefinitionOptions {
                use_cache: true,
                ..Default::default()
            })
            .build()
            .unwrap();
        let keys = CacheKeys::new(&def, "/", None, None);
        let cache = MemoryCache::new();
        let store = MemoryStore::new();
        resolver(def, &store)
            .with_cache(cache.clone())
            .resolve(None, "/", &RequestScope::new())
            .unwrap();
        for i in 0..20 {
            assert_eq!(cache.get(&keys.field(&format!("f{i}"))).as_deref(), Some("x"));
        }
    }

    #[test]
    fn helpers_and_callables() {
        let def = DefinitionBuilder::new("Test")
            .helper("site_name", Helper::new(|_| Some("Example".into())))
            .field("title", FieldDefinition::tag().populate_from(PopulateFrom::field("site_name")))
            .field(
                "heading",
                FieldDefinition::tag()
                    .populate_from(PopulateFrom::callable(|d| Some(d.name().to_uppercase()))),
            )
            .field("blank", FieldDefinition::tag().populate_from(PopulateFrom::callable(|_| Some("  ".into()))))
            .build()
            .unwrap();
        let store = MemoryStore::new();
        let metadata = resolver(def, &store)
            .resolve(None, "/", &RequestScope::new())
            .unwrap();
        assert_eq!(metadata.value("title").unwrap(), Some("Example"));
        assert_eq!(metadata.value("heading").unwrap(), Some("TEST"));
        assert_eq!(metadata.value("blank").unwrap(), None);
    }

    #[test]
    fn non_editable_fields_ignore_records() {
        let def = DefinitionBuilder::new("Test")
            .field(
                "derived",
                FieldDefinition::tag()
                    .editable(false)
                    .populate_from(PopulateFrom::literal("fallback")),
            )
            .build()
            .unwrap();
        let store = MemoryStore::with_records([at("/").value("derived", "stored")]).unwrap();
        let metadata = resolver(def, &store)
            .resolve(None, "/", &RequestScope::new())
            .unwrap();
        assert_eq!(metadata.value("derived").unwrap(), Some("fallback"));
        assert_eq!(store.lookup_count(), 0);
    }

    #[test]
    fn unknown_names_are_errors() {
        let def = DefinitionBuilder::new("Test")
            .field("title", FieldDefinition::tag())
            .build()
            .unwrap();
        let store = MemoryStore::new();
        let metadata = resolver(def, &store)
            .resolve(None, "/", &RequestScope::new())
            .unwrap();
        assert!(matches!(
            metadata.get("nope"),
            Err(ResolveError::UnknownField { name, .. }) if name == "nope"
        ));
        assert!(metadata.value("nope").is_err());
        assert!(metadata.field("nope").is_err());
        assert_eq!(metadata.get("title").unwrap(), "");
    }

    #[test]
    fn unknown_definition_is_an_error() {
        let store = MemoryStore::new();
        let resolver = resolver(
            DefinitionBuilder::new("Test").build().unwrap(),
            &store,
        );
        let err = resolver
            .resolve(Some("Missing"), "/", &RequestScope::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::Registry(RegistryError::UnknownDefinition(_))));
    }

    #[test]
    fn head_block_is_cached() {
        let def = DefinitionBuilder::new("Test")
            .field("title", FieldDefinition::tag().head(true))
            .options(DefinitionOptions {
                use_cache: true,
                ..Default::default()
            })
            .build()
            .unwrap();
        let store = MemoryStore::with_records([at("/").value("title", "T")]).unwrap();
        let cache = MemoryCache::new();
        let resolver = resolver(def, &store).with_cache(cache.clone());

        let first = resolver.resolve(None, "/", &RequestScope::new()).unwrap();
        assert_eq!(first.head(), "<title>T</title>");
        // field entry plus head entry
        assert_eq!(cache.len(), 2);

        let second = resolver.resolve(None, "/", &RequestScope::new()).unwrap();
        assert_eq!(second.to_string(), "<title>T</title>");
        assert_eq!(store.lookup_count(), 1);
    }

    #[test]
    fn cache_is_ignored_without_use_cache() {
        let def = DefinitionBuilder::new("Test")
            .field("title", FieldDefinition::tag())
            .build()
            .unwrap();
        let store = MemoryStore::with_records([at("/").value("title", "T")]).unwrap();
        let cache = MemoryCache::new();
        let resolver = resolver(def, &store).with_cache(cache.clone());
        resolver.resolve(None, "/", &RequestScope::new()).unwrap();
        resolver.resolve(None, "/", &RequestScope::new()).unwrap();
        assert!(cache.is_empty());
        assert_eq!(store.lookup_count(), 2);
    }

    #[test]
    fn bound_field_renders_cleaned_value() {
        let def = DefinitionBuilder::new("Test")
            .field("description", FieldDefinition::meta_tag())
            .build()
            .unwrap();
        let store =
            MemoryStore::with_records([at("/").value("description", " Two\nlines ")]).unwrap();
        let metadata = resolver(def, &store)
            .resolve(None, "/", &RequestScope::new())
            .unwrap();
        let field = metadata.field("description").unwrap();
        assert_eq!(field.key(), "description");
        assert_eq!(field.value(), Some(" Two\nlines "));
        assert_eq!(field.cleaned().as_deref(), Some("Two lines"));
        assert_eq!(
            field.to_string(),
            "<meta name=\"description\" content=\"Two lines\" />"
        );
    }
}
