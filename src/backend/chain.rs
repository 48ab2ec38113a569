//! backend::chain
//!
//! Ordered candidate lookup across a definition's backends.
//!
//! # Stages
//!
//! The definition's backend list is turned into a sequence of lookup stages:
//!
//! | Backend          | Stage(s)                                                |
//! |------------------|---------------------------------------------------------|
//! | `path`           | record whose path equals the request path               |
//! | `model_instance` | instance record found by path (or by the explicit       |
//! |                  | object), then the type record for its linked type when  |
//! |                  | `model` is also enabled                                 |
//! | `model`          | alone: type record of the explicit object only          |
//! | `view`           | record for the view the path routes to                  |
//!
//! Each stage issues at most one store call and contributes at most one
//! candidate. Stages run lazily; candidates already produced are memoized
//! so the resolver can walk the chain once per field without re-querying.
//!
//! # Scoping
//!
//! With `use_sites`, records of other sites are invisible, and a record for
//! the current site beats a site-less one. Without a current site only
//! site-less records match. With `use_i18n` the language must match
//! exactly; no language means only language-less records match.

use std::collections::VecDeque;
use tracing::debug;

use super::{Criteria, FieldMatch, Record, RecordStore, RouteResolver, StoreError};
use crate::core::types::{Language, ObjectRef, SiteId};
use crate::definition::{BackendKind, CompiledDefinition};

/// What a resolution is looking up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookup {
    /// Request path; `None` skips the path and view stages.
    pub path: Option<String>,
    /// Current site.
    pub site: Option<SiteId>,
    /// Current language.
    pub language: Option<Language>,
    /// Object resolved for explicitly, bypassing the path lookup of the
    /// instance stage.
    pub object: Option<ObjectRef>,
}

impl Lookup {
    /// Look up by request path.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Look up for a linked object, with its path when it has one.
    pub fn object(object: ObjectRef, path: Option<String>) -> Self {
        Self {
            path,
            object: Some(object),
            ..Default::default()
        }
    }

    pub fn with_site(mut self, site: Option<SiteId>) -> Self {
        self.site = site;
        self
    }

    pub fn with_language(mut self, language: Option<Language>) -> Self {
        self.language = language;
        self
    }
}

/// A record found by the chain, with the object it speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub record: Record,
    /// For instance and type candidates, the object exposed to templates.
    pub linked: Option<ObjectRef>,
}

impl Candidate {
    /// The backend the record came from.
    pub fn backend(&self) -> BackendKind {
        self.record.backend()
    }

    /// Whether values from this candidate go through template substitution.
    pub fn substitutes(&self) -> bool {
        self.backend() != BackendKind::Path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Path,
    Instance,
    Type,
    View,
}

fn plan(definition: &CompiledDefinition) -> VecDeque<Stage> {
    let options = definition.options();
    let mut stages = VecDeque::new();
    for backend in &options.backends {
        match backend {
            BackendKind::Path => stages.push_back(Stage::Path),
            BackendKind::ModelInstance => {
                stages.push_back(Stage::Instance);
                if options.uses(BackendKind::Model) {
                    stages.push_back(Stage::Type);
                }
            }
            BackendKind::Model if !options.uses(BackendKind::ModelInstance) => {
                stages.push_back(Stage::Type)
            }
            BackendKind::Model => {}
            BackendKind::View => stages.push_back(Stage::View),
        }
    }
    stages
}

/// Lazy, memoized sequence of candidate records for one lookup.
pub struct CandidateChain<'a> {
    definition: &'a CompiledDefinition,
    store: &'a dyn RecordStore,
    routes: &'a dyn RouteResolver,
    lookup: Lookup,
    pending: VecDeque<Stage>,
    linked: Option<ObjectRef>,
    yielded: Vec<Candidate>,
}

impl<'a> CandidateChain<'a> {
    /// Prepare a chain. No store calls are made until candidates are read.
    pub fn new(
        definition: &'a CompiledDefinition,
        store: &'a dyn RecordStore,
        routes: &'a dyn RouteResolver,
        lookup: Lookup,
    ) -> Self {
        Self {
            definition,
            store,
            routes,
            linked: lookup.object.clone(),
            pending: plan(definition),
            lookup,
            yielded: Vec::new(),
        }
    }

    /// The candidate at `index`, running further stages as needed.
    pub fn get(&mut self, index: usize) -> Result<Option<&Candidate>, StoreError> {
        while self.yielded.len() <= index {
            let Some(stage) = self.pending.pop_front() else {
                return Ok(None);
            };
            if let Some(candidate) = self.run(stage)? {
                debug!(
                    definition = self.definition.name(),
                    backend = %candidate.backend(),
                    record = %candidate.record.id,
                    "candidate found"
                );
                self.yielded.push(candidate);
            }
        }
        Ok(self.yielded.get(index))
    }

    /// Run every remaining stage and return all candidates.
    #[cfg(test)]
    fn collect(&mut self) -> Result<&[Candidate], StoreError> {
        let mut index = 0;
        while self.get(index)?.is_some() {
            index += 1;
        }
        Ok(&self.yielded)
    }

    /// Candidates produced so far.
    #[cfg(test)]
    fn yielded(&self) -> &[Candidate] {
        &self.yielded
    }

    /// Whether every stage has run.
    #[cfg(test)]
    fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    fn run(&mut self, stage: Stage) -> Result<Option<Candidate>, StoreError> {
        let name = self.definition.name();
        match stage {
            Stage::Path => {
                let Some(path) = self.lookup.path.clone() else {
                    return Ok(None);
                };
                let criteria = Criteria::new(name, BackendKind::Path).path(path);
                Ok(self.find(criteria)?.map(|record| Candidate {
                    record,
                    linked: None,
                }))
            }
            Stage::Instance => {
                let criteria = Criteria::new(name, BackendKind::ModelInstance);
                let criteria = match (&self.lookup.object, &self.lookup.path) {
                    (Some(object), _) => criteria.linked(object),
                    (None, Some(path)) => criteria.path(path.clone()),
                    (None, None) => return Ok(None),
                };
                let Some(record) = self.find(criteria)? else {
                    return Ok(None);
                };
                let linked = record.identity.linked();
                if linked.is_some() {
                    self.linked = linked.clone();
                }
                Ok(Some(Candidate { record, linked }))
            }
            Stage::Type => {
                let Some(object) = self.linked.clone() else {
                    debug!(definition = name, "no linked object; skipping type stage");
                    return Ok(None);
                };
                let criteria =
                    Criteria::new(name, BackendKind::Model).linked_type(object.object_type.clone());
                Ok(self.find(criteria)?.map(|record| Candidate {
                    record,
                    linked: Some(object),
                }))
            }
            Stage::View => {
                let Some(path) = self.lookup.path.as_deref() else {
                    return Ok(None);
                };
                let Some(view) = self.routes.view_name(path) else {
                    debug!(definition = name, path, "path does not route to a view");
                    return Ok(None);
                };
                if !self.definition.options().allows_view(&view) {
                    debug!(definition = name, view = %view, "view not eligible for metadata");
                    return Ok(None);
                }
                let criteria = Criteria::new(name, BackendKind::View).view_name(view);
                Ok(self.find(criteria)?.map(|record| Candidate {
                    record,
                    linked: None,
                }))
            }
        }
    }

    /// Apply site/language scoping and run the stage's single store call.
    fn find(&self, criteria: Criteria) -> Result<Option<Record>, StoreError> {
        let options = self.definition.options();
        let site = match (options.use_sites, self.lookup.site) {
            (false, _) => FieldMatch::Any,
            (true, Some(site)) => FieldMatch::EqOrNull(site),
            (true, None) => FieldMatch::Null,
        };
        let language = match (options.use_i18n, &self.lookup.language) {
            (false, _) => FieldMatch::Any,
            (true, Some(language)) => FieldMatch::Eq(language.clone()),
            (true, None) => FieldMatch::Null,
        };
        let backend = criteria.backend;
        let criteria = criteria.site(site).language(language);

        let found = match (options.use_sites, self.lookup.site) {
            (true, Some(current)) => {
                let records = self.store.filter(&criteria)?;
                records
                    .iter()
                    .find(|r| r.site == Some(current))
                    .or_else(|| records.iter().find(|r| r.site.is_none()))
                    .cloned()
            }
            _ => self.store.get(&criteria)?,
        };
        debug!(
            definition = self.definition.name(),
            backend = %backend,
            hit = found.is_some(),
            "backend lookup"
        );
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryStore;
    use crate::backend::{NewRecord, NoRoutes, RecordIdentity, StaticRoutes};
    use crate::core::types::{ObjectType, ViewName};
    use crate::definition::{DefinitionBuilder, DefinitionOptions, FieldDefinition};

    fn definition(options: DefinitionOptions) -> CompiledDefinition {
        DefinitionBuilder::new("Coverage")
            .field("title", FieldDefinition::tag())
            .options(options)
            .build()
            .unwrap()
    }

    fn page() -> ObjectType {
        ObjectType::new("page").unwrap()
    }

    fn routes() -> StaticRoutes {
        let mut routes = StaticRoutes::new();
        routes
            .add("^/pages/", ViewName::new("page_detail").unwrap())
            .unwrap();
        routes
    }

    fn full_store() -> MemoryStore {
        MemoryStore::with_records([
            NewRecord::new("Coverage", RecordIdentity::Path { path: "/pages/1/".into() }),
            NewRecord::new(
                "Coverage",
                RecordIdentity::Instance {
                    path: "/pages/1/".into(),
                    linked_type: page(),
                    linked_id: 1,
                },
            ),
            NewRecord::new("Coverage", RecordIdentity::Type { linked_type: page() }),
            NewRecord::new(
                "Coverage",
                RecordIdentity::View {
                    view_name: ViewName::new("page_detail").unwrap(),
                },
            ),
        ])
        .unwrap()
    }

    fn backends(chain: &mut CandidateChain<'_>) -> Vec<BackendKind> {
        chain.collect().unwrap().iter().map(Candidate::backend).collect()
    }

    #[test]
    fn default_order() {
        let def = definition(DefinitionOptions::default());
        let store = full_store();
        let routes = routes();
        let mut chain = CandidateChain::new(&def, &store, &routes, Lookup::path("/pages/1/"));
        assert_eq!(
            backends(&mut chain),
            vec![
                BackendKind::Path,
                BackendKind::ModelInstance,
                BackendKind::Model,
                BackendKind::View
            ]
        );
        let candidates = chain.yielded();
        assert_eq!(candidates[2].linked, Some(ObjectRef::new(page(), 1)));
        assert!(!candidates[0].substitutes());
        assert!(candidates[3].substitutes());
    }

    #[test]
    fn lazy_and_memoized() {
        let def = definition(DefinitionOptions::default());
        let store = full_store();
        let mut chain = CandidateChain::new(&def, &store, &NoRoutes, Lookup::path("/pages/1/"));
        assert_eq!(store.lookup_count(), 0);

        chain.get(0).unwrap();
        assert_eq!(store.lookup_count(), 1);

        chain.get(0).unwrap();
        assert_eq!(store.lookup_count(), 1);

        chain.collect().unwrap();
        chain.collect().unwrap();
        // path, instance, type; no route so the view stage makes no call
        assert_eq!(store.lookup_count(), 3);
        assert!(chain.is_exhausted());
    }

    #[test]
    fn model_alone_needs_explicit_object() {
        let def = definition(DefinitionOptions {
            backends: vec![BackendKind::Path, BackendKind::Model],
            ..Default::default()
        });
        let store = full_store();

        let mut chain = CandidateChain::new(&def, &store, &NoRoutes, Lookup::path("/pages/1/"));
        assert_eq!(backends(&mut chain), vec![BackendKind::Path]);

        let lookup = Lookup::object(ObjectRef::new(page(), 9), None);
        let mut chain = CandidateChain::new(&def, &store, &NoRoutes, lookup);
        assert_eq!(backends(&mut chain), vec![BackendKind::Model]);
    }

    #[test]
    fn explicit_object_without_path_reaches_instance_and_type() {
        let def = definition(DefinitionOptions::default());
        let store = full_store();
        let lookup = Lookup::object(ObjectRef::new(page(), 1), None);
        let mut chain = CandidateChain::new(&def, &store, &NoRoutes, lookup);
        assert_eq!(
            backends(&mut chain),
            vec![BackendKind::ModelInstance, BackendKind::Model]
        );
    }

    #[test]
    fn ineligible_view_contributes_nothing() {
        let def = definition(DefinitionOptions {
            seo_views: vec![ViewName::new("home").unwrap()],
            ..Default::default()
        });
        let store = full_store();
        let routes = routes();
        let mut chain = CandidateChain::new(&def, &store, &routes, Lookup::path("/nowhere/"));
        assert!(backends(&mut chain).is_empty());

        let mut chain = CandidateChain::new(&def, &store, &routes, Lookup::path("/pages/2/"));
        assert!(backends(&mut chain).is_empty());
    }

    mod scoping {
        use super::*;

        fn sited() -> CompiledDefinition {
            definition(DefinitionOptions {
                use_sites: true,
                use_i18n: true,
                backends: vec![BackendKind::Path],
                ..Default::default()
            })
        }

        fn path_record() -> NewRecord {
            NewRecord::new("Coverage", RecordIdentity::Path { path: "/".into() })
        }

        fn found_site(store: &MemoryStore, site: Option<SiteId>) -> Option<Option<SiteId>> {
            let def = sited();
            let lookup = Lookup::path("/").with_site(site);
            let mut chain = CandidateChain::new(&def, store, &NoRoutes, lookup);
            chain.get(0).unwrap().map(|c| c.record.site)
        }

        #[test]
        fn current_site_beats_null_site() {
            let store = MemoryStore::with_records([
                path_record(),
                path_record().site(SiteId(1)),
                path_record().site(SiteId(2)),
            ])
            .unwrap();
            assert_eq!(found_site(&store, Some(SiteId(1))), Some(Some(SiteId(1))));
            assert_eq!(found_site(&store, Some(SiteId(3))), Some(None));
            assert_eq!(found_site(&store, None), Some(None));
        }

        #[test]
        fn other_sites_are_invisible() {
            let store = MemoryStore::with_records([path_record().site(SiteId(2))]).unwrap();
            assert_eq!(found_site(&store, Some(SiteId(1))), None);
            assert_eq!(found_site(&store, None), None);
        }

        #[test]
        fn language_matches_exactly() {
            let de = Language::new("de").unwrap();
            let store = MemoryStore::with_records([path_record().language(de.clone())]).unwrap();
            let def = sited();

            let lookup = Lookup::path("/").with_language(Some(de));
            let mut chain = CandidateChain::new(&def, &store, &NoRoutes, lookup);
            assert!(chain.get(0).unwrap().is_some());

            let lookup = Lookup::path("/").with_language(Some(Language::new("de-at").unwrap()));
            let mut chain = CandidateChain::new(&def, &store, &NoRoutes, lookup);
            assert!(chain.get(0).unwrap().is_none());

            let mut chain = CandidateChain::new(&def, &store, &NoRoutes, Lookup::path("/"));
            assert!(chain.get(0).unwrap().is_none());
        }
    }
}
