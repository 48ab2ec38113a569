//! definition::options
//!
//! Per-definition options: scoping axes, caching, linked object types,
//! eligible views, and the ordered backend list.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::{ObjectType, ViewName};

/// The kinds of record source a definition can consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Records keyed by exact path.
    Path,
    /// Records linked to one external object instance.
    ModelInstance,
    /// Records shared by every object of one type.
    Model,
    /// Records keyed by routed view name.
    View,
}

impl BackendKind {
    /// All backend kinds, in default chain order.
    pub fn all() -> &'static [BackendKind] {
        &[
            BackendKind::Path,
            BackendKind::ModelInstance,
            BackendKind::Model,
            BackendKind::View,
        ]
    }

    /// The name used in configuration files and table names.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Path => "path",
            BackendKind::ModelInstance => "model_instance",
            BackendKind::Model => "model",
            BackendKind::View => "view",
        }
    }

    /// Label used in schema verbose names.
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::Path => "Path",
            BackendKind::ModelInstance => "Model Instance",
            BackendKind::Model => "Model",
            BackendKind::View => "View",
        }
    }

    /// Parse a backend from its configuration name.
    ///
    /// ```
    /// use metahead::definition::BackendKind;
    ///
    /// assert_eq!(BackendKind::parse("model_instance"), Some(BackendKind::ModelInstance));
    /// assert_eq!(BackendKind::parse("nope"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        BackendKind::all().iter().copied().find(|k| k.name() == s)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Options controlling how a definition stores and resolves metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionOptions {
    /// Records may be scoped to a site.
    pub use_sites: bool,
    /// Records are scoped to a language.
    pub use_i18n: bool,
    /// Resolved values are cached.
    pub use_cache: bool,
    /// Carried for hosts that pair metadata with redirects; resolution ignores it.
    pub use_redirect: bool,
    /// Object types whose saves and deletes maintain instance records.
    pub seo_models: Vec<ObjectType>,
    /// Views that view-level records may be attached to. Empty means any.
    pub seo_views: Vec<ViewName>,
    /// Backends consulted, in order.
    pub backends: Vec<BackendKind>,
    /// Human readable name; derived from the definition name when unset.
    pub verbose_name: Option<String>,
    /// Plural human readable name; verbose name plus `s` when unset.
    pub verbose_name_plural: Option<String>,
}

impl Default for DefinitionOptions {
    fn default() -> Self {
        Self {
            use_sites: false,
            use_i18n: false,
            use_cache: false,
            use_redirect: false,
            seo_models: Vec::new(),
            seo_views: Vec::new(),
            backends: BackendKind::all().to_vec(),
            verbose_name: None,
            verbose_name_plural: None,
        }
    }
}

impl DefinitionOptions {
    /// Whether a backend is enabled.
    pub fn uses(&self, kind: BackendKind) -> bool {
        self.backends.contains(&kind)
    }

    /// Whether saves of objects of this type maintain instance records.
    pub fn links(&self, object_type: &ObjectType) -> bool {
        self.seo_models.contains(object_type)
    }

    /// Whether view-level records may be attached to this view.
    pub fn allows_view(&self, view: &ViewName) -> bool {
        self.seo_views.is_empty() || self.seo_views.contains(view)
    }
}
