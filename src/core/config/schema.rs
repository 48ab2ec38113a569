//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Layout
//!
//! ```toml
//! [cache]
//! ttl_seconds = 600
//!
//! [[route]]
//! pattern = "^/products/[0-9]+/$"
//! view = "product_detail"
//!
//! [[definition]]
//! name = "SiteMetadata"
//! use_cache = true
//! seo_models = ["shop.product"]
//! backends = ["path", "model_instance", "model", "view"]
//!
//! [definition.groups]
//! social = ["og_title"]
//!
//! [[definition.field]]
//! key = "title"
//! kind = "tag"
//! head = true
//! max_length = 68
//!
//! [[definition.field]]
//! key = "og_title"
//! kind = "meta_tag"
//! name = "og:title"
//! editable = false
//! populate_from = { field = "title" }
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing: backend names, object types, view
//! names and route patterns must all be well formed.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{ObjectType, ViewName};
use crate::definition::{
    BackendKind, DefinitionBuilder, DefinitionOptions, FieldDefinition, FieldKind, PopulateFrom,
};

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// In-process cache settings.
    pub cache: Option<CacheConfig>,

    /// Static route table for the view backend.
    #[serde(rename = "route")]
    pub routes: Vec<RouteConfig>,

    /// Metadata definitions.
    #[serde(rename = "definition")]
    pub definitions: Vec<DefinitionConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for route in &self.routes {
            route.validate()?;
        }
        let mut names = Vec::with_capacity(self.definitions.len());
        for definition in &self.definitions {
            definition.validate()?;
            if names.contains(&definition.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "definition '{}' is declared more than once",
                    definition.name
                )));
            }
            names.push(definition.name.as_str());
        }
        Ok(())
    }
}

/// `[cache]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Entry lifetime; entries never expire when unset.
    pub ttl_seconds: Option<u64>,
}

/// One `[[route]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Regular expression matched against request paths.
    pub pattern: String,
    /// View name for matching paths.
    pub view: String,
}

impl RouteConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        Regex::new(&self.pattern).map_err(|e| {
            ConfigError::InvalidValue(format!("invalid route pattern '{}': {}", self.pattern, e))
        })?;
        ViewName::new(&self.view)
            .map_err(|e| ConfigError::InvalidValue(format!("invalid route view: {}", e)))?;
        Ok(())
    }
}

/// One `[[definition]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DefinitionConfig {
    pub name: String,

    #[serde(default)]
    pub verbose_name: Option<String>,

    #[serde(default)]
    pub verbose_name_plural: Option<String>,

    #[serde(default)]
    pub use_sites: bool,

    #[serde(default)]
    pub use_i18n: bool,

    #[serde(default)]
    pub use_cache: bool,

    #[serde(default)]
    pub use_redirect: bool,

    #[serde(default)]
    pub seo_models: Vec<String>,

    #[serde(default)]
    pub seo_views: Vec<String>,

    /// Backend names in chain order; all four when unset.
    #[serde(default)]
    pub backends: Option<Vec<String>>,

    #[serde(default)]
    pub groups: IndexMap<String, Vec<String>>,

    /// Help text by field key, for fields that do not set their own.
    #[serde(default)]
    pub help_text: IndexMap<String, String>,

    #[serde(default, rename = "field")]
    pub fields: Vec<FieldConfig>,
}

impl DefinitionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "definition name cannot be empty".to_string(),
            ));
        }
        self.options().map(|_| ())
    }

    /// The definition's options, with names parsed into their types.
    pub fn options(&self) -> Result<DefinitionOptions, ConfigError> {
        let backends = match &self.backends {
            Some(names) => names
                .iter()
                .map(|name| {
                    BackendKind::parse(name).ok_or_else(|| {
                        ConfigError::InvalidValue(format!(
                            "unknown backend '{}' in definition '{}'",
                            name, self.name
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => BackendKind::all().to_vec(),
        };
        let seo_models = self
            .seo_models
            .iter()
            .map(|m| {
                ObjectType::new(m.as_str())
                    .map_err(|e| ConfigError::InvalidValue(format!("invalid seo model: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let seo_views = self
            .seo_views
            .iter()
            .map(|v| {
                ViewName::new(v.as_str())
                    .map_err(|e| ConfigError::InvalidValue(format!("invalid seo view: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DefinitionOptions {
            use_sites: self.use_sites,
            use_i18n: self.use_i18n,
            use_cache: self.use_cache,
            use_redirect: self.use_redirect,
            seo_models,
            seo_views,
            backends,
            verbose_name: self.verbose_name.clone(),
            verbose_name_plural: self.verbose_name_plural.clone(),
        })
    }

    /// A builder carrying this entry's fields, groups and options.
    ///
    /// Helpers named by `populate_from` must still be added to the builder
    /// before it is built.
    pub fn builder(&self) -> Result<DefinitionBuilder, ConfigError> {
        let mut builder = DefinitionBuilder::new(self.name.clone()).options(self.options()?);
        for field in &self.fields {
            builder = builder.field(field.key.clone(), field.to_field());
        }
        for (group, members) in &self.groups {
            builder = builder.group(group.clone(), members.iter().cloned());
        }
        for (key, text) in &self.help_text {
            builder = builder.help_text(key.clone(), text.clone());
        }
        Ok(builder)
    }
}

/// One `[[definition.field]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub key: String,
    pub kind: FieldKind,

    /// Rendered tag name; the key when unset.
    #[serde(default)]
    pub name: Option<String>,

    /// Head block membership; the kind's default when unset.
    #[serde(default)]
    pub head: Option<bool>,

    #[serde(default)]
    pub editable: Option<bool>,

    #[serde(default)]
    pub max_length: Option<usize>,

    #[serde(default)]
    pub valid_tags: Option<Vec<String>>,

    #[serde(default)]
    pub populate_from: Option<PopulateConfig>,

    #[serde(default)]
    pub help_text: Option<String>,

    #[serde(default)]
    pub verbose_name: Option<String>,

    #[serde(default)]
    pub choices: Vec<String>,
}

impl FieldConfig {
    /// Build the field descriptor.
    pub fn to_field(&self) -> FieldDefinition {
        let mut field = FieldDefinition::of_kind(self.kind);
        if let Some(name) = &self.name {
            field = field.with_name(name.clone());
        }
        if let Some(head) = self.head {
            field = field.head(head);
        }
        if let Some(editable) = self.editable {
            field = field.editable(editable);
        }
        if let Some(max_length) = self.max_length {
            field = field.max_length(max_length);
        }
        if let Some(tags) = &self.valid_tags {
            field = field.valid_tags(tags.iter().cloned());
        }
        if let Some(populate) = &self.populate_from {
            field = field.populate_from(populate.to_populate());
        }
        if let Some(help) = &self.help_text {
            field = field.help_text(help.clone());
        }
        if let Some(verbose) = &self.verbose_name {
            field = field.verbose_name(verbose.clone());
        }
        if !self.choices.is_empty() {
            field = field.choices(self.choices.iter().cloned());
        }
        field
    }
}

/// `populate_from` as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PopulateConfig {
    /// Another field of the same definition.
    Field(String),
    /// A fixed value.
    Literal(String),
    /// A helper registered by the embedding program.
    Helper(String),
}

impl PopulateConfig {
    fn to_populate(&self) -> PopulateFrom {
        match self {
            PopulateConfig::Field(name) | PopulateConfig::Helper(name) => {
                PopulateFrom::field(name.clone())
            }
            PopulateConfig::Literal(value) => PopulateFrom::literal(value.clone()),
        }
    }
}
