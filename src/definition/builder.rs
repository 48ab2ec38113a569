//! definition::builder
//!
//! Compiles declarative field specs and options into an immutable
//! [`CompiledDefinition`] with one record schema per enabled backend.
//!
//! # Validation
//!
//! Compilation fails with a [`DefinitionError`] when:
//! - a field key is reserved or declared twice
//! - a group name clashes with a field key, or a group member is unknown
//! - a non-editable field has no `populate_from`
//! - a rendered tag name is invalid
//! - a `populate_from` reference names neither a field nor a helper
//! - a backend is listed twice
//!
//! # Example
//!
//! ```
//! use metahead::definition::{DefinitionBuilder, DefinitionOptions, FieldDefinition, PopulateFrom};
//!
//! let definition = DefinitionBuilder::new("SiteMetadata")
//!     .field("title", FieldDefinition::tag().head(true).max_length(68))
//!     .field("description", FieldDefinition::meta_tag().max_length(155))
//!     .field("og_title", FieldDefinition::meta_tag()
//!         .with_name("og:title")
//!         .editable(false)
//!         .populate_from(PopulateFrom::field("title")))
//!     .group("social", ["og_title"])
//!     .options(DefinitionOptions { use_cache: true, ..Default::default() })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(definition.name(), "SiteMetadata");
//! assert_eq!(definition.verbose_name(), "site metadata");
//! assert_eq!(definition.schemas().len(), 4);
//! assert_eq!(
//!     definition.field("og_title").unwrap().help(),
//!     Some("If empty, title will be used.")
//! );
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;

use super::field::{FieldDefinition, Helper, PopulateFrom, Storage};
use super::options::{BackendKind, DefinitionOptions};
use super::DefinitionError;
use crate::core::naming::{is_reserved, verbose_name};

/// Maximum stored length of path columns.
pub const PATH_MAX_LENGTH: usize = 511;

/// Column type in a record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Bounded character data.
    Char(usize),
    /// Unbounded text.
    Text,
    /// Linked object type name.
    ObjectType,
    /// Linked object id.
    ObjectId,
    /// Routed view name.
    ViewName,
    /// Site identifier.
    Site,
    /// Language code.
    Language,
}

/// One column of a record schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column type.
    pub column_type: ColumnType,
    /// Whether the column may be null.
    pub nullable: bool,
    /// Permitted values; empty means unrestricted.
    pub choices: Vec<String>,
    /// Help text for editors.
    pub help_text: Option<String>,
}

impl Column {
    fn identity(name: &str, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            nullable,
            choices: Vec::new(),
            help_text: None,
        }
    }
}

/// The persisted layout of one backend's records for a definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    /// Backend the table belongs to.
    pub backend: BackendKind,
    /// Table name, e.g. `site_metadata_path`.
    pub table: String,
    /// Display name, e.g. `site metadata (Path)`.
    pub verbose_name: String,
    /// Display name in plural form.
    pub verbose_name_plural: String,
    /// Identity, scoping and field columns.
    pub columns: Vec<Column>,
    /// Columns that are unique together.
    pub unique_together: Vec<String>,
}

impl RecordSchema {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A compiled, immutable metadata definition.
///
/// Shared across threads behind an `Arc`; nothing in it changes after
/// [`DefinitionBuilder::build`].
#[derive(Debug, Clone)]
pub struct CompiledDefinition {
    name: String,
    verbose_name: String,
    verbose_name_plural: String,
    fields: IndexMap<String, FieldDefinition>,
    groups: IndexMap<String, Vec<String>>,
    helpers: IndexMap<String, Helper>,
    options: DefinitionOptions,
    schemas: Vec<RecordSchema>,
}

impl CompiledDefinition {
    /// The definition's registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable name.
    pub fn verbose_name(&self) -> &str {
        &self.verbose_name
    }

    /// Human readable plural name.
    pub fn verbose_name_plural(&self) -> &str {
        &self.verbose_name_plural
    }

    /// Look up a field by key.
    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.get(key)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.fields.iter().map(|(k, f)| (k.as_str(), f))
    }

    /// Keys of the fields included in the head block, in declaration order.
    pub fn head_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, f)| f.is_head())
            .map(|(k, _)| k.as_str())
    }

    /// Members of a group, in declaration order.
    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    /// Group names in declaration order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Look up a named helper.
    pub fn helper(&self, name: &str) -> Option<&Helper> {
        self.helpers.get(name)
    }

    /// The definition's options.
    pub fn options(&self) -> &DefinitionOptions {
        &self.options
    }

    /// Record schemas, one per enabled backend, in chain order.
    pub fn schemas(&self) -> &[RecordSchema] {
        &self.schemas
    }

    /// The record schema for a backend, if enabled.
    pub fn schema(&self, backend: BackendKind) -> Option<&RecordSchema> {
        self.schemas.iter().find(|s| s.backend == backend)
    }

    /// Whether `name` is a declared field or group.
    pub fn declares(&self, name: &str) -> bool {
        self.fields.contains_key(name) || self.groups.contains_key(name)
    }
}

/// Builder for [`CompiledDefinition`].
#[derive(Debug, Clone)]
pub struct DefinitionBuilder {
    name: String,
    fields: Vec<(String, FieldDefinition)>,
    groups: Vec<(String, Vec<String>)>,
    helpers: IndexMap<String, Helper>,
    help_text: HashMap<String, String>,
    options: DefinitionOptions,
}

impl DefinitionBuilder {
    /// Start a definition with the given registry name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            groups: Vec::new(),
            helpers: IndexMap::new(),
            help_text: HashMap::new(),
            options: DefinitionOptions::default(),
        }
    }

    /// Declare a field. Declaration order is preserved.
    pub fn field(mut self, key: impl Into<String>, field: FieldDefinition) -> Self {
        self.fields.push((key.into(), field));
        self
    }

    /// Declare a named group of fields rendered together.
    pub fn group<I, S>(mut self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .push((name.into(), members.into_iter().map(Into::into).collect()));
        self
    }

    /// Register a named helper that `populate_from` references may call.
    pub fn helper(mut self, name: impl Into<String>, helper: Helper) -> Self {
        self.helpers.insert(name.into(), helper);
        self
    }

    /// Provide help text for a field without touching its declaration.
    pub fn help_text(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.help_text.insert(key.into(), text.into());
        self
    }

    /// Replace the definition's options.
    pub fn options(mut self, options: DefinitionOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate and compile the definition.
    ///
    /// # Errors
    ///
    /// Returns a [`DefinitionError`] describing the first configuration
    /// problem found.
    pub fn build(self) -> Result<CompiledDefinition, DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }

        let mut fields: IndexMap<String, FieldDefinition> = IndexMap::new();
        for (key, mut field) in self.fields {
            if is_reserved(&key) {
                return Err(DefinitionError::ReservedFieldName(key));
            }
            if fields.contains_key(&key) {
                return Err(DefinitionError::DuplicateField(key));
            }
            field.bind_key(&key);
            fields.insert(key, field);
        }

        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, members) in self.groups {
            if fields.contains_key(&name) {
                return Err(DefinitionError::GroupClashesWithField(name));
            }
            if let Some(member) = members.iter().find(|m| !fields.contains_key(m.as_str())) {
                return Err(DefinitionError::UnknownGroupMember {
                    group: name.clone(),
                    member: member.clone(),
                });
            }
            groups.insert(name, members);
        }

        let mut seen = Vec::with_capacity(self.options.backends.len());
        for backend in &self.options.backends {
            if seen.contains(backend) {
                return Err(DefinitionError::DuplicateBackend(*backend));
            }
            seen.push(*backend);
        }

        let keys: Vec<String> = fields.keys().cloned().collect();
        for field in fields.values_mut() {
            if let PopulateFrom::FieldRef(target) = field.populate() {
                let known = keys.contains(target) || self.helpers.contains_key(target);
                if !known {
                    return Err(DefinitionError::UnresolvedReference {
                        key: field.key().to_string(),
                        target: target.clone(),
                    });
                }
            }
            if field.help().is_none() {
                let derived = self
                    .help_text
                    .get(field.key())
                    .cloned()
                    .or_else(|| derived_help_text(field.populate(), &keys, &self.helpers));
                if let Some(text) = derived {
                    field.set_help_text(text);
                }
            }
            field.validate()?;
        }

        let verbose = self
            .options
            .verbose_name
            .clone()
            .unwrap_or_else(|| verbose_name(&self.name));
        let verbose_plural = self
            .options
            .verbose_name_plural
            .clone()
            .unwrap_or_else(|| format!("{verbose}s"));

        let schemas = self
            .options
            .backends
            .iter()
            .map(|backend| {
                record_schema(
                    *backend,
                    &self.name,
                    &verbose,
                    &verbose_plural,
                    &fields,
                    &self.options,
                )
            })
            .collect();

        Ok(CompiledDefinition {
            name: self.name,
            verbose_name: verbose,
            verbose_name_plural: verbose_plural,
            fields,
            groups,
            helpers: self.helpers,
            options: self.options,
            schemas,
        })
    }
}

/// Describe a fallback rule for editors.
fn derived_help_text(
    populate: &PopulateFrom,
    fields: &[String],
    helpers: &IndexMap<String, Helper>,
) -> Option<String> {
    match populate {
        PopulateFrom::NotSet => None,
        PopulateFrom::Literal(value) => Some(format!("If empty, \"{value}\" will be used.")),
        PopulateFrom::FieldRef(target) if fields.contains(target) => {
            Some(format!("If empty, {target} will be used."))
        }
        PopulateFrom::FieldRef(target) => helpers
            .get(target)
            .and_then(Helper::description)
            .map(|d| format!("If empty, {d}")),
        PopulateFrom::Callable(helper) => helper.description().map(|d| format!("If empty, {d}")),
    }
}

fn table_name(definition: &str, backend: BackendKind) -> String {
    format!(
        "{}_{}",
        verbose_name(definition).replace(' ', "_"),
        backend.name()
    )
}

fn record_schema(
    backend: BackendKind,
    definition: &str,
    verbose: &str,
    verbose_plural: &str,
    fields: &IndexMap<String, FieldDefinition>,
    options: &DefinitionOptions,
) -> RecordSchema {
    let mut columns = Vec::new();
    let mut unique_together = Vec::new();

    match backend {
        BackendKind::Path => {
            columns.push(Column::identity("path", ColumnType::Char(PATH_MAX_LENGTH), false));
            unique_together.push("path".to_string());
        }
        BackendKind::ModelInstance => {
            columns.push(Column::identity("path", ColumnType::Char(PATH_MAX_LENGTH), false));
            columns.push(Column::identity("linked_type", ColumnType::ObjectType, false));
            columns.push(Column::identity("linked_id", ColumnType::ObjectId, false));
            unique_together.push("linked_type".to_string());
            unique_together.push("linked_id".to_string());
        }
        BackendKind::Model => {
            columns.push(Column::identity("linked_type", ColumnType::ObjectType, false));
            unique_together.push("linked_type".to_string());
        }
        BackendKind::View => {
            let mut column = Column::identity("view_name", ColumnType::ViewName, false);
            column.choices = options
                .seo_views
                .iter()
                .map(|v| v.as_str().to_string())
                .collect();
            columns.push(column);
            unique_together.push("view_name".to_string());
        }
    }

    if options.use_sites {
        columns.push(Column::identity("site", ColumnType::Site, true));
        unique_together.push("site".to_string());
    }
    if options.use_i18n {
        columns.push(Column::identity("language", ColumnType::Language, true));
        unique_together.push("language".to_string());
    }

    for (key, field) in fields.iter().filter(|(_, f)| f.is_editable()) {
        let column_type = match field.storage() {
            Storage::Char { max_length } => ColumnType::Char(max_length),
            Storage::Text => ColumnType::Text,
        };
        columns.push(Column {
            name: key.clone(),
            column_type,
            nullable: false,
            choices: field.choice_list().to_vec(),
            help_text: field.help().map(str::to_string),
        });
    }

    RecordSchema {
        backend,
        table: table_name(definition, backend),
        verbose_name: format!("{verbose} ({})", backend.label()),
        verbose_name_plural: format!("{verbose_plural} ({})", backend.label()),
        columns,
        unique_together,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage() -> DefinitionBuilder {
        DefinitionBuilder::new("Coverage")
            .field("title", FieldDefinition::tag())
            .field(
                "heading",
                FieldDefinition::tag().with_name("hs:tag").head(true).max_length(68),
            )
            .field("keywords", FieldDefinition::meta_tag())
            .field("raw1", FieldDefinition::raw())
            .field("raw2", FieldDefinition::raw().valid_tags(["meta", "title"]))
            .field(
                "populate_from2",
                FieldDefinition::tag().populate_from(PopulateFrom::field("heading")),
            )
            .field(
                "populate_from3",
                FieldDefinition::tag().populate_from(PopulateFrom::literal("efg")),
            )
            .field(
                "derived",
                FieldDefinition::tag()
                    .editable(false)
                    .populate_from(PopulateFrom::literal("ghi")),
            )
            .group("advanced", ["raw1", "raw2"])
    }

    #[test]
    fn preserves_field_order() {
        let def = coverage().build().unwrap();
        let keys: Vec<&str> = def.fields().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "title",
                "heading",
                "keywords",
                "raw1",
                "raw2",
                "populate_from2",
                "populate_from3",
                "derived"
            ]
        );
    }

    #[test]
    fn head_fields_follow_flags() {
        let def = coverage().build().unwrap();
        let head: Vec<&str> = def.head_fields().collect();
        assert_eq!(head, vec!["heading", "keywords", "raw1", "raw2"]);
    }

    #[test]
    fn rejects_group_field_clash() {
        let err = coverage().group("title", ["raw1"]).build().unwrap_err();
        assert!(matches!(err, DefinitionError::GroupClashesWithField(name) if name == "title"));
    }

    #[test]
    fn rejects_unknown_group_member() {
        let err = coverage().group("extra", ["missing"]).build().unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::UnknownGroupMember { member, .. } if member == "missing"
        ));
    }

    #[test]
    fn rejects_reserved_name() {
        let err = DefinitionBuilder::new("Bad")
            .field("path", FieldDefinition::tag())
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::ReservedFieldName(key) if key == "path"));
    }

    #[test]
    fn rejects_duplicate_field() {
        let err = DefinitionBuilder::new("Bad")
            .field("title", FieldDefinition::tag())
            .field("title", FieldDefinition::meta_tag())
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateField(key) if key == "title"));
    }

    #[test]
    fn rejects_duplicate_backend() {
        let err = DefinitionBuilder::new("Bad")
            .options(DefinitionOptions {
                backends: vec![BackendKind::Path, BackendKind::Path],
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateBackend(BackendKind::Path)));
    }

    #[test]
    fn rejects_unresolved_reference() {
        let err = DefinitionBuilder::new("Bad")
            .field(
                "title",
                FieldDefinition::tag().populate_from(PopulateFrom::field("nowhere")),
            )
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::UnresolvedReference { target, .. } if target == "nowhere"
        ));
    }

    #[test]
    fn helper_reference_is_accepted() {
        let def = DefinitionBuilder::new("Helpers")
            .helper(
                "site_name",
                Helper::new(|_| Some("Example".into())).described("the site name is used."),
            )
            .field(
                "title",
                FieldDefinition::tag().populate_from(PopulateFrom::field("site_name")),
            )
            .build()
            .unwrap();
        assert_eq!(
            def.field("title").unwrap().help(),
            Some("If empty, the site name is used.")
        );
    }

    #[test]
    fn derives_help_text() {
        let def = coverage()
            .help_text("title", "Updated help text.")
            .build()
            .unwrap();
        assert_eq!(def.field("title").unwrap().help(), Some("Updated help text."));
        assert_eq!(
            def.field("populate_from2").unwrap().help(),
            Some("If empty, heading will be used.")
        );
        assert_eq!(
            def.field("populate_from3").unwrap().help(),
            Some("If empty, \"efg\" will be used.")
        );
        assert_eq!(def.field("keywords").unwrap().help(), None);
    }

    #[test]
    fn explicit_help_text_wins() {
        let def = DefinitionBuilder::new("Help")
            .field(
                "title",
                FieldDefinition::tag()
                    .help_text("Explicit.")
                    .populate_from(PopulateFrom::literal("x")),
            )
            .help_text("title", "Ignored.")
            .build()
            .unwrap();
        assert_eq!(def.field("title").unwrap().help(), Some("Explicit."));
    }

    #[test]
    fn schemas_follow_backends() {
        let def = coverage().build().unwrap();
        let tables: Vec<&str> = def.schemas().iter().map(|s| s.table.as_str()).collect();
        assert_eq!(
            tables,
            vec![
                "coverage_path",
                "coverage_model_instance",
                "coverage_model",
                "coverage_view"
            ]
        );
        let path = def.schema(BackendKind::Path).unwrap();
        assert_eq!(path.verbose_name, "coverage (Path)");
        assert!(path.column("title").is_some());
        // non-editable fields have no storage
        assert!(path.column("derived").is_none());
        assert_eq!(path.column("raw1").unwrap().column_type, ColumnType::Text);
        assert_eq!(path.column("heading").unwrap().column_type, ColumnType::Char(68));
    }

    #[test]
    fn scoping_columns_join_uniqueness() {
        let def = coverage()
            .options(DefinitionOptions {
                use_sites: true,
                use_i18n: true,
                ..Default::default()
            })
            .build()
            .unwrap();
        let instance = def.schema(BackendKind::ModelInstance).unwrap();
        assert_eq!(
            instance.unique_together,
            vec!["linked_type", "linked_id", "site", "language"]
        );
        assert!(instance.column("site").unwrap().nullable);
    }

    #[test]
    fn custom_backend_subset() {
        let def = coverage()
            .options(DefinitionOptions {
                backends: vec![BackendKind::View, BackendKind::Path],
                ..Default::default()
            })
            .build()
            .unwrap();
        let kinds: Vec<BackendKind> = def.schemas().iter().map(|s| s.backend).collect();
        assert_eq!(kinds, vec![BackendKind::View, BackendKind::Path]);
        assert!(def.schema(BackendKind::Model).is_none());
    }
}
