//! definition::field
//!
//! Declarative descriptors for a single metadata element.
//!
//! # Kinds
//!
//! - [`FieldKind::InlineTag`] - rendered as `<name>value</name>`
//! - [`FieldKind::MetaTag`] - rendered as `<meta name="name" content="value" />`
//! - [`FieldKind::KeywordTag`] - a meta tag whose newlines become a comma list
//! - [`FieldKind::RawBlock`] - raw head markup, rendered verbatim
//!
//! # Example
//!
//! ```
//! use metahead::definition::{FieldDefinition, PopulateFrom};
//!
//! let heading = FieldDefinition::tag().with_name("h1").max_length(68);
//! let og_title = FieldDefinition::meta_tag()
//!     .with_name("og:title")
//!     .populate_from(PopulateFrom::field("title"))
//!     .editable(false);
//!
//! assert!(!heading.is_head());
//! assert!(og_title.is_head());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::builder::CompiledDefinition;
use super::DefinitionError;
use crate::core::naming::{is_valid_meta_name, is_valid_tag_name};
use crate::format;

/// Default maximum length for tag values.
pub const DEFAULT_MAX_LENGTH: usize = 511;

/// How a field is stored, cleaned and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// An inline element such as `<title>`.
    #[serde(rename = "tag")]
    InlineTag,
    /// A `<meta name=... content=...>` tag.
    MetaTag,
    /// A keywords meta tag.
    KeywordTag,
    /// Raw head markup.
    #[serde(rename = "raw")]
    RawBlock,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::InlineTag => write!(f, "tag"),
            FieldKind::MetaTag => write!(f, "meta_tag"),
            FieldKind::KeywordTag => write!(f, "keyword_tag"),
            FieldKind::RawBlock => write!(f, "raw"),
        }
    }
}

/// Storage column type for an editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Bounded character column.
    Char { max_length: usize },
    /// Unbounded text column.
    Text,
}

/// Signature of a populate callable.
pub type PopulateFn = Arc<dyn Fn(&CompiledDefinition) -> Option<String> + Send + Sync>;

/// A callable that produces a fallback value.
///
/// Callables receive the compiled definition; helpers that do not need it
/// simply ignore the argument.
#[derive(Clone)]
pub struct Helper {
    func: PopulateFn,
    description: Option<String>,
}

impl Helper {
    /// Wrap a function as a helper.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&CompiledDefinition) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            description: None,
        }
    }

    /// Attach a human readable description, used to derive help text.
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The helper's description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Invoke the helper.
    pub fn call(&self, definition: &CompiledDefinition) -> Option<String> {
        (self.func)(definition)
    }
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Helper")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Fallback rule used when no record supplies a value.
#[derive(Debug, Clone, Default)]
pub enum PopulateFrom {
    /// No fallback; the field resolves to nothing.
    #[default]
    NotSet,
    /// A fixed value, used verbatim.
    Literal(String),
    /// The name of another field (resolved recursively) or of a helper
    /// registered on the definition.
    FieldRef(String),
    /// A callable invoked at resolution time.
    Callable(Helper),
}

impl PopulateFrom {
    /// A literal fallback value.
    pub fn literal(value: impl Into<String>) -> Self {
        PopulateFrom::Literal(value.into())
    }

    /// A reference to another field or a named helper.
    pub fn field(key: impl Into<String>) -> Self {
        PopulateFrom::FieldRef(key.into())
    }

    /// A callable fallback.
    pub fn callable<F>(func: F) -> Self
    where
        F: Fn(&CompiledDefinition) -> Option<String> + Send + Sync + 'static,
    {
        PopulateFrom::Callable(Helper::new(func))
    }

    /// Whether a fallback rule is configured.
    pub fn is_set(&self) -> bool {
        !matches!(self, PopulateFrom::NotSet)
    }
}

/// Descriptor of one metadata element.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    key: String,
    kind: FieldKind,
    name: Option<String>,
    head: bool,
    editable: bool,
    populate_from: PopulateFrom,
    valid_tags: Option<BTreeSet<String>>,
    max_length: Option<usize>,
    help_text: Option<String>,
    verbose_name: Option<String>,
    choices: Vec<String>,
}

impl FieldDefinition {
    fn with_kind(kind: FieldKind, head: bool, max_length: Option<usize>) -> Self {
        Self {
            key: String::new(),
            kind,
            name: None,
            head,
            editable: true,
            populate_from: PopulateFrom::NotSet,
            valid_tags: None,
            max_length,
            help_text: None,
            verbose_name: None,
            choices: Vec::new(),
        }
    }

    /// An inline tag such as `<title>`. Not part of the head block by default.
    pub fn tag() -> Self {
        Self::with_kind(FieldKind::InlineTag, false, Some(DEFAULT_MAX_LENGTH))
    }

    /// A `<meta>` tag. Part of the head block by default.
    pub fn meta_tag() -> Self {
        Self::with_kind(FieldKind::MetaTag, true, Some(DEFAULT_MAX_LENGTH))
    }

    /// A keywords `<meta>` tag named `keywords` that permits no inner tags.
    pub fn keyword_tag() -> Self {
        let mut field = Self::with_kind(FieldKind::KeywordTag, true, Some(DEFAULT_MAX_LENGTH));
        field.name = Some("keywords".to_string());
        field.valid_tags = Some(BTreeSet::new());
        field
    }

    /// Raw head markup stored as unbounded text.
    pub fn raw() -> Self {
        Self::with_kind(FieldKind::RawBlock, true, None)
    }

    /// Create a field of the given kind with that kind's defaults.
    pub fn of_kind(kind: FieldKind) -> Self {
        match kind {
            FieldKind::InlineTag => Self::tag(),
            FieldKind::MetaTag => Self::meta_tag(),
            FieldKind::KeywordTag => Self::keyword_tag(),
            FieldKind::RawBlock => Self::raw(),
        }
    }

    /// Override the rendered tag name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Include or exclude the field from the head block.
    pub fn head(mut self, head: bool) -> Self {
        self.head = head;
        self
    }

    /// Mark the field as stored (`true`) or purely derived (`false`).
    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Set the fallback rule.
    pub fn populate_from(mut self, populate_from: PopulateFrom) -> Self {
        self.populate_from = populate_from;
        self
    }

    /// Restrict the tags allowed inside values.
    pub fn valid_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_tags = Some(tags.into_iter().map(|t| t.into().to_lowercase()).collect());
        self
    }

    /// Set the maximum stored length.
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set the help text shown to editors.
    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    /// Set the verbose (display) name.
    pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    /// Restrict stored values to a list of choices.
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// The key this field is declared under. Empty until compiled.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The rendered tag name (the key unless overridden).
    pub fn tag_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }

    /// Whether the field is part of the head block.
    pub fn is_head(&self) -> bool {
        self.head
    }

    /// Whether the field has backing storage.
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// The fallback rule.
    pub fn populate(&self) -> &PopulateFrom {
        &self.populate_from
    }

    /// Declared tag allow-list, if any.
    pub fn allowed_tags(&self) -> Option<&BTreeSet<String>> {
        self.valid_tags.as_ref()
    }

    /// Help text, explicit or derived at compile time.
    pub fn help(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    /// Verbose name, defaulting to the key with underscores as spaces.
    pub fn display_name(&self) -> String {
        self.verbose_name
            .clone()
            .unwrap_or_else(|| self.key.replace('_', " "))
    }

    /// Permitted values; empty means unrestricted.
    pub fn choice_list(&self) -> &[String] {
        &self.choices
    }

    /// The storage column type.
    pub fn storage(&self) -> Storage {
        match self.max_length {
            Some(max_length) => Storage::Char { max_length },
            None => Storage::Text,
        }
    }

    /// Normalize a raw value for rendering.
    pub fn clean(&self, raw: &str) -> String {
        format::clean(self, raw)
    }

    /// Render a cleaned value as a markup fragment.
    pub fn render(&self, value: &str) -> String {
        format::render(self, value)
    }

    pub(crate) fn bind_key(&mut self, key: &str) {
        self.key = key.to_string();
    }

    pub(crate) fn set_help_text(&mut self, help_text: String) {
        self.help_text = Some(help_text);
    }

    /// Check the field's own invariants. Called once the key is bound.
    pub(crate) fn validate(&self) -> Result<(), DefinitionError> {
        if !self.editable && !self.populate_from.is_set() {
            return Err(DefinitionError::MissingPopulateFrom(self.key.clone()));
        }

        let name = self.tag_name();
        match self.kind {
            FieldKind::MetaTag | FieldKind::KeywordTag => {
                if !is_valid_meta_name(name) {
                    return Err(DefinitionError::InvalidTagName {
                        key: self.key.clone(),
                        name: name.to_string(),
                    });
                }
            }
            FieldKind::InlineTag => {
                if !is_valid_tag_name(name) {
                    return Err(DefinitionError::InvalidTagName {
                        key: self.key.clone(),
                        name: name.to_string(),
                    });
                }
            }
            FieldKind::RawBlock => {}
        }
        Ok(())
    }
}
