//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`PagePath`] - Request path that metadata is attached to
//! - [`Language`] - Language code used when i18n is enabled
//! - [`ViewName`] - Name of a routed view
//! - [`ObjectType`] / [`ObjectId`] / [`ObjectRef`] - Link to an external object
//! - [`Site`] / [`SiteId`] - Site scoping
//! - [`RecordId`] - Identity of a stored record
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use metahead::core::types::{Language, ObjectRef, ObjectType, PagePath};
//!
//! let path = PagePath::new("/products/42/").unwrap();
//! let lang = Language::new("en-gb").unwrap();
//! let product = ObjectRef::new(ObjectType::new("shop.product").unwrap(), 42);
//!
//! assert_eq!(path.as_str(), "/products/42/");
//! assert_eq!(lang.as_str(), "en-gb");
//! assert_eq!(product.to_string(), "shop.product#42");
//!
//! assert!(PagePath::new("").is_err());
//! assert!(Language::new("en gb").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid language code: {0}")]
    InvalidLanguage(String),

    #[error("invalid view name: {0}")]
    InvalidViewName(String),

    #[error("invalid object type: {0}")]
    InvalidObjectType(String),
}

/// A request path that metadata can be attached to.
///
/// Paths cannot be empty and cannot contain ASCII control characters.
/// No further normalization is applied; `/about` and `/about/` are
/// different paths.
///
/// # Example
///
/// ```
/// use metahead::core::types::PagePath;
///
/// assert!(PagePath::new("/").is_ok());
/// assert!(PagePath::new("/caf\u{e9}/").is_ok());
/// assert!(PagePath::new("/a\nb").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PagePath(String);

impl PagePath {
    /// Create a new validated path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPath` if the path is empty or contains
    /// control characters.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        if path.is_empty() {
            return Err(TypeError::InvalidPath("path cannot be empty".into()));
        }
        if path.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidPath(
                "path cannot contain control characters".into(),
            ));
        }
        Ok(Self(path))
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A language code such as `en`, `de-at` or `pt_BR`.
///
/// Codes are 1-35 characters of ASCII letters, digits, `-` and `_`,
/// starting with a letter. Comparison is exact; `en` does not match `en-gb`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    /// Create a new validated language code.
    pub fn new(code: impl Into<String>) -> Result<Self, TypeError> {
        let code = code.into();
        let starts_with_letter = code.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if !starts_with_letter || code.len() > 35 {
            return Err(TypeError::InvalidLanguage(code));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TypeError::InvalidLanguage(code));
        }
        Ok(Self(code))
    }

    /// Get the language code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The name of a routed view, e.g. `product_detail` or `shop:index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ViewName(String);

impl ViewName {
    /// Create a new validated view name.
    ///
    /// View names cannot be empty or contain whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidViewName(name));
        }
        Ok(Self(name))
    }

    /// Get the view name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The type of an external object that metadata can be linked to.
///
/// Type names are ASCII letters, digits, `_`, `.` and `-`, starting with a
/// letter (e.g. `page`, `shop.product`). The last dotted segment is used as
/// the variable name in template substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectType(String);

impl ObjectType {
    /// Create a new validated object type.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let starts_with_letter = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        let valid_chars = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
        if !starts_with_letter || !valid_chars || name.ends_with('.') {
            return Err(TypeError::InvalidObjectType(name));
        }
        Ok(Self(name))
    }

    /// Get the type name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name this type is exposed under in substitution templates.
    ///
    /// ```
    /// use metahead::core::types::ObjectType;
    ///
    /// assert_eq!(ObjectType::new("shop.product").unwrap().template_name(), "product");
    /// assert_eq!(ObjectType::new("page").unwrap().template_name(), "page");
    /// ```
    pub fn template_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

/// Identifier of an external object within its type.
pub type ObjectId = u64;

/// A `(type, id)` link to an external object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// The object's type.
    pub object_type: ObjectType,
    /// The object's id within its type.
    pub id: ObjectId,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(object_type: ObjectType, id: ObjectId) -> Self {
        Self { object_type, id }
    }
}

/// Identifier of a site when a definition is site-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub u32);

/// The site a request is served for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Site {
    /// Site identifier stored on records.
    pub id: SiteId,
    /// Domain, used as part of the cache scope key.
    pub domain: String,
}

impl Site {
    /// Create a new site.
    pub fn new(id: u32, domain: impl Into<String>) -> Self {
        Self {
            id: SiteId(id),
            domain: domain.into(),
        }
    }
}

/// Identity of a stored record, assigned by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

macro_rules! string_conversions {
    ($($ty:ident),*) => {$(
        impl TryFrom<String> for $ty {
            type Error = TypeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    )*};
}

string_conversions!(PagePath, Language, ViewName, ObjectType);

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.object_type, self.id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
