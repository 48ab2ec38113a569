//! core::naming
//!
//! Naming rules shared by definitions and record schemas.
//!
//! # Features
//!
//! - Validate rendered `<meta>` tag names
//! - Reserved record column names
//! - Derive human readable names from definition names

use regex::Regex;
use std::sync::OnceLock;

/// Column names used by record identity and scoping.
///
/// Field keys may not reuse any of these.
pub const RESERVED_FIELD_NAMES: &[&str] = &[
    "id",
    "path",
    "linked_type",
    "linked_id",
    "linked_object",
    "view_name",
    "site",
    "language",
    "definition",
];

/// Check whether a field key collides with a reserved column name.
pub fn is_reserved(key: &str) -> bool {
    RESERVED_FIELD_NAMES.contains(&key)
}

fn meta_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_:.\-]*$").expect("meta name pattern is valid")
    })
}

/// Check that a name is usable as the `name` attribute of a `<meta>` tag.
///
/// # Example
///
/// ```
/// use metahead::core::naming::is_valid_meta_name;
///
/// assert!(is_valid_meta_name("description"));
/// assert!(is_valid_meta_name("og:title"));
/// assert!(!is_valid_meta_name("1st"));
/// assert!(!is_valid_meta_name("with space"));
/// ```
pub fn is_valid_meta_name(name: &str) -> bool {
    meta_name_pattern().is_match(name)
}

/// Check that a name is usable as an element name for inline tags.
///
/// Element names are ASCII letters and digits with optional `:`, `-` or `_`,
/// starting with a letter (`title`, `h1`, `hs:tag`).
pub fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '_'))
}

/// Derive a verbose name from a CamelCase definition name.
///
/// # Example
///
/// ```
/// use metahead::core::naming::verbose_name;
///
/// assert_eq!(verbose_name("BasicMetadata"), "basic metadata");
/// assert_eq!(verbose_name("SEOData"), "seo data");
/// assert_eq!(verbose_name("site_metadata"), "site metadata");
/// ```
pub fn verbose_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            out.push(' ');
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || (prev.is_uppercase() && next_is_lower) {
                out.push(' ');
            }
        }
        out.extend(c.to_lowercase());
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names() {
        assert!(is_reserved("path"));
        assert!(is_reserved("site"));
        assert!(!is_reserved("title"));
    }

    #[test]
    fn meta_names() {
        assert!(is_valid_meta_name("hs:metatag"));
        assert!(is_valid_meta_name("a.b-c_d"));
        assert!(!is_valid_meta_name(""));
        assert!(!is_valid_meta_name("_hidden"));
        assert!(!is_valid_meta_name("bad\"quote"));
    }

    #[test]
    fn tag_names() {
        assert!(is_valid_tag_name("h1"));
        assert!(is_valid_tag_name("hs:tag"));
        assert!(!is_valid_tag_name("1h"));
        assert!(!is_valid_tag_name("a b"));
        assert!(!is_valid_tag_name(""));
    }

    #[test]
    fn verbose_name_splits_words() {
        assert_eq!(verbose_name("Coverage"), "coverage");
        assert_eq!(verbose_name("WithSites"), "with sites");
        assert_eq!(verbose_name("HTMLHead"), "html head");
    }
}
