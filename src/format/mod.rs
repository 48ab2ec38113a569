//! format
//!
//! Turns resolved raw values into renderable markup fragments.
//!
//! # Rules
//!
//! | Kind        | Cleaning                                              | Rendering                                  |
//! |-------------|-------------------------------------------------------|--------------------------------------------|
//! | InlineTag   | escape tags outside the inline allow-list, trim       | `<name>value</name>`                       |
//! | MetaTag     | escape tags, `"` → `&#34;`, newline → space, trim     | `<meta name="name" content="value" />`     |
//! | KeywordTag  | escape tags, `"` → `&#34;`, newline → `, `, trim      | `<meta name="keywords" content="value" />` |
//! | RawBlock    | strip to head-safe tags, drop text around the tags    | verbatim                                   |
//!
//! Tag escaping and stripping need an HTML parser and are only performed
//! when the `html-parser` feature is enabled. Without it those steps pass
//! values through unchanged. This is best-effort cleanup for well-meaning
//! editors, not a sanitizer.
//!
//! # Example
//!
//! ```
//! use metahead::definition::{DefinitionBuilder, FieldDefinition};
//!
//! let def = DefinitionBuilder::new("Example")
//!     .field("keywords", FieldDefinition::keyword_tag())
//!     .build()
//!     .unwrap();
//! let field = def.field("keywords").unwrap();
//!
//! let cleaned = field.clean("Some, keywords\", with\n other, chars'");
//! assert_eq!(cleaned, "Some, keywords&#34;, with,  other, chars'");
//! assert_eq!(
//!     field.render(&cleaned),
//!     "<meta name=\"keywords\" content=\"Some, keywords&#34;, with,  other, chars'\" />"
//! );
//! ```

pub mod html;
pub mod inject;

pub use html::{escape_tags, parser_available, strip_tags};
pub use inject::inject_head;

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::definition::{FieldDefinition, FieldKind};

/// Tags allowed in raw head markup.
pub const VALID_HEAD_TAGS: &[&str] = &["head", "title", "base", "link", "meta", "script"];

/// Tags allowed inside inline tag values by default.
pub const VALID_INLINE_TAGS: &[&str] = &[
    "area", "img", "object", "map", "param", "a", "abbr", "acronym", "dfn", "em", "strong",
    "code", "samp", "kbd", "var", "b", "i", "big", "small", "tt", "span", "br", "bdo", "cite",
    "del", "ins", "q", "sub", "sup",
];

fn tag_set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

fn text_before_tags() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^<>]*<").expect("leading text pattern is valid"))
}

fn text_after_tags() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r">[^<>]*$").expect("trailing text pattern is valid"))
}

fn single_line(value: &str, separator: &str) -> String {
    value
        .replace("\r\n", "\n")
        .replace('"', "&#34;")
        .replace('\n', separator)
        .trim()
        .to_string()
}

/// Normalize a raw value according to the field's kind.
pub fn clean(field: &FieldDefinition, raw: &str) -> String {
    match field.kind() {
        FieldKind::InlineTag => {
            let allowed = field
                .allowed_tags()
                .cloned()
                .unwrap_or_else(|| tag_set(VALID_INLINE_TAGS));
            escape_tags(raw, &allowed).trim().to_string()
        }
        FieldKind::MetaTag => {
            let allowed = field.allowed_tags().cloned().unwrap_or_default();
            single_line(&escape_tags(raw, &allowed), " ")
        }
        FieldKind::KeywordTag => {
            let allowed = field.allowed_tags().cloned().unwrap_or_default();
            single_line(&escape_tags(raw, &allowed), ", ")
        }
        FieldKind::RawBlock => clean_raw(field, raw),
    }
}

fn clean_raw(field: &FieldDefinition, raw: &str) -> String {
    if !field.is_head() {
        return match field.allowed_tags() {
            Some(allowed) => strip_tags(raw, allowed),
            None => raw.to_string(),
        };
    }

    let mut allowed = tag_set(VALID_HEAD_TAGS);
    if let Some(declared) = field.allowed_tags() {
        allowed = allowed.intersection(declared).cloned().collect();
    }
    let stripped = strip_tags(raw, &allowed);
    let stripped = text_before_tags().replace(&stripped, "<");
    text_after_tags().replace(&stripped, ">").into_owned()
}

/// Render a cleaned value as a markup fragment.
pub fn render(field: &FieldDefinition, value: &str) -> String {
    match field.kind() {
        FieldKind::InlineTag => {
            let name = field.tag_name();
            format!("<{name}>{value}</{name}>")
        }
        FieldKind::MetaTag | FieldKind::KeywordTag => {
            format!(
                "<meta name=\"{}\" content=\"{}\" />",
                field.tag_name(),
                value
            )
        }
        FieldKind::RawBlock => value.to_string(),
    }
}
