//! format::html
//!
//! Tag escaping and stripping backed by an HTML parser.
//!
//! With the `html-parser` feature the value is parsed as an HTML fragment
//! (via `scraper`). Without it, both operations return their input
//! unchanged and [`parser_available`] reports `false`.

use std::collections::BTreeSet;

/// Whether parser-backed cleaning is compiled in.
pub fn parser_available() -> bool {
    cfg!(feature = "html-parser")
}

/// Escape every tag whose name is not in `allowed`.
///
/// Allowed elements are re-emitted as markup (recursively cleaned); other
/// elements are emitted as escaped text. Text is escaped for `&`, `<` and
/// `>`. Comments are dropped.
pub fn escape_tags(value: &str, allowed: &BTreeSet<String>) -> String {
    #[cfg(feature = "html-parser")]
    {
        if !value.contains(['<', '>', '&']) {
            return value.to_string();
        }
        parsed::escape(value, allowed)
    }
    #[cfg(not(feature = "html-parser"))]
    {
        let _ = allowed;
        value.to_string()
    }
}

/// Keep only top-level elements whose name is in `allowed`.
///
/// Non-whitespace text, comments and other elements at the top level are
/// removed. Kept elements are serialized as parsed.
pub fn strip_tags(value: &str, allowed: &BTreeSet<String>) -> String {
    #[cfg(feature = "html-parser")]
    {
        parsed::strip(value, allowed)
    }
    #[cfg(not(feature = "html-parser"))]
    {
        let _ = allowed;
        value.to_string()
    }
}

#[cfg(feature = "html-parser")]
mod parsed {
    use scraper::{ElementRef, Html, Node};
    use std::collections::BTreeSet;
    use std::fmt::Write;

    const VOID_ELEMENTS: &[&str] = &[
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ];

    fn escape_text(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    fn escape_attribute(value: &str) -> String {
        value.replace('&', "&amp;").replace('"', "&quot;")
    }

    pub(super) fn escape(value: &str, allowed: &BTreeSet<String>) -> String {
        let fragment = Html::parse_fragment(value);
        let mut out = String::with_capacity(value.len());
        escape_children(fragment.root_element(), allowed, &mut out);
        out
    }

    fn escape_children(parent: ElementRef<'_>, allowed: &BTreeSet<String>, out: &mut String) {
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&escape_text(text)),
                Node::Element(element) => {
                    let Some(element_ref) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let name = element.name();
                    if !allowed.contains(name) {
                        out.push_str(&escape_text(&element_ref.html()));
                        continue;
                    }
                    out.push('<');
                    out.push_str(name);
                    for (attr, attr_value) in element.attrs() {
                        let _ = write!(out, " {}=\"{}\"", attr, escape_attribute(attr_value));
                    }
                    out.push('>');
                    if VOID_ELEMENTS.contains(&name) {
                        continue;
                    }
                    escape_children(element_ref, allowed, out);
                    let _ = write!(out, "</{name}>");
                }
                _ => {}
            }
        }
    }

    pub(super) fn strip(value: &str, allowed: &BTreeSet<String>) -> String {
        let fragment = Html::parse_fragment(value);
        let mut out = String::with_capacity(value.len());
        for child in fragment.root_element().children() {
            match child.value() {
                Node::Text(text) if text.trim().is_empty() => out.push_str(text),
                Node::Element(element) if allowed.contains(element.name()) => {
                    if let Some(element_ref) = ElementRef::wrap(child) {
                        out.push_str(&element_ref.html());
                    }
                }
                _ => {}
            }
        }
        out
    }
}
