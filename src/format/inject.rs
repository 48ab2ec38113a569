//! format::inject
//!
//! Insert a rendered head block into a complete HTML document.
//!
//! # Example
//!
//! ```
//! use metahead::format::inject_head;
//!
//! let page = "<html><HEAD lang=\"en\"><link rel=\"icon\"></HEAD><body></body></html>";
//! let out = inject_head(page, "<title>Home</title>").unwrap();
//! assert_eq!(
//!     out,
//!     "<html><HEAD lang=\"en\">\n<title>Home</title><link rel=\"icon\"></HEAD><body></body></html>"
//! );
//!
//! assert!(inject_head("<p>fragment</p>", "<title>x</title>").is_none());
//! ```

use regex::Regex;
use std::sync::OnceLock;

fn head_open_tag() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("head tag pattern is valid"))
}

/// Insert `head_block` on a new line right after the first `<head>` tag.
///
/// Returns `None` when the document has no `<head>` tag. `<header>` does
/// not count as a head tag.
pub fn inject_head(document: &str, head_block: &str) -> Option<String> {
    let tag = head_open_tag().find(document)?;
    let mut out = String::with_capacity(document.len() + head_block.len() + 1);
    out.push_str(&document[..tag.end()]);
    out.push('\n');
    out.push_str(head_block);
    out.push_str(&document[tag.end()..]);
    Some(out)
}
