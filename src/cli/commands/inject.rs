//! inject command - Insert the head block into an HTML document

use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

use super::Session;
use crate::cli::{Context, RequestArgs};
use crate::core::types::PagePath;
use crate::format::inject_head;

/// Print `html` with the head block for `path` injected after `<head>`.
pub fn inject(ctx: &Context, html: &Path, path: &str, request: &RequestArgs) -> Result<()> {
    let document = fs::read_to_string(html)
        .with_context(|| format!("Failed to read '{}'", html.display()))?;

    let path = PagePath::new(path).context("Invalid path")?;
    let session = Session::open(ctx, request)?;
    let metadata = session
        .resolver
        .resolve(request.definition.as_deref(), path.as_str(), &session.scope)
        .with_context(|| format!("Failed to resolve metadata for '{}'", path))?;

    match inject_head(&document, &metadata.head()) {
        Some(injected) => print!("{}", injected),
        None => {
            tracing::warn!(file = %html.display(), "document has no <head> tag; printed unchanged");
            print!("{}", document);
        }
    }
    Ok(())
}
