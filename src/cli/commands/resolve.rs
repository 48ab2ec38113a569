//! resolve command - Resolve metadata for a path and print it

use anyhow::{Context as _, Result};
use indexmap::IndexMap;

use super::Session;
use crate::cli::{Context, RequestArgs};
use crate::core::types::PagePath;

/// Resolve metadata for `path`.
///
/// Prints the head block, or a single field or group, or every raw value as
/// JSON when `json` is set.
pub fn resolve(
    ctx: &Context,
    path: &str,
    field: Option<&str>,
    group: Option<&str>,
    json: bool,
    request: &RequestArgs,
) -> Result<()> {
    let path = PagePath::new(path).context("Invalid path")?;
    let session = Session::open(ctx, request)?;
    let metadata = session
        .resolver
        .resolve(request.definition.as_deref(), path.as_str(), &session.scope)
        .with_context(|| format!("Failed to resolve metadata for '{}'", path))?;

    if json {
        let values: IndexMap<&str, Option<&str>> = metadata.values().collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    let output = match (field, group) {
        (Some(key), _) => metadata.field(key)?.render(),
        (None, Some(name)) => metadata.group(name)?,
        (None, None) => metadata.head(),
    };
    println!("{}", output);
    Ok(())
}
