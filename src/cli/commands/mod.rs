//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and validates command-specific arguments
//! 2. Calls the library to compile or resolve
//! 3. Formats and displays output
//!
//! Records come from JSON fixture files loaded into a
//! [`MemoryStore`]; nothing is persisted.

mod check;
mod inject;
mod resolve;

pub use check::check;
pub use inject::inject;
pub use resolve::resolve;

use anyhow::{bail, Context as _, Result};
use indexmap::IndexMap;
use std::fs;
use std::sync::Arc;

use super::args::{Command, RequestArgs};
use super::Context;
use crate::backend::MemoryStore;
use crate::core::config::Config;
use crate::core::types::{Language, Site};
use crate::definition::{default_definition, Registry};
use crate::resolve::{RequestScope, Resolver};

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Check => check::check(ctx),
        Command::Resolve {
            path,
            field,
            group,
            json,
            request,
        } => resolve::resolve(ctx, &path, field.as_deref(), group.as_deref(), json, &request),
        Command::Inject {
            html,
            path,
            request,
        } => inject::inject(ctx, &html, &path, &request),
    }
}

/// Load configuration from `--config` or the default locations.
fn load_config(ctx: &Context) -> Result<Config> {
    let config = Config::load(ctx.config.as_deref()).context("Failed to load configuration")?;
    if ctx.debug {
        match config.loaded_from() {
            Some(path) => eprintln!("[debug] config: {}", path.display()),
            None => eprintln!("[debug] config: defaults"),
        }
    }
    Ok(config)
}

/// Compile the configured definitions, or the default definition when the
/// configuration declares none.
fn load_registry(config: &Config) -> Result<Registry> {
    if config.file.definitions.is_empty() {
        let mut registry = Registry::new();
        registry.register(default_definition())?;
        return Ok(registry);
    }
    config
        .registry(&IndexMap::new())
        .context("Failed to compile metadata definitions")
}

/// A resolver and request scope built from the shared request flags.
struct Session {
    resolver: Resolver,
    scope: RequestScope,
}

impl Session {
    fn open(ctx: &Context, request: &RequestArgs) -> Result<Self> {
        let config = load_config(ctx)?;
        let registry = load_registry(&config)?;

        let store = match &request.records {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read records from '{}'", path.display()))?;
                MemoryStore::from_json(&json)
                    .with_context(|| format!("Invalid records in '{}'", path.display()))?
            }
            None => MemoryStore::new(),
        };
        if ctx.debug {
            eprintln!("[debug] records: {}", store.len());
        }

        let mut resolver = Resolver::new(Arc::new(registry), Arc::new(store))
            .with_routes(config.routes().context("Invalid route table")?);
        if !request.no_cache {
            resolver = resolver.with_cache(config.cache());
        }

        Ok(Self {
            resolver,
            scope: request_scope(request)?,
        })
    }
}

fn request_scope(request: &RequestArgs) -> Result<RequestScope> {
    let mut scope = RequestScope::new();
    if let (Some(id), Some(domain)) = (request.site, &request.domain) {
        scope = scope.with_site(Site::new(id, domain.as_str()));
    }
    if let Some(code) = &request.language {
        scope = scope.with_language(Language::new(code.as_str()).context("Invalid language")?);
    }
    if let Some(path) = &request.context {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read context from '{}'", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&json)
            .with_context(|| format!("Invalid JSON in '{}'", path.display()))?;
        match value {
            serde_json::Value::Object(map) => scope = scope.with_context(map),
            _ => bail!("Template context in '{}' must be a JSON object", path.display()),
        }
    }
    Ok(scope)
}
