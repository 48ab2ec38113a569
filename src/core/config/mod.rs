//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! A configuration file declares metadata definitions, the static route
//! table used by the view backend, and cache settings. Embedding programs
//! can also build definitions in code and skip configuration entirely.
//!
//! # Locations
//!
//! Searched in order, first hit wins:
//! 1. An explicit path (the CLI's `--config`)
//! 2. `$METAHEAD_CONFIG` if set
//! 3. `./metahead.toml`
//! 4. `$XDG_CONFIG_HOME/metahead/config.toml`
//! 5. `~/.metahead/config.toml`
//!
//! An explicit path must exist. For the others a missing file is skipped,
//! and when nothing is found defaults are used.
//!
//! # Example
//!
//! ```
//! use metahead::core::config::Config;
//! use indexmap::IndexMap;
//!
//! let config = Config::from_toml_str(
//!     r#"
//!     [[definition]]
//!     name = "Coverage"
//!     [[definition.field]]
//!     key = "title"
//!     kind = "tag"
//!     "#,
//! )
//! .unwrap();
//!
//! let registry = config.registry(&IndexMap::new()).unwrap();
//! assert_eq!(registry.get(Some("Coverage")).unwrap().name(), "Coverage");
//! ```

pub mod schema;

pub use schema::{
    CacheConfig, DefinitionConfig, FieldConfig, FileConfig, PopulateConfig, RouteConfig,
};

use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::backend::StaticRoutes;
use crate::cache::MemoryCache;
use crate::core::types::ViewName;
use crate::definition::{CompiledDefinition, DefinitionError, Helper, Registry};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "METAHEAD_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("invalid definition: {0}")]
    Definition(#[from] DefinitionError),
}

/// Loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents.
    pub file: FileConfig,
    /// Path the configuration was loaded from, if any.
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit path cannot be read, or if a config
    /// file exists but cannot be parsed or fails validation. Missing config
    /// files at the default locations are not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            return Self::read(path);
        }
        match Self::discover() {
            Some(path) => Self::read(&path),
            None => Ok(Config::default()),
        }
    }

    /// Parse and validate configuration from a string.
    pub fn from_toml_str(contents: &str) -> Result<Config, ConfigError> {
        let file = Self::parse(contents, Path::new("<string>"))?;
        Ok(Config { file, path: None })
    }

    /// First existing file among the default locations.
    fn discover() -> Option<PathBuf> {
        // 1. Check $METAHEAD_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check ./metahead.toml
        let local = PathBuf::from("metahead.toml");
        if local.exists() {
            return Some(local);
        }

        // 3. Check $XDG_CONFIG_HOME/metahead/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("metahead/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 4. Check ~/.metahead/config.toml
        dirs::home_dir()
            .map(|home| home.join(".metahead/config.toml"))
            .filter(|path| path.exists())
    }

    /// Read, parse and validate a config file.
    fn read(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file = Self::parse(&contents, path)?;
        Ok(Config {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    fn parse(contents: &str, path: &Path) -> Result<FileConfig, ConfigError> {
        let file: FileConfig = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;
        Ok(file)
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Compile every declared definition.
    ///
    /// Every helper in `helpers` is offered to every definition; fields whose
    /// `populate_from` names a helper that is not supplied fail to compile.
    pub fn definitions(
        &self,
        helpers: &IndexMap<String, Helper>,
    ) -> Result<Vec<CompiledDefinition>, ConfigError> {
        self.file
            .definitions
            .iter()
            .map(|entry| -> Result<CompiledDefinition, ConfigError> {
                let mut builder = entry.builder()?;
                for (name, helper) in helpers {
                    builder = builder.helper(name.clone(), helper.clone());
                }
                Ok(builder.build()?)
            })
            .collect()
    }

    /// Compile every declared definition into a registry.
    pub fn registry(&self, helpers: &IndexMap<String, Helper>) -> Result<Registry, ConfigError> {
        let mut registry = Registry::new();
        for definition in self.definitions(helpers)? {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// The static route table.
    pub fn routes(&self) -> Result<StaticRoutes, ConfigError> {
        let mut routes = StaticRoutes::new();
        for route in &self.file.routes {
            let view = ViewName::new(route.view.as_str())
                .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
            routes.add(&route.pattern, view).map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "invalid route pattern '{}': {}",
                    route.pattern, e
                ))
            })?;
        }
        Ok(routes)
    }

    /// An in-process cache honouring the configured time to live.
    pub fn cache(&self) -> MemoryCache {
        let ttl = self
            .file
            .cache
            .as_ref()
            .and_then(|c| c.ttl_seconds)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds);
        match ttl {
            Some(ttl) => MemoryCache::with_ttl(ttl),
            None => MemoryCache::new(),
        }
    }
}
