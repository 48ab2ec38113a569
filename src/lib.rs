//! metahead - path-aware page metadata resolution
//!
//! metahead resolves the metadata of a web page (title, description,
//! keywords, arbitrary head markup) from records attached at several levels
//! of specificity, and renders the result as escaped HTML for the document
//! head.
//!
//! # Architecture
//!
//! - [`definition`] - Declarative metadata definitions, compiled once
//! - [`backend`] - Record stores, the candidate chain and object linkage
//! - [`resolve`] - Per-field value resolution and bound results
//! - [`format`] - Escaping, tag stripping and head rendering
//! - [`cache`] - Memoization of resolved values and head blocks
//! - [`core`] - Domain types, naming rules and configuration
//! - [`cli`] - Command-line interface layer
//!
//! # Resolution Order
//!
//! For every field, records are consulted most specific first:
//!
//! 1. A record attached to the exact request path
//! 2. A record linked to the object the path belongs to
//! 3. A record shared by every object of that type
//! 4. A record attached to the routed view
//!
//! The first non-empty value wins. When every record is empty the field's
//! `populate_from` rule supplies the value.
//!
//! # Example
//!
//! ```
//! use metahead::backend::{MemoryStore, NewRecord, RecordIdentity};
//! use metahead::definition::{default_definition, Registry};
//! use metahead::resolve::{RequestScope, Resolver};
//! use std::sync::Arc;
//!
//! let mut registry = Registry::new();
//! registry.register(default_definition()).unwrap();
//!
//! let store = MemoryStore::with_records([NewRecord::new(
//!     "DefaultMetadata",
//!     RecordIdentity::Path { path: "/about/".into() },
//! )
//! .value("title", "About us")])
//! .unwrap();
//!
//! let resolver = Resolver::new(Arc::new(registry), Arc::new(store));
//! let meta = resolver.resolve(None, "/about/", &RequestScope::new()).unwrap();
//! assert_eq!(meta.value("title").unwrap(), Some("About us"));
//! assert!(meta.head().contains("<title>About us</title>"));
//! ```

pub mod backend;
pub mod cache;
pub mod cli;
pub mod core;
pub mod definition;
pub mod format;
pub mod resolve;
