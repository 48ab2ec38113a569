//! core
//!
//! Core domain types, naming rules and configuration for metahead.
//!
//! # Modules
//!
//! - [`types`] - Strong types: PagePath, Language, ViewName, ObjectRef, etc.
//! - [`naming`] - Reserved names and tag/meta name validation
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Invalid configuration fails at load, never at request time

pub mod config;
pub mod naming;
pub mod types;
