//! backend::routes
//!
//! Reverse resolution of request paths to view names for the view backend.
//!
//! Hosts with a real router implement [`RouteResolver`] over it. For
//! everything else [`StaticRoutes`] matches paths against an ordered list
//! of regular expressions.
//!
//! # Example
//!
//! ```
//! use metahead::backend::{RouteResolver, StaticRoutes};
//! use metahead::core::types::ViewName;
//!
//! let mut routes = StaticRoutes::new();
//! routes.add(r"^/products/[0-9]+/$", ViewName::new("product_detail").unwrap()).unwrap();
//! routes.add(r"^/$", ViewName::new("home").unwrap()).unwrap();
//!
//! assert_eq!(routes.view_name("/products/12/").unwrap().as_str(), "product_detail");
//! assert!(routes.view_name("/about/").is_none());
//! ```

use regex::Regex;

use crate::core::types::ViewName;

/// Maps a request path to the name of the view that serves it.
pub trait RouteResolver: Send + Sync {
    /// The view serving `path`, or `None` when no route matches.
    fn view_name(&self, path: &str) -> Option<ViewName>;
}

/// A resolver that never matches. Used when no routes are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRoutes;

impl RouteResolver for NoRoutes {
    fn view_name(&self, _path: &str) -> Option<ViewName> {
        None
    }
}

/// Ordered `(pattern, view)` table; the first matching pattern wins.
#[derive(Debug, Clone, Default)]
pub struct StaticRoutes {
    routes: Vec<(Regex, ViewName)>,
}

impl StaticRoutes {
    /// Create an empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route.
    ///
    /// # Errors
    ///
    /// Returns the regex error if `pattern` does not compile.
    pub fn add(&mut self, pattern: &str, view: ViewName) -> Result<(), regex::Error> {
        self.routes.push((Regex::new(pattern)?, view));
        Ok(())
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteResolver for StaticRoutes {
    fn view_name(&self, path: &str) -> Option<ViewName> {
        self.routes
            .iter()
            .find(|(pattern, _)| pattern.is_match(path))
            .map(|(_, view)| view.clone())
    }
}
