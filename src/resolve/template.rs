//! resolve::template
//!
//! Substitution of `{{ ... }}` placeholders in stored values.
//!
//! The resolver only sniffs values for `{`; everything about the syntax is
//! left to a [`TemplateRenderer`]. [`LiquidRenderer`] is the default.

use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// Errors from template rendering.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template parse error: {0}")]
    Parse(String),

    #[error("template render error: {0}")]
    Render(String),
}

/// Renders a template string against a JSON object context.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Map<String, Value>) -> Result<String, TemplateError>;
}

/// [`TemplateRenderer`] backed by the Liquid template language.
///
/// Undefined variables are render errors.
///
/// # Example
///
/// ```
/// use metahead::resolve::template::{LiquidRenderer, TemplateRenderer};
/// use serde_json::json;
///
/// let renderer = LiquidRenderer::new();
/// let context = json!({ "product": { "name": "Lamp" } });
/// let out = renderer
///     .render("Buy {{ product.name | upcase }}", context.as_object().unwrap())
///     .unwrap();
/// assert_eq!(out, "Buy LAMP");
/// ```
#[derive(Default)]
pub struct LiquidRenderer {
    parser: OnceLock<Result<liquid::Parser, String>>,
}

impl std::fmt::Debug for LiquidRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiquidRenderer").finish_non_exhaustive()
    }
}

impl LiquidRenderer {
    /// Create a renderer. The parser is built on first use.
    pub fn new() -> Self {
        Self::default()
    }

    fn parser(&self) -> Result<&liquid::Parser, TemplateError> {
        self.parser
            .get_or_init(|| {
                liquid::ParserBuilder::with_stdlib()
                    .build()
                    .map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|e| TemplateError::Parse(e.clone()))
    }
}

impl TemplateRenderer for LiquidRenderer {
    fn render(&self, template: &str, context: &Map<String, Value>) -> Result<String, TemplateError> {
        let template = self
            .parser()?
            .parse(template)
            .map_err(|e| TemplateError::Parse(e.to_string()))?;
        let globals =
            liquid::model::to_object(context).map_err(|e| TemplateError::Render(e.to_string()))?;
        template
            .render(&globals)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }
}
