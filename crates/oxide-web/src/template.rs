//! Seam for the HTML template collaborator.
//!
//! The engine ships no template language. Applications install a
//! [`TemplateRenderer`] on the [`Engine`](crate::Engine) and handlers reach
//! it through [`Context::html`](crate::Context::html).

use crate::error::TemplateError;

/// Renders a named template with JSON data.
pub trait TemplateRenderer: Send + Sync {
    /// Renders template `name` to a string.
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, TemplateError>;
}
