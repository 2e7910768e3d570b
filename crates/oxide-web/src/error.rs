//! Error types for routing and rendering.

use thiserror::Error;

/// Router-specific errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No route matched the request.
    #[error("no route matched: {method} {path}")]
    NotFound { method: String, path: String },

    /// A route pattern was rejected at registration.
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The method name is not one the router knows.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
}

/// Errors reported by a [`TemplateRenderer`](crate::TemplateRenderer).
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template with this name is loaded.
    #[error("template not found: {0}")]
    NotFound(String),

    /// The template failed while rendering.
    #[error("template render failed: {0}")]
    Render(String),

    /// The template data could not be converted to JSON.
    #[error("template data serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
