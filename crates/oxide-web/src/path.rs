//! Path tokenizing and segment classification.

use crate::error::{Result, RouterError};

/// A segment in a path pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment<'a> {
    /// A literal string segment.
    Literal(&'a str),
    /// A parameter segment (e.g., `:id`), holding the name.
    Param(&'a str),
    /// A wildcard segment (e.g., `*filepath`) that matches the remainder of
    /// the path. The name may be empty for a bare `*`.
    Wildcard(&'a str),
}

impl<'a> PathSegment<'a> {
    /// Classifies a single token by its leading character.
    pub fn parse(part: &'a str) -> Self {
        if let Some(name) = part.strip_prefix(':') {
            Self::Param(name)
        } else if let Some(name) = part.strip_prefix('*') {
            Self::Wildcard(name)
        } else {
            Self::Literal(part)
        }
    }

    /// Returns true for parameter and wildcard segments.
    pub fn is_wild(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }
}

/// Splits a path into its non-empty `/`-separated tokens.
///
/// Tokenizing stops right after the first token beginning with `*`, so a
/// wildcard is always the last token returned and anything after it is
/// ignored.
///
/// # Example
///
/// ```
/// use oxide_web::path::tokenize;
///
/// assert_eq!(tokenize("/p/:lang/doc"), vec!["p", ":lang", "doc"]);
/// assert_eq!(tokenize("//assets/*filepath/ignored"), vec!["assets", "*filepath"]);
/// assert!(tokenize("/").is_empty());
/// ```
pub fn tokenize(path: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for part in path.split('/').filter(|s| !s.is_empty()) {
        parts.push(part);
        if part.starts_with('*') {
            break;
        }
    }
    parts
}

/// Checks a route pattern before it is inserted into a trie.
///
/// Request paths are never validated, only registration patterns.
pub fn validate_pattern(pattern: &str) -> Result<()> {
    let invalid = |reason: &str| RouterError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if !pattern.starts_with('/') {
        return Err(invalid("pattern must start with '/'"));
    }

    let mut parts = pattern.split('/').filter(|s| !s.is_empty()).peekable();
    while let Some(part) = parts.next() {
        match PathSegment::parse(part) {
            PathSegment::Param("") => return Err(invalid("parameter segment needs a name")),
            PathSegment::Wildcard(_) if parts.peek().is_some() => {
                return Err(invalid("wildcard segment must be the last segment"));
            }
            _ => {}
        }
    }

    Ok(())
}
