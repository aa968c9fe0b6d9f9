//! Error types raised while compiling step patterns.

use std::fmt;
use thiserror::Error;

/// Why and where a pattern failed to lex.
///
/// # Examples
/// ```
/// use stepchain_patterns::PlaceholderErrorInfo;
/// let reason = "missing closing '}' for placeholder";
/// let info = PlaceholderErrorInfo::new(reason, 4, Some("user".into()));
/// assert_eq!(info.position, 4);
/// assert_eq!(info.placeholder.as_deref(), Some("user"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderErrorInfo {
    /// What went wrong.
    pub message: &'static str,
    /// Zero-based byte offset in the pattern.
    pub position: usize,
    /// Name of the placeholder being read, if any.
    pub placeholder: Option<String>,
}

impl PlaceholderErrorInfo {
    /// Create a new error description.
    #[must_use]
    pub fn new(message: &'static str, position: usize, placeholder: Option<String>) -> Self {
        Self {
            message,
            position,
            placeholder,
        }
    }
}

impl fmt::Display for PlaceholderErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)?;
        if let Some(name) = &self.placeholder {
            write!(f, " in placeholder '{name}'")?;
        }
        write!(f, " at byte offset {}", self.position)
    }
}

/// Errors surfaced while converting step patterns into regular expressions.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The pattern text is malformed.
    #[error("{0}")]
    Placeholder(PlaceholderErrorInfo),
    /// The generated regular expression was rejected by the regex engine.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub(crate) fn placeholder_error(
    message: &'static str,
    position: usize,
    placeholder: Option<String>,
) -> PatternError {
    PatternError::Placeholder(PlaceholderErrorInfo::new(message, position, placeholder))
}
