//! Turn lexed tokens into an anchored regular-expression source.

use super::lexer::{Token, lex_pattern};
use crate::errors::PatternError;

/// Translate a placeholder type hint into a regular-expression fragment.
///
/// Unknown hints, and placeholders without one, match lazily.
///
/// # Examples
/// ```
/// use stepchain_patterns::get_type_pattern;
///
/// assert_eq!(get_type_pattern(Some("u32")), r"\d+");
/// assert_eq!(get_type_pattern(None), ".+?");
/// ```
#[must_use]
pub fn get_type_pattern(type_hint: Option<&str>) -> &'static str {
    match type_hint {
        Some("u8" | "u16" | "u32" | "u64" | "u128" | "usize") => r"\d+",
        Some("i8" | "i16" | "i32" | "i64" | "i128" | "isize") => r"[+-]?\d+",
        Some("f32" | "f64") => r"[+-]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?",
        Some("word") => r"\S+",
        _ => ".+?",
    }
}

/// Build an anchored regular-expression source from a step pattern.
///
/// # Errors
/// Returns [`PatternError`] when the pattern contains stray braces or a
/// malformed placeholder.
///
/// # Examples
/// ```
/// use stepchain_patterns::build_regex_from_pattern;
///
/// let Ok(source) = build_regex_from_pattern("I press {button}") else {
///     panic!("pattern compiles");
/// };
/// assert_eq!(source, "^I press (.+?)$");
/// ```
pub fn build_regex_from_pattern(pat: &str) -> Result<String, PatternError> {
    let tokens = lex_pattern(pat)?;
    let mut regex = String::with_capacity(pat.len().saturating_mul(2).saturating_add(2));
    regex.push('^');
    for token in tokens {
        match token {
            Token::Literal(text) => regex.push_str(&regex::escape(&text)),
            Token::Placeholder { hint, .. } => {
                regex.push('(');
                regex.push_str(get_type_pattern(hint.as_deref()));
                regex.push(')');
            }
        }
    }
    regex.push('$');
    Ok(regex)
}
