//! Step-pattern lexing and compilation.

mod compiler;
pub(crate) mod lexer;

use crate::errors::PatternError;
use regex::Regex;

pub use compiler::{build_regex_from_pattern, get_type_pattern};

/// Build and compile a regular expression from a step pattern.
///
/// # Errors
/// Returns [`PatternError`] when the pattern is malformed or the generated
/// regex cannot be compiled.
///
/// # Examples
/// ```
/// use stepchain_patterns::compile_regex_from_pattern;
///
/// let Ok(regex) = compile_regex_from_pattern("I wait {seconds:u32} seconds") else {
///     panic!("pattern compiles");
/// };
/// assert!(regex.is_match("I wait 3 seconds"));
/// assert!(!regex.is_match("I wait three seconds"));
/// ```
pub fn compile_regex_from_pattern(pat: &str) -> Result<Regex, PatternError> {
    let source = build_regex_from_pattern(pat)?;
    Ok(Regex::new(&source)?)
}

#[cfg(test)]
mod tests {
    use super::compile_regex_from_pattern;
    use crate::errors::PatternError;

    #[test]
    fn compiles_placeholder_pattern() {
        let Ok(regex) = compile_regex_from_pattern("Given {value}") else {
            panic!("pattern should compile");
        };
        assert_eq!(regex.as_str(), "^Given (.+?)$");
    }

    #[test]
    fn surfaces_regex_size_errors() {
        let heavy = format!("prefix {}", "{value:f64}".repeat(20_000));
        let Err(err) = compile_regex_from_pattern(&heavy) else {
            panic!("pattern should be too large");
        };
        assert!(matches!(
            err,
            PatternError::Regex(regex::Error::CompiledTooBig(_))
        ));
    }
}
