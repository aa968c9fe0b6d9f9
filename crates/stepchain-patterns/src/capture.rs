//! Capture extraction for compiled step patterns.

use regex::Regex;

/// Return the placeholder captures when `text` matches `re`, or `None`.
///
/// Group 0 is skipped so only placeholders contribute. Groups that did not
/// participate yield empty strings to keep positions aligned with the
/// pattern's placeholders.
///
/// # Examples
/// ```
/// use stepchain_patterns::{compile_regex_from_pattern, extract_captured_values};
///
/// let Ok(regex) = compile_regex_from_pattern("I log in as {user}") else {
///     panic!("pattern compiles");
/// };
/// assert_eq!(
///     extract_captured_values(&regex, "I log in as admin"),
///     Some(vec!["admin".to_string()])
/// );
/// assert!(extract_captured_values(&regex, "I log out").is_none());
/// ```
#[must_use]
pub fn extract_captured_values(re: &Regex, text: &str) -> Option<Vec<String>> {
    let caps = re.captures(text)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regex(source: &str) -> Regex {
        Regex::new(source).unwrap_or_else(|e| panic!("test regex must compile: {e}"))
    }

    #[test]
    fn collects_captures_in_order() {
        let re = regex(r"^(\d+)-(\w+)$");
        assert_eq!(
            extract_captured_values(&re, "12-answer"),
            Some(vec!["12".to_string(), "answer".to_string()])
        );
    }

    #[test]
    fn keeps_positions_for_missing_optional_groups() {
        let re = regex(r"^(a)?(b)?$");
        assert_eq!(
            extract_captured_values(&re, "a"),
            Some(vec!["a".to_string(), String::new()])
        );
    }
}
