//! Scenario outline tokens.
//!
//! A scenario outline row maps column headers to values. Every step derived
//! from the row, including steps chained by a definition at runtime, has its
//! `<header>` tokens replaced with the row's values.

use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([^<>\s][^<>]*)>").unwrap_or_else(|_| unreachable!("token regex is valid"))
});

/// Placeholder values supplied by one scenario outline example row.
///
/// # Examples
///
/// ```
/// use stepchain_patterns::OutlineTokens;
///
/// let tokens = OutlineTokens::from(vec![("user", "manager1"), ("course", "C1")]);
/// assert_eq!(
///     tokens.apply("I log in as <user> and open <course>"),
///     "I log in as manager1 and open C1"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineTokens {
    values: IndexMap<String, String>,
}

impl OutlineTokens {
    /// Create an empty token set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a token value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a token value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether no tokens are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate over `(name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every known `<name>` token in `text`.
    ///
    /// Tokens without a value are left as written.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        if self.values.is_empty() {
            return text.to_string();
        }
        TOKEN_RE
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let whole = caps.get(0).map_or("", |m| m.as_str());
                caps.get(1)
                    .and_then(|name| self.get(name.as_str()))
                    .unwrap_or(whole)
                    .to_string()
            })
            .into_owned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OutlineTokens {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for OutlineTokens {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}
