//! Ranking of patterns that match the same step text.

use crate::PatternError;
use crate::pattern::lexer::{Token, lex_pattern};
use std::cmp::Ordering;

/// Specificity of a step pattern.
///
/// Ordering compares literal characters first (more is more specific), then
/// placeholder count (fewer is more specific), then typed placeholders (more
/// is more specific).
///
/// # Examples
///
/// ```
/// use stepchain_patterns::SpecificityScore;
///
/// let (Ok(exact), Ok(generic)) = (
///     SpecificityScore::calculate("I log in as admin"),
///     SpecificityScore::calculate("I log in as {user}"),
/// ) else {
///     panic!("patterns are valid");
/// };
/// assert!(exact > generic);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecificityScore {
    /// Number of literal characters.
    pub literal_chars: usize,
    /// Number of placeholders.
    pub placeholder_count: usize,
    /// Number of placeholders carrying a type hint.
    pub typed_placeholder_count: usize,
}

impl SpecificityScore {
    /// Score a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern is malformed.
    pub fn calculate(pattern: &str) -> Result<Self, PatternError> {
        let score = lex_pattern(pattern)?
            .into_iter()
            .fold(Self::default(), |mut score, token| {
                match token {
                    Token::Literal(text) => score.literal_chars += text.chars().count(),
                    Token::Placeholder { hint, .. } => {
                        score.placeholder_count += 1;
                        if hint.is_some() {
                            score.typed_placeholder_count += 1;
                        }
                    }
                }
                score
            });
        Ok(score)
    }
}

impl Ord for SpecificityScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.literal_chars
            .cmp(&other.literal_chars)
            .then_with(|| other.placeholder_count.cmp(&self.placeholder_count))
            .then_with(|| {
                self.typed_placeholder_count
                    .cmp(&other.typed_placeholder_count)
            })
    }
}

impl PartialOrd for SpecificityScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
