//! Text-level building blocks for the `stepchain` engine.
//!
//! The crate owns everything that can be decided from step text alone: the
//! step keyword vocabulary, compilation of `{placeholder}` step patterns into
//! anchored regular expressions, ranking of overlapping patterns, and the
//! `<token>` substitution applied to scenario outline steps.

mod capture;
mod errors;
mod keyword;
mod outline;
mod pattern;
mod specificity;

pub use capture::extract_captured_values;
pub use errors::{PatternError, PlaceholderErrorInfo};
pub use keyword::{StepKeyword, StepKeywordParseError};
pub use outline::OutlineTokens;
pub use pattern::{build_regex_from_pattern, compile_regex_from_pattern, get_type_pattern};
pub use specificity::SpecificityScore;
