//! Placeholder captures handed to step definitions.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::StepError;

/// Step text together with the values captured by its pattern's placeholders.
///
/// # Examples
///
/// ```
/// use stepchain::StepArgs;
///
/// let args = StepArgs::new("I have 3 apples", vec!["3".into(), "apples".into()]);
/// let count: u32 = args.parse(0).unwrap_or_default();
/// assert_eq!(count, 3);
/// assert_eq!(args.get(1), Some("apples"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArgs {
    text: String,
    values: Vec<String>,
}

impl StepArgs {
    /// Construct arguments for `text` with its captured values.
    #[must_use]
    pub fn new(text: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            text: text.into(),
            values,
        }
    }

    /// Full step text after outline substitution.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Captured values in placeholder order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Captured value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Parse the captured value at `index`.
    ///
    /// # Errors
    /// Returns [`StepError::Failed`] when the value is missing or does not
    /// parse as `T`.
    pub fn parse<T>(&self, index: usize) -> Result<T, StepError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.get(index).ok_or_else(|| {
            StepError::failed(format!(
                "step '{}' has no captured value at position {index}",
                self.text
            ))
        })?;
        raw.parse::<T>().map_err(|e| {
            StepError::failed(format!(
                "failed to parse captured value {index} ('{raw}') of step '{}': {e}",
                self.text
            ))
        })
    }
}
