//! Core value types shared by every engine component.

use std::fmt;

use stepchain_patterns::StepKeyword;

use crate::probe::PROBE_STEP_TEXT;

/// Final classification of a single step evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepStatus {
    /// The step ran to completion without error.
    Passed,
    /// The step, its probe, or one of its chained links failed.
    Failed,
    /// The step was not executed because an earlier step did not pass, or the
    /// definition asked to be skipped.
    Skipped,
    /// The definition exists but is not yet implemented.
    Pending,
    /// No definition matches the step text.
    Undefined,
}

impl StepStatus {
    /// Return the lowercase label used in logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Pending => "pending",
            Self::Undefined => "undefined",
        }
    }

    /// Return `true` for [`StepStatus::Passed`].
    #[must_use]
    pub const fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A step as the engine sees it: keyword, text, and the source line it is
/// attributed to.
///
/// Authored steps carry their feature-file line. Steps synthesised from a
/// chain inherit the line of the step that produced them.
///
/// # Examples
///
/// ```
/// use stepchain::{StepKeyword, StepNode};
///
/// let step = StepNode::new(StepKeyword::Given, "a user exists", 4);
/// assert_eq!(step.to_string(), "Given a user exists");
/// assert_eq!(step.line(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepNode {
    keyword: StepKeyword,
    text: String,
    line: u32,
}

impl StepNode {
    /// Construct a step node.
    #[must_use]
    pub fn new(keyword: StepKeyword, text: impl Into<String>, line: u32) -> Self {
        Self {
            keyword,
            text: text.into(),
            line,
        }
    }

    /// Keyword the step was written with.
    #[must_use]
    pub const fn keyword(&self) -> StepKeyword {
        self.keyword
    }

    /// Step text without its keyword.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source line the step is attributed to.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Copy of this node with replacement text.
    #[must_use]
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            keyword: self.keyword,
            text: text.into(),
            line: self.line,
        }
    }

    /// Return `true` when the text is the reserved exception probe step.
    #[must_use]
    pub fn is_probe(&self) -> bool {
        self.text == PROBE_STEP_TEXT
    }
}

impl fmt::Display for StepNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.keyword, self.text)
    }
}
