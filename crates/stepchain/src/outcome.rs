//! Step outcomes and the definition metadata attached to them.
//!
//! Outcomes are built through constructors so that a failure cause is
//! present exactly when the status is [`StepStatus::Failed`].

use crate::error::StepFailure;
use crate::types::{StepNode, StepStatus};

/// Source information for the definition that handled a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionInfo {
    pattern: String,
    file: &'static str,
    line: u32,
}

impl DefinitionInfo {
    /// Construct definition metadata.
    #[must_use]
    pub fn new(pattern: impl Into<String>, file: &'static str, line: u32) -> Self {
        Self {
            pattern: pattern.into(),
            file,
            line,
        }
    }

    /// Pattern the definition was registered with.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// File declaring the definition.
    #[must_use]
    pub const fn file(&self) -> &'static str {
        self.file
    }

    /// Line declaring the definition.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }
}

/// Result of evaluating one step, including any chain it expanded into.
///
/// When a chained link decides the result, the outcome stays anchored to the
/// step the caller asked for and [`origin`](Self::origin) names the link
/// where the non-passing status arose.
///
/// # Examples
///
/// ```
/// use stepchain::{StepKeyword, StepNode, StepOutcome, StepStatus};
///
/// let step = StepNode::new(StepKeyword::Given, "nothing", 1);
/// let outcome = StepOutcome::passed(step, None);
/// assert_eq!(outcome.status(), StepStatus::Passed);
/// assert!(outcome.failure().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    status: StepStatus,
    step: StepNode,
    definition: Option<DefinitionInfo>,
    failure: Option<StepFailure>,
    message: Option<String>,
    origin: Option<StepNode>,
}

impl StepOutcome {
    fn with_status(status: StepStatus, step: StepNode, definition: Option<DefinitionInfo>) -> Self {
        Self {
            status,
            step,
            definition,
            failure: None,
            message: None,
            origin: None,
        }
    }

    /// Outcome for a step that ran successfully.
    #[must_use]
    pub fn passed(step: StepNode, definition: Option<DefinitionInfo>) -> Self {
        Self::with_status(StepStatus::Passed, step, definition)
    }

    /// Outcome for a failed step with its cause.
    #[must_use]
    pub fn failed(
        step: StepNode,
        definition: Option<DefinitionInfo>,
        failure: StepFailure,
    ) -> Self {
        Self {
            message: Some(failure.to_string()),
            failure: Some(failure),
            ..Self::with_status(StepStatus::Failed, step, definition)
        }
    }

    /// Outcome for a skipped step with an optional reason.
    #[must_use]
    pub fn skipped(
        step: StepNode,
        definition: Option<DefinitionInfo>,
        reason: Option<String>,
    ) -> Self {
        Self {
            message: reason,
            ..Self::with_status(StepStatus::Skipped, step, definition)
        }
    }

    /// Outcome for a pending step with an optional reason.
    #[must_use]
    pub fn pending(
        step: StepNode,
        definition: Option<DefinitionInfo>,
        reason: Option<String>,
    ) -> Self {
        Self {
            message: reason,
            ..Self::with_status(StepStatus::Pending, step, definition)
        }
    }

    /// Outcome for a step without a matching definition.
    #[must_use]
    pub fn undefined(step: StepNode) -> Self {
        Self::with_status(StepStatus::Undefined, step, None)
    }

    /// Failed outcome anchored to this outcome's step and definition.
    #[must_use]
    pub fn fail_with(&self, failure: StepFailure) -> Self {
        Self::failed(self.step.clone(), self.definition.clone(), failure)
    }

    /// Replace status, cause, and message with those of a chained link's
    /// result while keeping this outcome's step and definition.
    ///
    /// A non-passing link result records where it originated: the origin the
    /// link already carries, or else the link's own step. This holds even when
    /// the link repeats this outcome's step.
    #[must_use]
    pub fn superseded_by(&self, link: Self) -> Self {
        let origin = if link.status.is_passed() {
            None
        } else {
            Some(link.origin.unwrap_or(link.step))
        };
        Self {
            status: link.status,
            step: self.step.clone(),
            definition: self.definition.clone(),
            failure: link.failure,
            message: link.message,
            origin,
        }
    }

    /// Final status.
    #[must_use]
    pub const fn status(&self) -> StepStatus {
        self.status
    }

    /// Step the outcome is reported against.
    #[must_use]
    pub const fn step(&self) -> &StepNode {
        &self.step
    }

    /// Definition that handled the step, if one matched.
    #[must_use]
    pub const fn definition(&self) -> Option<&DefinitionInfo> {
        self.definition.as_ref()
    }

    /// Failure cause; present exactly when the status is `Failed`.
    #[must_use]
    pub const fn failure(&self) -> Option<&StepFailure> {
        self.failure.as_ref()
    }

    /// Consume the outcome and return its failure cause.
    #[must_use]
    pub fn into_failure(self) -> Option<StepFailure> {
        self.failure
    }

    /// Human-readable explanation for failed, skipped, or pending outcomes.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Chained step where a non-passing status originated.
    #[must_use]
    pub const fn origin(&self) -> Option<&StepNode> {
        self.origin.as_ref()
    }
}
