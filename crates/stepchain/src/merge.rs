//! Folding the exception probe's result into a step's result.

use crate::outcome::StepOutcome;

/// Combine a step outcome with the outcome of the probe run after it.
///
/// A step that did not pass is returned as is; its own cause always wins.
/// Otherwise a failing probe overrides the step: the result keeps the step's
/// identity and definition but takes the probe's failure cause. Any other
/// probe result leaves the step outcome untouched.
///
/// # Examples
///
/// ```
/// use stepchain::{StepKeyword, StepNode, StepOutcome, StepStatus, merge};
///
/// let step = StepNode::new(StepKeyword::When, "I press save", 8);
/// let probe = StepNode::new(StepKeyword::Then, "I look for exceptions", 8);
/// let merged = merge(StepOutcome::passed(step, None), StepOutcome::passed(probe, None));
/// assert_eq!(merged.status(), StepStatus::Passed);
/// assert_eq!(merged.step().text(), "I press save");
/// ```
#[must_use]
pub fn merge(primary: StepOutcome, probe: StepOutcome) -> StepOutcome {
    if !primary.status().is_passed() {
        return primary;
    }
    let Some(cause) = probe.into_failure() else {
        return primary;
    };
    log::debug!(
        "exception probe overrode '{}': {cause}",
        primary.step().text()
    );
    primary.fail_with(cause)
}
