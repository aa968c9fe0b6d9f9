//! Single-step invocation.
//!
//! The invoker looks a step up, runs its definition behind `catch_unwind`,
//! and classifies the result. It never runs the probe or expands chains; the
//! runner layers those on top.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::chain::ChainItem;
use crate::context::StepContext;
use crate::error::{StepError, StepFailure};
use crate::outcome::StepOutcome;
use crate::panic::panic_message;
use crate::registry::StepRegistry;
use crate::types::StepNode;

/// Result of invoking one step: its outcome and the chain it returned.
///
/// The chain is [`ChainItem::None`] unless the definition passed.
#[derive(Debug)]
pub struct Invocation {
    /// Classified outcome of the step.
    pub outcome: StepOutcome,
    /// Chain returned by a passing definition.
    pub chain: ChainItem,
}

impl Invocation {
    fn settled(outcome: StepOutcome) -> Self {
        Self {
            outcome,
            chain: ChainItem::None,
        }
    }
}

/// Looks up and runs step definitions from a registry.
#[derive(Debug, Clone, Copy)]
pub struct StepInvoker<'r> {
    registry: &'r StepRegistry,
}

impl<'r> StepInvoker<'r> {
    /// Create an invoker over `registry`.
    #[must_use]
    pub const fn new(registry: &'r StepRegistry) -> Self {
        Self { registry }
    }

    /// Registry the invoker resolves steps against.
    #[must_use]
    pub const fn registry(&self) -> &'r StepRegistry {
        self.registry
    }

    /// Invoke `step`.
    ///
    /// Unknown text yields `Undefined` even in skip mode. With `skip` set, a
    /// matched definition is reported as `Skipped` without running.
    pub fn invoke(&self, step: &StepNode, ctx: &mut StepContext<'_>, skip: bool) -> Invocation {
        let Some(found) = self.registry.find_match(step.text()) else {
            log::debug!("no definition for '{step}' at line {}", step.line());
            return Invocation::settled(StepOutcome::undefined(step.clone()));
        };
        let definition = found.step().info();
        if skip {
            return Invocation::settled(StepOutcome::skipped(step.clone(), Some(definition), None));
        }

        let handler = found.step().handler();
        let pattern = definition.pattern().to_string();
        match catch_unwind(AssertUnwindSafe(|| handler(ctx, found.args()))) {
            Ok(Ok(chain)) => Invocation {
                outcome: StepOutcome::passed(step.clone(), Some(definition)),
                chain,
            },
            Ok(Err(StepError::Skipped(reason))) => {
                Invocation::settled(StepOutcome::skipped(step.clone(), Some(definition), reason))
            }
            Ok(Err(StepError::Pending(reason))) => {
                Invocation::settled(StepOutcome::pending(step.clone(), Some(definition), reason))
            }
            Ok(Err(StepError::Environment(detail))) => Invocation::settled(StepOutcome::failed(
                step.clone(),
                Some(definition),
                StepFailure::Environment { detail },
            )),
            Ok(Err(err)) => {
                let failure = StepFailure::Handler {
                    pattern,
                    message: err.to_string(),
                };
                Invocation::settled(StepOutcome::failed(step.clone(), Some(definition), failure))
            }
            Err(payload) => {
                let failure = StepFailure::Panic {
                    pattern,
                    message: panic_message(payload.as_ref()),
                };
                Invocation::settled(StepOutcome::failed(step.clone(), Some(definition), failure))
            }
        }
    }
}
