//! Step lifecycle events and hook dispatch.
//!
//! The runner emits a before/after pair around every step it resolves:
//! [`EventScope::Logical`] for the step the caller asked for and
//! [`EventScope::ChainLink`] for steps reached through a chain. Pairs nest,
//! so a link's pair always sits inside its parent's pair. No events are
//! emitted in skip mode, and the exception probe never gets its own pair.
//!
//! Subscribers see events through a [`HookBus`]. A subscriber declaring
//! [`SubscriberScope::ScenarioRunner`] receives logical events only, so
//! per-step counters see exactly one pair for each authored step.

use std::cell::Cell;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use thiserror::Error;

use crate::error::DispatchError;
use crate::outcome::StepOutcome;
use crate::panic::panic_message;
use crate::types::StepNode;

/// Which side of a step an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPhase {
    /// Emitted before the step definition runs.
    BeforeStep,
    /// Emitted once the step, its probe, and its chain are resolved.
    AfterStep,
}

impl fmt::Display for EventPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BeforeStep => "before-step",
            Self::AfterStep => "after-step",
        })
    }
}

/// Position of the evented step within a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventScope {
    /// The step handed to the runner.
    Logical,
    /// A step reached through a chain, `depth` links below the logical step.
    ChainLink {
        /// Nesting depth, starting at 1 for a direct link.
        depth: usize,
    },
}

impl EventScope {
    /// Scope for a step resolved at `depth`.
    #[must_use]
    pub const fn at_depth(depth: usize) -> Self {
        if depth == 0 {
            Self::Logical
        } else {
            Self::ChainLink { depth }
        }
    }

    /// Return `true` for [`EventScope::Logical`].
    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::Logical)
    }
}

/// A lifecycle notification for one step.
#[derive(Debug, Clone, Copy)]
pub struct StepEvent<'e> {
    phase: EventPhase,
    scope: EventScope,
    step: &'e StepNode,
    outcome: Option<&'e StepOutcome>,
}

impl<'e> StepEvent<'e> {
    /// Event emitted before `step` runs.
    #[must_use]
    pub const fn before(scope: EventScope, step: &'e StepNode) -> Self {
        Self {
            phase: EventPhase::BeforeStep,
            scope,
            step,
            outcome: None,
        }
    }

    /// Event emitted after `step` resolved to `outcome`.
    #[must_use]
    pub const fn after(scope: EventScope, step: &'e StepNode, outcome: &'e StepOutcome) -> Self {
        Self {
            phase: EventPhase::AfterStep,
            scope,
            step,
            outcome: Some(outcome),
        }
    }

    /// Phase of the event.
    #[must_use]
    pub const fn phase(&self) -> EventPhase {
        self.phase
    }

    /// Scope of the event.
    #[must_use]
    pub const fn scope(&self) -> EventScope {
        self.scope
    }

    /// Step the event describes.
    #[must_use]
    pub const fn step(&self) -> &'e StepNode {
        self.step
    }

    /// Outcome of the step; present on after-step events only.
    #[must_use]
    pub const fn outcome(&self) -> Option<&'e StepOutcome> {
        self.outcome
    }
}

/// Receiver of step events emitted by the runner.
pub trait HookDispatcher {
    /// Deliver one event.
    ///
    /// # Errors
    /// Returns [`DispatchError`] when delivery failed in a way that makes
    /// continuing the run unsafe.
    fn dispatch(&mut self, event: &StepEvent<'_>) -> Result<(), DispatchError>;
}

/// Events a subscriber wants to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriberScope {
    /// Logical events only: one pair per step handed to the runner.
    #[default]
    ScenarioRunner,
    /// Every event, chain links included.
    Internal,
}

impl SubscriberScope {
    /// Return `true` when events of `scope` should reach the subscriber.
    #[must_use]
    pub const fn accepts(self, scope: EventScope) -> bool {
        match self {
            Self::ScenarioRunner => scope.is_logical(),
            Self::Internal => true,
        }
    }
}

/// Non-fatal problem reported by a subscriber; logged and otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookNotice {
    message: String,
}

impl HookNotice {
    /// Construct a notice.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A hook registered with a [`HookBus`].
pub trait HookSubscriber {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Events the subscriber wants.
    fn scope(&self) -> SubscriberScope {
        SubscriberScope::ScenarioRunner
    }

    /// Handle one event.
    ///
    /// # Errors
    /// Returns a [`HookNotice`] for problems that should be logged without
    /// stopping the run.
    fn on_event(&mut self, event: &StepEvent<'_>) -> Result<(), HookNotice>;
}

/// Fans events out to registered subscribers in registration order.
///
/// A subscriber that panics poisons the bus: the panic is reported as a
/// [`DispatchError`] and every later dispatch fails with
/// [`DispatchError::Poisoned`].
#[derive(Default)]
pub struct HookBus {
    subscribers: Vec<Box<dyn HookSubscriber>>,
    poisoned: bool,
}

impl HookBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber.
    pub fn subscribe(&mut self, subscriber: impl HookSubscriber + 'static) -> &mut Self {
        self.subscribers.push(Box::new(subscriber));
        self
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Return `true` when no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Return `true` once a subscriber has panicked.
    #[must_use]
    pub const fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}

impl fmt::Debug for HookBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.subscribers.iter().map(|s| s.name()).collect();
        f.debug_struct("HookBus")
            .field("subscribers", &names)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

impl HookDispatcher for HookBus {
    fn dispatch(&mut self, event: &StepEvent<'_>) -> Result<(), DispatchError> {
        if self.poisoned {
            return Err(DispatchError::Poisoned);
        }
        log::trace!(
            "dispatching {} for '{}' ({:?})",
            event.phase(),
            event.step(),
            event.scope()
        );
        for subscriber in &mut self.subscribers {
            if !subscriber.scope().accepts(event.scope()) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(notice)) => log::warn!(
                    "hook subscriber '{}' reported a problem during {}: {notice}",
                    subscriber.name(),
                    event.phase()
                ),
                Err(payload) => {
                    self.poisoned = true;
                    let error = DispatchError::SubscriberPanicked {
                        subscriber: subscriber.name().to_string(),
                        phase: event.phase(),
                        message: panic_message(payload.as_ref()),
                    };
                    log::error!("{error}");
                    return Err(error);
                }
            }
        }
        Ok(())
    }
}

/// Counts logical after-step events, one per authored step.
///
/// Clones share the same count, so one clone can be registered with a bus
/// while another is kept to read the total.
///
/// # Examples
///
/// ```
/// use stepchain::{HookBus, StepCounter};
///
/// let counter = StepCounter::default();
/// let mut bus = HookBus::new();
/// bus.subscribe(counter.clone());
/// assert_eq!(counter.count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StepCounter {
    count: Rc<Cell<usize>>,
}

impl StepCounter {
    /// Number of after-step events seen so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.get()
    }
}

impl HookSubscriber for StepCounter {
    fn name(&self) -> &str {
        "step-counter"
    }

    fn on_event(&mut self, event: &StepEvent<'_>) -> Result<(), HookNotice> {
        if event.phase() == EventPhase::AfterStep {
            self.count.set(self.count.get() + 1);
        }
        Ok(())
    }
}

/// Gatekeeper between the runner and its dispatcher.
///
/// The gate suppresses every event while skipping and never lets a chained
/// probe step produce a pair of its own.
pub struct EventGate<'h> {
    hooks: &'h mut dyn HookDispatcher,
    skip: bool,
}

impl<'h> EventGate<'h> {
    /// Wrap `hooks` for one run; `skip` silences every event.
    pub fn new(hooks: &'h mut dyn HookDispatcher, skip: bool) -> Self {
        Self { hooks, skip }
    }

    /// Return `true` when `step` at `depth` gets a before/after pair.
    #[must_use]
    pub fn admits(&self, step: &StepNode, depth: usize) -> bool {
        !self.skip && !(depth > 0 && step.is_probe())
    }

    /// Emit the before-step event for `step` when admitted.
    ///
    /// # Errors
    /// Propagates [`DispatchError`] from the dispatcher.
    pub fn before(&mut self, step: &StepNode, depth: usize) -> Result<(), DispatchError> {
        if !self.admits(step, depth) {
            return Ok(());
        }
        self.hooks
            .dispatch(&StepEvent::before(EventScope::at_depth(depth), step))
    }

    /// Emit the after-step event for `step` when admitted.
    ///
    /// # Errors
    /// Propagates [`DispatchError`] from the dispatcher.
    pub fn after(
        &mut self,
        step: &StepNode,
        depth: usize,
        outcome: &StepOutcome,
    ) -> Result<(), DispatchError> {
        if !self.admits(step, depth) {
            return Ok(());
        }
        self.hooks
            .dispatch(&StepEvent::after(EventScope::at_depth(depth), step, outcome))
    }
}

impl fmt::Debug for EventGate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventGate").field("skip", &self.skip).finish_non_exhaustive()
    }
}
