//! Recursive resolution of a step, its exception probe, and its chain.
//!
//! Each step the runner resolves goes through the same sequence:
//!
//! 1. emit the before-step event (unless the gate suppresses it);
//! 2. invoke the definition;
//! 3. if it passed, run the exception probe and merge its result;
//! 4. if still passing, expand the returned chain, resolving every link
//!    through this same sequence one level deeper;
//! 5. emit the after-step event with the final outcome.
//!
//! Only [`DispatchError`] escapes; every step-level problem is folded into
//! the returned [`StepOutcome`].

use stepchain_patterns::OutlineTokens;

use crate::config::EngineConfig;
use crate::context::StepContext;
use crate::error::DispatchError;
use crate::events::{EventGate, HookDispatcher};
use crate::expander::{ChainExpander, LinkRunner};
use crate::invoker::{Invocation, StepInvoker};
use crate::merge::merge;
use crate::outcome::StepOutcome;
use crate::probe::probe_step_for;
use crate::registry::StepRegistry;
use crate::state::RunState;
use crate::types::StepNode;

/// A request to resolve one logical step.
///
/// # Examples
///
/// ```
/// use stepchain::{ChainRequest, OutlineTokens, StepKeyword, StepNode};
///
/// let step = StepNode::new(StepKeyword::Given, "user <name> exists", 3);
/// let tokens = OutlineTokens::from(vec![("name", "ana")]);
/// let request = ChainRequest::new(&step).with_tokens(&tokens).skipping(false);
/// assert_eq!(request.resolved_step().text(), "user ana exists");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ChainRequest<'s> {
    step: &'s StepNode,
    tokens: Option<&'s OutlineTokens>,
    skip: bool,
}

impl<'s> ChainRequest<'s> {
    /// Request resolution of `step` without outline tokens or skipping.
    #[must_use]
    pub const fn new(step: &'s StepNode) -> Self {
        Self {
            step,
            tokens: None,
            skip: false,
        }
    }

    /// Substitute `tokens` into the step and every link it chains to.
    #[must_use]
    pub const fn with_tokens(mut self, tokens: &'s OutlineTokens) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Resolve in skip mode: nothing runs and no events are emitted.
    #[must_use]
    pub const fn skipping(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    /// Step as written.
    #[must_use]
    pub const fn step(&self) -> &'s StepNode {
        self.step
    }

    /// Outline tokens, when the step comes from an outline row.
    #[must_use]
    pub const fn tokens(&self) -> Option<&'s OutlineTokens> {
        self.tokens
    }

    /// Whether the request runs in skip mode.
    #[must_use]
    pub const fn skip(&self) -> bool {
        self.skip
    }

    /// Step with outline tokens applied.
    #[must_use]
    pub fn resolved_step(&self) -> StepNode {
        self.tokens.map_or_else(
            || self.step.clone(),
            |tokens| self.step.with_text(tokens.apply(self.step.text())),
        )
    }
}

/// Outcome of resolving one step together with whether its after-step event
/// was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Final outcome of the step.
    pub outcome: StepOutcome,
    /// `false` when the gate suppressed the after-step event.
    pub dispatch_after: bool,
}

/// Resolves logical steps against a registry.
///
/// # Examples
///
/// ```
/// use stepchain::{
///     ChainItem, ChainRequest, ChainRunner, ChainedStep, EngineConfig, HookBus, RunState,
///     StepArgs, StepContext, StepKeyword, StepNode, StepRegistry, StepResult, StepStatus,
/// };
///
/// fn setup(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
///     Ok(ChainItem::sequence([ChainedStep::given("step a"), ChainedStep::given("step b")]))
/// }
/// fn leaf(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
///     Ok(ChainItem::None)
/// }
///
/// let mut registry = StepRegistry::new();
/// registry
///     .register("the setup", setup)
///     .and_then(|r| r.register("step {name:word}", leaf))
///     .unwrap_or_else(|e| panic!("{e}"));
///
/// let runner = ChainRunner::new(&registry, EngineConfig::default());
/// let step = StepNode::new(StepKeyword::Given, "the setup", 1);
/// let mut state = RunState::new();
/// let outcome = runner
///     .run(
///         &ChainRequest::new(&step),
///         &mut StepContext::default(),
///         &mut HookBus::new(),
///         &mut state,
///     )
///     .unwrap_or_else(|e| panic!("{e}"));
///
/// assert_eq!(outcome.status(), StepStatus::Passed);
/// assert!(state.chained_step_used());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ChainRunner<'r> {
    invoker: StepInvoker<'r>,
    config: EngineConfig,
}

impl<'r> ChainRunner<'r> {
    /// Create a runner over `registry` with `config`.
    #[must_use]
    pub const fn new(registry: &'r StepRegistry, config: EngineConfig) -> Self {
        Self {
            invoker: StepInvoker::new(registry),
            config,
        }
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve the step described by `request` and return its final outcome.
    ///
    /// # Errors
    /// Returns [`DispatchError`] when a hook subscriber breaks.
    pub fn run(
        &self,
        request: &ChainRequest<'_>,
        ctx: &mut StepContext<'_>,
        hooks: &mut dyn HookDispatcher,
        state: &mut RunState,
    ) -> Result<StepOutcome, DispatchError> {
        self.resolve(request, ctx, hooks, state)
            .map(|resolution| resolution.outcome)
    }

    /// Like [`run`](Self::run) but also reports whether the logical
    /// after-step event was delivered.
    ///
    /// # Errors
    /// Returns [`DispatchError`] when a hook subscriber breaks.
    pub fn resolve(
        &self,
        request: &ChainRequest<'_>,
        ctx: &mut StepContext<'_>,
        hooks: &mut dyn HookDispatcher,
        state: &mut RunState,
    ) -> Result<Resolution, DispatchError> {
        let skip = request.skip() || self.config.dry_run();
        let step = request.resolved_step();
        let mut activation = Activation {
            invoker: self.invoker,
            config: self.config,
            ctx,
            gate: EventGate::new(hooks, skip),
            state,
            tokens: request.tokens(),
            skip,
        };
        activation.resolve_step(&step, 0)
    }
}

/// Everything one logical step resolution needs while recursing.
struct Activation<'x, 'c> {
    invoker: StepInvoker<'x>,
    config: EngineConfig,
    ctx: &'x mut StepContext<'c>,
    gate: EventGate<'x>,
    state: &'x mut RunState,
    tokens: Option<&'x OutlineTokens>,
    skip: bool,
}

impl Activation<'_, '_> {
    fn resolve_step(&mut self, step: &StepNode, depth: usize) -> Result<Resolution, DispatchError> {
        self.gate.before(step, depth)?;

        self.state.record_invocation();
        let Invocation { mut outcome, chain } = self.invoker.invoke(step, self.ctx, self.skip);

        if outcome.status().is_passed() && self.config.exception_probe() && !step.is_probe() {
            self.state.record_probe();
            let probe = self
                .invoker
                .invoke(&probe_step_for(step), self.ctx, false)
                .outcome;
            outcome = merge(outcome, probe);
        }

        if outcome.status().is_passed() {
            let expander = ChainExpander::new(self.tokens, self.config.max_chain_depth(), depth);
            outcome = expander.expand(outcome, chain, &mut LinkFrame {
                activation: self,
                depth,
            })?;
        }

        log::debug!("resolved '{step}' at depth {depth}: {}", outcome.status());
        let dispatch_after = self.gate.admits(step, depth);
        self.gate.after(step, depth, &outcome)?;
        Ok(Resolution {
            outcome,
            dispatch_after,
        })
    }
}

/// Adapter letting the expander recurse into the activation one level down.
struct LinkFrame<'f, 'x, 'c> {
    activation: &'f mut Activation<'x, 'c>,
    depth: usize,
}

impl LinkRunner for LinkFrame<'_, '_, '_> {
    type Error = DispatchError;

    fn run_link(&mut self, step: StepNode) -> Result<StepOutcome, DispatchError> {
        self.activation
            .resolve_step(&step, self.depth + 1)
            .map(|resolution| resolution.outcome)
    }

    fn chain_expanded(&mut self) {
        self.activation.state.mark_chained_step_used();
    }
}

#[cfg(test)]
mod tests;
