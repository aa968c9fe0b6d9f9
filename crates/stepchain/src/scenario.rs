//! Sequential execution of scenarios.
//!
//! A [`ScenarioRunner`] hands every authored step of a [`Scenario`] to the
//! [`ChainRunner`] in order. Once a step does not pass, every later step of
//! that scenario is resolved in skip mode.

use stepchain_patterns::OutlineTokens;

use crate::config::EngineConfig;
use crate::context::StepContext;
use crate::error::DispatchError;
use crate::events::HookDispatcher;
use crate::registry::StepRegistry;
use crate::reporting::{RunReport, ScenarioRecord};
use crate::runner::{ChainRequest, ChainRunner};
use crate::state::RunState;
use crate::types::StepNode;

/// A scenario ready to run: its location, steps, and outline tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    feature_path: String,
    name: String,
    line: u32,
    steps: Vec<StepNode>,
    tokens: Option<OutlineTokens>,
}

impl Scenario {
    /// Create a scenario without steps.
    #[must_use]
    pub fn new(feature_path: impl Into<String>, name: impl Into<String>, line: u32) -> Self {
        Self {
            feature_path: feature_path.into(),
            name: name.into(),
            line,
            steps: Vec::new(),
            tokens: None,
        }
    }

    /// Append one step.
    #[must_use]
    pub fn with_step(mut self, step: StepNode) -> Self {
        self.steps.push(step);
        self
    }

    /// Append several steps.
    #[must_use]
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = StepNode>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Attach the tokens of an outline example row.
    #[must_use]
    pub fn with_tokens(mut self, tokens: OutlineTokens) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Expand an outline into one scenario per example row.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepchain::{OutlineTokens, Scenario, StepKeyword, StepNode};
    ///
    /// let steps = vec![StepNode::new(StepKeyword::Given, "I log in as <role>", 4)];
    /// let rows = vec![
    ///     OutlineTokens::from(vec![("role", "admin")]),
    ///     OutlineTokens::from(vec![("role", "guest")]),
    /// ];
    /// let scenarios = Scenario::outline("login.feature", "log in", 3, &steps, rows);
    /// assert_eq!(scenarios.len(), 2);
    /// assert_eq!(scenarios.get(1).map(Scenario::name), Some("log in (example 2)"));
    /// ```
    #[must_use]
    pub fn outline(
        feature_path: &str,
        name: &str,
        line: u32,
        steps: &[StepNode],
        rows: impl IntoIterator<Item = OutlineTokens>,
    ) -> Vec<Self> {
        rows.into_iter()
            .enumerate()
            .map(|(index, tokens)| {
                Self::new(feature_path, format!("{name} (example {})", index + 1), line)
                    .with_steps(steps.iter().cloned())
                    .with_tokens(tokens)
            })
            .collect()
    }

    /// Path of the feature file.
    #[must_use]
    pub fn feature_path(&self) -> &str {
        &self.feature_path
    }

    /// Scenario name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Line declaring the scenario.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Authored steps in order.
    #[must_use]
    pub fn steps(&self) -> &[StepNode] {
        &self.steps
    }

    /// Outline tokens, if the scenario came from an example row.
    #[must_use]
    pub const fn tokens(&self) -> Option<&OutlineTokens> {
        self.tokens.as_ref()
    }
}

/// Runs scenarios one after another and owns the run-scoped state.
#[derive(Debug)]
pub struct ScenarioRunner<'r> {
    runner: ChainRunner<'r>,
    state: RunState,
}

impl<'r> ScenarioRunner<'r> {
    /// Create a runner over `registry`.
    #[must_use]
    pub fn new(registry: &'r StepRegistry, config: EngineConfig) -> Self {
        Self {
            runner: ChainRunner::new(registry, config),
            state: RunState::new(),
        }
    }

    /// Reset run-scoped state before a new run.
    pub fn begin_run(&mut self) {
        self.state.reset();
    }

    /// Run-scoped state accumulated so far.
    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    /// Run every step of `scenario` and record the outcomes.
    ///
    /// # Errors
    /// Returns [`DispatchError`] when a hook subscriber breaks; the scenario
    /// is abandoned at that point.
    pub fn run_scenario(
        &mut self,
        scenario: &Scenario,
        ctx: &mut StepContext<'_>,
        hooks: &mut dyn HookDispatcher,
    ) -> Result<ScenarioRecord, DispatchError> {
        let mut outcomes = Vec::with_capacity(scenario.steps().len());
        let mut halted = false;
        for step in scenario.steps() {
            let mut request = ChainRequest::new(step).skipping(halted);
            if let Some(tokens) = scenario.tokens() {
                request = request.with_tokens(tokens);
            }
            let outcome = self.runner.run(&request, ctx, hooks, &mut self.state)?;
            halted |= !outcome.status().is_passed();
            outcomes.push(outcome);
        }
        let record = ScenarioRecord::new(
            scenario.feature_path(),
            scenario.name(),
            scenario.line(),
            &outcomes,
        );
        log::info!(
            "scenario '{}' ({}:{}) {}",
            record.scenario_name(),
            record.feature_path(),
            record.line(),
            record.status()
        );
        Ok(record)
    }

    /// Run `scenarios` as one run and collect a report.
    ///
    /// # Errors
    /// Returns [`DispatchError`] when a hook subscriber breaks.
    pub fn run<'s>(
        &mut self,
        scenarios: impl IntoIterator<Item = &'s Scenario>,
        ctx: &mut StepContext<'_>,
        hooks: &mut dyn HookDispatcher,
    ) -> Result<RunReport, DispatchError> {
        self.begin_run();
        let mut report = RunReport::new();
        for scenario in scenarios {
            report.record(self.run_scenario(scenario, ctx, hooks)?);
        }
        report.finish(&self.state);
        Ok(report)
    }
}
