//! Run reports built from step outcomes.
//!
//! A [`RunReport`] collects one [`ScenarioRecord`] per executed scenario and
//! the run-wide chained-step flag. Reporters can render it in other formats
//! without touching the engine; the JSON writer lives in [`json`] behind the
//! `diagnostics` feature.

use crate::outcome::StepOutcome;
use crate::state::RunState;
use crate::types::StepStatus;
use stepchain_patterns::StepKeyword;

/// JSON report writer for run reports.
#[cfg(feature = "diagnostics")]
pub mod json;

/// Outcome recorded for one authored step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepRecord {
    keyword: StepKeyword,
    text: String,
    line: u32,
    status: StepStatus,
    message: Option<String>,
    origin: Option<String>,
}

impl StepRecord {
    /// Keyword of the authored step.
    #[must_use]
    pub const fn keyword(&self) -> StepKeyword {
        self.keyword
    }

    /// Step text after outline substitution.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Feature-file line of the step.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Final status.
    #[must_use]
    pub const fn status(&self) -> StepStatus {
        self.status
    }

    /// Failure, skip, or pending message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Keyword and text of the chained step where a non-passing status
    /// originated, rendered as `Given a manager exists`.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

impl From<&StepOutcome> for StepRecord {
    fn from(outcome: &StepOutcome) -> Self {
        let step = outcome.step();
        Self {
            keyword: step.keyword(),
            text: step.text().to_string(),
            line: step.line(),
            status: outcome.status(),
            message: outcome.message().map(str::to_string),
            origin: outcome.origin().map(|origin| origin.to_string()),
        }
    }
}

/// Outcome recorded for a single scenario execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioRecord {
    feature_path: String,
    scenario_name: String,
    line: u32,
    steps: Vec<StepRecord>,
}

impl ScenarioRecord {
    /// Construct a record from scenario metadata and its step outcomes.
    ///
    /// # Examples
    /// ```
    /// use stepchain::reporting::ScenarioRecord;
    /// use stepchain::StepStatus;
    ///
    /// let record = ScenarioRecord::new("features/login.feature", "log in", 3, &[]);
    /// assert_eq!(record.status(), StepStatus::Passed);
    /// ```
    #[must_use]
    pub fn new(
        feature_path: impl Into<String>,
        scenario_name: impl Into<String>,
        line: u32,
        outcomes: &[StepOutcome],
    ) -> Self {
        Self {
            feature_path: feature_path.into(),
            scenario_name: scenario_name.into(),
            line,
            steps: outcomes.iter().map(StepRecord::from).collect(),
        }
    }

    /// Path of the feature file declaring the scenario.
    #[must_use]
    pub fn feature_path(&self) -> &str {
        &self.feature_path
    }

    /// Scenario name.
    #[must_use]
    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    /// Line declaring the scenario.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Step records in execution order.
    #[must_use]
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Status of the first step that did not pass, or `Passed`.
    #[must_use]
    pub fn status(&self) -> StepStatus {
        self.steps
            .iter()
            .map(StepRecord::status)
            .find(|status| !status.is_passed())
            .unwrap_or(StepStatus::Passed)
    }
}

/// Every scenario of one run plus run-wide flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    scenarios: Vec<ScenarioRecord>,
    chained_steps_used: bool,
}

impl RunReport {
    /// Empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scenario record.
    pub fn record(&mut self, scenario: ScenarioRecord) {
        self.scenarios.push(scenario);
    }

    /// Copy run-wide flags from `state` once the run is over.
    pub fn finish(&mut self, state: &RunState) {
        self.chained_steps_used = state.chained_step_used();
    }

    /// Recorded scenarios in execution order.
    #[must_use]
    pub fn scenarios(&self) -> &[ScenarioRecord] {
        &self.scenarios
    }

    /// Whether any step in the run expanded a chain.
    #[must_use]
    pub const fn chained_steps_used(&self) -> bool {
        self.chained_steps_used
    }

    /// Number of scenarios that finished with `status`.
    #[must_use]
    pub fn count(&self, status: StepStatus) -> usize {
        self.scenarios
            .iter()
            .filter(|scenario| scenario.status() == status)
            .count()
    }

    /// Number of authored steps across all scenarios.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.steps().len()).sum()
    }
}
