//! Step registration and lookup.
//! This module defines the `Step` record, the `step!` macro for registration
//! through `inventory`, and the [`StepRegistry`] used to find the most specific
//! definition for a piece of step text.

use std::cell::Cell;

use hashbrown::HashMap;
use regex::Regex;
use stepchain_patterns::{SpecificityScore, compile_regex_from_pattern, extract_captured_values};

use crate::chain::ChainItem;
use crate::context::StepContext;
use crate::error::{RegistryError, StepError};
use crate::outcome::DefinitionInfo;
use crate::probe::{PROBE_STEP_TEXT, look_for_exceptions};

mod args;

pub use args::StepArgs;

/// Value returned by a step definition: the chain to expand, or an error.
pub type StepResult = Result<ChainItem, StepError>;

/// Function pointer type for step definitions.
pub type StepFn = for<'a> fn(&mut StepContext<'a>, &StepArgs) -> StepResult;

/// Static description of a step definition submitted through [`step!`].
#[derive(Debug, Clone, Copy)]
pub struct StepRegistration {
    /// Pattern text with `{name}` or `{name:type}` placeholders.
    pub pattern: &'static str,
    /// Function executed when the step matches.
    pub run: StepFn,
    /// Source file declaring the definition.
    pub file: &'static str,
    /// Line declaring the definition.
    pub line: u32,
}

inventory::collect!(StepRegistration);

/// Register a step definition for collection by
/// [`StepRegistry::from_inventory`].
///
/// # Examples
///
/// ```
/// use stepchain::{ChainItem, StepArgs, StepContext, StepRegistry, StepResult, step};
///
/// fn empty_site(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
///     Ok(ChainItem::None)
/// }
///
/// step!("the site is empty", empty_site);
///
/// fn main() {
///     let registry = StepRegistry::from_inventory().unwrap_or_else(|e| panic!("{e}"));
///     assert!(registry.find_match("the site is empty").is_some());
/// }
/// ```
#[macro_export]
macro_rules! step {
    ($pattern:expr, $handler:path $(,)?) => {
        const _: () = {
            $crate::submit! {
                $crate::StepRegistration {
                    pattern: $pattern,
                    run: $handler,
                    file: file!(),
                    line: line!(),
                }
            }
        };
    };
}

/// A compiled step definition held by a [`StepRegistry`].
#[derive(Debug)]
pub struct Step {
    pattern: String,
    regex: Regex,
    specificity: SpecificityScore,
    run: StepFn,
    file: &'static str,
    line: u32,
    used: Cell<bool>,
}

impl Step {
    fn compile(
        pattern: &str,
        run: StepFn,
        file: &'static str,
        line: u32,
    ) -> Result<Self, RegistryError> {
        let invalid = |source| RegistryError::InvalidPattern {
            pattern: pattern.to_string(),
            file,
            line,
            source,
        };
        let regex = compile_regex_from_pattern(pattern).map_err(invalid)?;
        let specificity = SpecificityScore::calculate(pattern).map_err(invalid)?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            specificity,
            run,
            file,
            line,
            used: Cell::new(false),
        })
    }

    /// Pattern text the definition was registered with.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Source file declaring the definition.
    #[must_use]
    pub const fn file(&self) -> &'static str {
        self.file
    }

    /// Line declaring the definition.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Specificity used to rank overlapping matches.
    #[must_use]
    pub const fn specificity(&self) -> SpecificityScore {
        self.specificity
    }

    /// Return `true` once the definition has matched any step text.
    #[must_use]
    pub fn was_used(&self) -> bool {
        self.used.get()
    }

    /// Metadata attached to outcomes produced by this definition.
    #[must_use]
    pub fn info(&self) -> DefinitionInfo {
        DefinitionInfo::new(self.pattern.clone(), self.file, self.line)
    }

    pub(crate) const fn handler(&self) -> StepFn {
        self.run
    }

    fn is_probe(&self) -> bool {
        self.pattern == PROBE_STEP_TEXT
    }
}

/// A definition matched against step text, with its captured arguments.
#[derive(Debug)]
pub struct StepMatch<'r> {
    step: &'r Step,
    args: StepArgs,
}

impl<'r> StepMatch<'r> {
    /// Matched definition.
    #[must_use]
    pub const fn step(&self) -> &'r Step {
        self.step
    }

    /// Captured arguments.
    #[must_use]
    pub const fn args(&self) -> &StepArgs {
        &self.args
    }
}

/// Collection of step definitions.
///
/// Every registry contains the exception probe definition for
/// [`PROBE_STEP_TEXT`]; user patterns that would also match that text are
/// rejected.
///
/// # Examples
///
/// ```
/// use stepchain::{ChainItem, StepArgs, StepContext, StepRegistry, StepResult};
///
/// fn empty_site(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
///     Ok(ChainItem::None)
/// }
///
/// let mut registry = StepRegistry::new();
/// registry.register("the site is empty", empty_site).unwrap_or_else(|e| panic!("{e}"));
/// assert!(registry.find_match("the site is empty").is_some());
/// assert!(registry.find_match("the site is full").is_none());
/// ```
#[derive(Debug)]
pub struct StepRegistry {
    steps: Vec<Step>,
    by_pattern: HashMap<String, usize>,
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StepRegistry {
    /// Create a registry holding only the exception probe definition.
    #[must_use]
    pub fn new() -> Self {
        let probe = Step::compile(PROBE_STEP_TEXT, look_for_exceptions, file!(), line!())
            .unwrap_or_else(|_| unreachable!("probe pattern is a plain literal"));
        let mut by_pattern = HashMap::new();
        by_pattern.insert(PROBE_STEP_TEXT.to_string(), 0);
        Self {
            steps: vec![probe],
            by_pattern,
        }
    }

    /// Build a registry from every definition submitted with [`step!`].
    ///
    /// # Errors
    /// Returns the first [`RegistryError`] raised while adding definitions.
    pub fn from_inventory() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for registration in inventory::iter::<StepRegistration> {
            registry.add(registration)?;
        }
        log::debug!(
            "collected {} step definitions from inventory",
            registry.len()
        );
        Ok(registry)
    }

    /// Register a definition attributed to the caller's location.
    ///
    /// # Errors
    /// Returns a [`RegistryError`] when the pattern is invalid, duplicates an
    /// existing pattern, or matches the reserved probe text.
    #[track_caller]
    pub fn register(
        &mut self,
        pattern: &'static str,
        run: StepFn,
    ) -> Result<&mut Self, RegistryError> {
        let location = std::panic::Location::caller();
        self.add(&StepRegistration {
            pattern,
            run,
            file: location.file(),
            line: location.line(),
        })?;
        Ok(self)
    }

    /// Add a definition described by `registration`.
    ///
    /// # Errors
    /// See [`register`](Self::register).
    pub fn add(&mut self, registration: &StepRegistration) -> Result<(), RegistryError> {
        let StepRegistration {
            pattern,
            run,
            file,
            line,
        } = *registration;
        if self.by_pattern.contains_key(pattern) {
            return Err(RegistryError::Duplicate {
                pattern: pattern.to_string(),
                file,
                line,
            });
        }
        let step = Step::compile(pattern, run, file, line)?;
        if step.regex.is_match(PROBE_STEP_TEXT) {
            return Err(RegistryError::ReservedText {
                pattern: pattern.to_string(),
                file,
                line,
            });
        }
        self.by_pattern.insert(pattern.to_string(), self.steps.len());
        self.steps.push(step);
        Ok(())
    }

    /// Find the most specific definition matching `text`.
    ///
    /// Keywords play no part in matching. Among equally specific matches the
    /// earliest registration wins.
    #[must_use]
    pub fn find_match(&self, text: &str) -> Option<StepMatch<'_>> {
        let found = self.exact(text).or_else(|| self.best_placeholder_match(text))?;
        found.step.used.set(true);
        log::trace!("matched '{text}' to pattern '{}'", found.step.pattern);
        Some(found)
    }

    fn exact(&self, text: &str) -> Option<StepMatch<'_>> {
        let step = self.steps.get(*self.by_pattern.get(text)?)?;
        let values = extract_captured_values(&step.regex, text)?;
        Some(StepMatch {
            step,
            args: StepArgs::new(text, values),
        })
    }

    fn best_placeholder_match(&self, text: &str) -> Option<StepMatch<'_>> {
        self.steps
            .iter()
            .rev()
            .filter_map(|step| {
                extract_captured_values(&step.regex, text).map(|values| StepMatch {
                    step,
                    args: StepArgs::new(text, values),
                })
            })
            .max_by_key(|found| found.step.specificity)
    }

    /// Number of registered definitions, including the probe.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false`: the probe definition is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate over registered definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// User definitions that have not matched any step text yet.
    #[must_use]
    pub fn unused_steps(&self) -> Vec<&Step> {
        self.steps
            .iter()
            .filter(|step| !step.is_probe() && !step.was_used())
            .collect()
    }
}
