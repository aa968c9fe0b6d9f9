//! Expansion of the chain returned by a passing step.
//!
//! The expander turns a [`ChainItem`] into link steps and hands each one to a
//! [`LinkRunner`], which resolves it fully (probe and nested chain included).
//! Sequences stop at the first link that does not pass. The deciding link
//! result supersedes the parent's result but stays anchored to the parent
//! step, so the deepest cause is what callers see.

use stepchain_patterns::OutlineTokens;

use crate::chain::{ChainItem, ChainedStep, ResolvedChain};
use crate::error::StepFailure;
use crate::outcome::StepOutcome;
use crate::types::StepNode;

/// Resolves link steps on behalf of a [`ChainExpander`].
pub trait LinkRunner {
    /// Error that aborts expansion.
    type Error;

    /// Fully resolve one chained step.
    ///
    /// # Errors
    /// Returns `Self::Error` when expansion must stop altogether.
    fn run_link(&mut self, step: StepNode) -> Result<StepOutcome, Self::Error>;

    /// Called once when a non-empty chain is about to be expanded.
    fn chain_expanded(&mut self) {}
}

/// Expands one step's chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainExpander<'t> {
    tokens: Option<&'t OutlineTokens>,
    max_depth: Option<usize>,
    depth: usize,
}

impl<'t> ChainExpander<'t> {
    /// Expander for a parent resolved at `depth`, substituting `tokens` into
    /// link text and refusing links deeper than `max_depth`.
    #[must_use]
    pub const fn new(
        tokens: Option<&'t OutlineTokens>,
        max_depth: Option<usize>,
        depth: usize,
    ) -> Self {
        Self {
            tokens,
            max_depth,
            depth,
        }
    }

    /// Expand `chain` for the passing `parent` outcome.
    ///
    /// Returns `parent` unchanged for an empty chain. Otherwise the result
    /// carries the status and cause of the deciding link.
    ///
    /// # Errors
    /// Propagates errors from `runner`.
    pub fn expand<R: LinkRunner>(
        &self,
        parent: StepOutcome,
        chain: ChainItem,
        runner: &mut R,
    ) -> Result<StepOutcome, R::Error> {
        let resolved = match chain.resolve(self.max_depth) {
            Ok(ResolvedChain::None) => return Ok(parent),
            Ok(resolved) => resolved,
            Err(exceeded) => return Ok(self.depth_exceeded(&parent, exceeded.limit)),
        };
        runner.chain_expanded();
        let decided = match resolved {
            ResolvedChain::Single(step) => self.run_single(&parent, step, runner)?,
            ResolvedChain::Sequence(items) => self.run_sequence(&parent, items, runner)?,
            ResolvedChain::None => return Ok(parent),
        };
        log::trace!(
            "chain from '{}' resolved to {}",
            parent.step().text(),
            decided.status()
        );
        Ok(decided)
    }

    fn run_single<R: LinkRunner>(
        &self,
        parent: &StepOutcome,
        step: ChainedStep,
        runner: &mut R,
    ) -> Result<StepOutcome, R::Error> {
        if let Some(limit) = self.max_depth.filter(|limit| self.depth >= *limit) {
            return Ok(self.depth_exceeded(parent, limit));
        }
        let link = runner.run_link(step.into_node(parent.step().line(), self.tokens))?;
        Ok(parent.superseded_by(link))
    }

    fn run_sequence<R: LinkRunner>(
        &self,
        parent: &StepOutcome,
        items: Vec<ChainItem>,
        runner: &mut R,
    ) -> Result<StepOutcome, R::Error> {
        let mut last = None;
        for (position, item) in items.into_iter().enumerate() {
            let outcome = match item.resolve(self.max_depth) {
                Ok(ResolvedChain::None) => parent.fail_with(StepFailure::InvalidChain {
                    step: parent.step().text().to_string(),
                    position,
                }),
                Ok(ResolvedChain::Single(step)) => self.run_single(parent, step, runner)?,
                Ok(ResolvedChain::Sequence(nested)) => self.run_sequence(parent, nested, runner)?,
                Err(exceeded) => self.depth_exceeded(parent, exceeded.limit),
            };
            if !outcome.status().is_passed() {
                return Ok(outcome);
            }
            last = Some(outcome);
        }
        Ok(last.unwrap_or_else(|| parent.clone()))
    }

    fn depth_exceeded(&self, parent: &StepOutcome, limit: usize) -> StepOutcome {
        log::warn!(
            "chain from '{}' exceeded the maximum depth of {limit}",
            parent.step().text()
        );
        parent.fail_with(StepFailure::ChainDepthExceeded {
            step: parent.step().text().to_string(),
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepStatus;
    use std::convert::Infallible;
    use stepchain_patterns::StepKeyword;

    /// Link runner that passes every step except those listed as failing.
    #[derive(Default)]
    struct Scripted {
        failing: Vec<&'static str>,
        ran: Vec<StepNode>,
        expansions: usize,
    }

    impl LinkRunner for Scripted {
        type Error = Infallible;

        fn run_link(&mut self, step: StepNode) -> Result<StepOutcome, Infallible> {
            self.ran.push(step.clone());
            if self.failing.iter().any(|failing| *failing == step.text()) {
                let failure = StepFailure::Handler {
                    pattern: step.text().to_string(),
                    message: "nope".into(),
                };
                Ok(StepOutcome::failed(step, None, failure))
            } else {
                Ok(StepOutcome::passed(step, None))
            }
        }

        fn chain_expanded(&mut self) {
            self.expansions += 1;
        }
    }

    fn parent() -> StepOutcome {
        StepOutcome::passed(StepNode::new(StepKeyword::Given, "the setup is done", 14), None)
    }

    fn expand(expander: ChainExpander<'_>, chain: ChainItem, runner: &mut Scripted) -> StepOutcome {
        match expander.expand(parent(), chain, runner) {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    fn texts(runner: &Scripted) -> Vec<&str> {
        runner.ran.iter().map(StepNode::text).collect()
    }

    #[test]
    fn empty_chain_returns_parent_untouched() {
        let mut runner = Scripted::default();
        let outcome = expand(ChainExpander::new(None, Some(5), 0), ChainItem::None, &mut runner);
        assert_eq!(outcome, parent());
        assert_eq!(runner.expansions, 0);

        let empty = expand(
            ChainExpander::new(None, Some(5), 0),
            ChainItem::Sequence(Vec::new()),
            &mut runner,
        );
        assert_eq!(empty, parent());
        assert_eq!(runner.expansions, 0);
    }

    #[test]
    fn links_inherit_parent_line_and_tokens() {
        let tokens = OutlineTokens::from(vec![("course", "C1")]);
        let mut runner = Scripted::default();
        let outcome = expand(
            ChainExpander::new(Some(&tokens), Some(5), 0),
            ChainItem::single(ChainedStep::given("course <course> exists")),
            &mut runner,
        );
        assert_eq!(outcome.status(), StepStatus::Passed);
        assert_eq!(texts(&runner), ["course C1 exists"]);
        assert_eq!(runner.ran.first().map(StepNode::line), Some(14));
        assert_eq!(runner.expansions, 1);
    }

    #[test]
    fn sequence_stops_at_first_failure() {
        let mut runner = Scripted {
            failing: vec!["b"],
            ..Scripted::default()
        };
        let chain = ChainItem::sequence([
            ChainedStep::given("a"),
            ChainedStep::given("b"),
            ChainedStep::given("c"),
        ]);

        let outcome = expand(ChainExpander::new(None, Some(5), 0), chain, &mut runner);

        assert_eq!(outcome.status(), StepStatus::Failed);
        assert_eq!(outcome.step().text(), "the setup is done");
        assert_eq!(outcome.origin().map(StepNode::text), Some("b"));
        assert_eq!(texts(&runner), ["a", "b"]);
    }

    #[test]
    fn nested_sequences_run_in_order() {
        let mut runner = Scripted::default();
        let chain = ChainItem::sequence(vec![
            ChainItem::single(ChainedStep::given("a")),
            ChainItem::sequence([ChainedStep::given("b"), ChainedStep::given("c")]),
            ChainItem::deferred(|| ChainItem::single(ChainedStep::given("d"))),
        ]);
        let outcome = expand(ChainExpander::new(None, Some(5), 0), chain, &mut runner);
        assert_eq!(outcome.status(), StepStatus::Passed);
        assert_eq!(texts(&runner), ["a", "b", "c", "d"]);
    }

    #[test]
    fn none_inside_sequence_is_invalid() {
        let mut runner = Scripted::default();
        let chain = ChainItem::sequence(vec![
            ChainItem::single(ChainedStep::given("a")),
            ChainItem::None,
            ChainItem::single(ChainedStep::given("c")),
        ]);
        let outcome = expand(ChainExpander::new(None, Some(5), 0), chain, &mut runner);
        assert_eq!(
            outcome.failure(),
            Some(&StepFailure::InvalidChain {
                step: "the setup is done".into(),
                position: 1,
            })
        );
        assert_eq!(texts(&runner), ["a"]);
    }

    #[test]
    fn links_beyond_max_depth_fail_without_running() {
        let mut runner = Scripted::default();
        let outcome = expand(
            ChainExpander::new(None, Some(3), 3),
            ChainItem::single(ChainedStep::given("deeper")),
            &mut runner,
        );
        assert_eq!(
            outcome.failure(),
            Some(&StepFailure::ChainDepthExceeded {
                step: "the setup is done".into(),
                limit: 3,
            })
        );
        assert!(runner.ran.is_empty());
    }

    #[test]
    fn unbounded_depth_always_runs_links() {
        let mut runner = Scripted::default();
        let outcome = expand(
            ChainExpander::new(None, None, 10_000),
            ChainItem::single(ChainedStep::given("deeper")),
            &mut runner,
        );
        assert_eq!(outcome.status(), StepStatus::Passed);
        assert_eq!(texts(&runner), ["deeper"]);
    }
}
