//! Chain items returned by step definitions.
//!
//! A definition may ask the engine to run further steps after it passes. The
//! request is a [`ChainItem`]: nothing, a single step, an ordered sequence, or
//! a deferred producer that is called lazily to obtain one of those.

use std::fmt;

use stepchain_patterns::{OutlineTokens, StepKeyword};

use crate::types::StepNode;

/// A step requested by a definition's chain.
///
/// Chained steps have no line of their own; the engine attributes them to
/// the line of the step that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainedStep {
    keyword: StepKeyword,
    text: String,
}

impl ChainedStep {
    /// Construct a chained step.
    #[must_use]
    pub fn new(keyword: StepKeyword, text: impl Into<String>) -> Self {
        Self {
            keyword,
            text: text.into(),
        }
    }

    /// Chained `Given` step.
    #[must_use]
    pub fn given(text: impl Into<String>) -> Self {
        Self::new(StepKeyword::Given, text)
    }

    /// Chained `When` step.
    #[must_use]
    pub fn when(text: impl Into<String>) -> Self {
        Self::new(StepKeyword::When, text)
    }

    /// Chained `Then` step.
    #[must_use]
    pub fn then(text: impl Into<String>) -> Self {
        Self::new(StepKeyword::Then, text)
    }

    /// Keyword of the chained step.
    #[must_use]
    pub const fn keyword(&self) -> StepKeyword {
        self.keyword
    }

    /// Text of the chained step.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Materialise the step at `line`, substituting outline tokens when the
    /// parent originated from an outline row.
    #[must_use]
    pub fn into_node(self, line: u32, tokens: Option<&OutlineTokens>) -> StepNode {
        let mut text = self.text;
        if let Some(tokens) = tokens {
            text = tokens.apply(&text);
        }
        StepNode::new(self.keyword, text, line)
    }
}

/// Producer invoked lazily to obtain a chain item.
pub type DeferredChain = Box<dyn FnOnce() -> ChainItem>;

/// Follow-up work returned by a passing step definition.
///
/// # Examples
///
/// ```
/// use stepchain::{ChainItem, ChainedStep};
///
/// let chain = ChainItem::sequence([
///     ChainedStep::given("the site is empty"),
///     ChainedStep::given("a manager exists"),
/// ]);
/// assert!(!chain.is_none());
/// ```
#[derive(Default)]
pub enum ChainItem {
    /// No further steps.
    #[default]
    None,
    /// Run one more step.
    Single(ChainedStep),
    /// Run each element in order, stopping at the first that does not pass.
    Sequence(Vec<ChainItem>),
    /// Call the producer to obtain the real item.
    Deferred(DeferredChain),
}

impl ChainItem {
    /// Chain to a single step.
    #[must_use]
    pub fn single(step: ChainedStep) -> Self {
        Self::Single(step)
    }

    /// Chain to an ordered sequence of items.
    #[must_use]
    pub fn sequence<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Chain to whatever `producer` returns once the engine needs it.
    #[must_use]
    pub fn deferred(producer: impl FnOnce() -> Self + 'static) -> Self {
        Self::Deferred(Box::new(producer))
    }

    /// Return `true` when the item is [`ChainItem::None`].
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Resolve deferred producers until a concrete item remains.
    ///
    /// Each deferred hop counts against `limit`; `None` means unbounded. An
    /// empty sequence resolves to [`ResolvedChain::None`].
    ///
    /// # Errors
    /// Returns [`DeferredLimitExceeded`] when more than `limit` producers are
    /// followed in a row.
    pub fn resolve(self, limit: Option<usize>) -> Result<ResolvedChain, DeferredLimitExceeded> {
        let mut item = self;
        let mut hops = 0_usize;
        loop {
            item = match item {
                Self::None => return Ok(ResolvedChain::None),
                Self::Single(step) => return Ok(ResolvedChain::Single(step)),
                Self::Sequence(items) if items.is_empty() => return Ok(ResolvedChain::None),
                Self::Sequence(items) => return Ok(ResolvedChain::Sequence(items)),
                Self::Deferred(producer) => {
                    hops += 1;
                    if let Some(limit) = limit.filter(|limit| hops > *limit) {
                        return Err(DeferredLimitExceeded { limit });
                    }
                    producer()
                }
            };
        }
    }
}

impl fmt::Debug for ChainItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Single(step) => f.debug_tuple("Single").field(step).finish(),
            Self::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<ChainedStep> for ChainItem {
    fn from(step: ChainedStep) -> Self {
        Self::Single(step)
    }
}

impl From<Vec<Self>> for ChainItem {
    fn from(items: Vec<Self>) -> Self {
        Self::Sequence(items)
    }
}

impl FromIterator<ChainedStep> for ChainItem {
    fn from_iter<I: IntoIterator<Item = ChainedStep>>(iter: I) -> Self {
        Self::sequence(iter)
    }
}

/// A chain item with every top-level deferred producer resolved.
#[derive(Debug)]
pub enum ResolvedChain {
    /// Nothing to run.
    None,
    /// One step to run.
    Single(ChainedStep),
    /// A non-empty ordered sequence; elements are resolved as they are reached.
    Sequence(Vec<ChainItem>),
}

/// Raised when deferred producers keep returning deferred producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("more than {limit} deferred chain producers were followed")]
pub struct DeferredLimitExceeded {
    /// Configured limit.
    pub limit: usize,
}
