//! Error types raised by step definitions, the registry, and hook dispatch.
//!
//! Step-level problems never escape the engine as `Err`: they are folded into
//! a [`StepOutcome`](crate::StepOutcome) carrying a [`StepFailure`]. Only
//! [`DispatchError`] is returned to callers, because a broken hook
//! subscriber leaves the run in an unknown state.

use stepchain_patterns::PatternError;
use thiserror::Error;

use crate::events::EventPhase;
use crate::probe::ErrorDetail;

/// Error returned by a step definition.
///
/// `Skipped` and `Pending` are control-flow signals rather than failures: the
/// invoker maps them to the matching [`StepStatus`](crate::StepStatus).
///
/// # Examples
///
/// ```
/// use stepchain::StepError;
///
/// let err = StepError::failed("balance was 3, expected 5");
/// assert_eq!(err.to_string(), "balance was 3, expected 5");
/// assert!(!err.is_control_flow());
/// assert!(StepError::skipped("not on this platform").is_control_flow());
/// ```
#[derive(Debug, Error)]
pub enum StepError {
    /// Assertion or handler failure described by a message.
    #[error("{0}")]
    Failed(String),
    /// Failure caused by an underlying error value.
    #[error(transparent)]
    Source(Box<dyn std::error::Error + Send + Sync>),
    /// Failure reported by the system under test's environment.
    #[error("{0}")]
    Environment(ErrorDetail),
    /// The definition asked to skip this step.
    #[error("step skipped{}", reason_suffix(.0))]
    Skipped(Option<String>),
    /// The definition is not implemented yet.
    #[error("step pending{}", reason_suffix(.0))]
    Pending(Option<String>),
}

#[expect(clippy::ref_option, reason = "thiserror passes fields by reference")]
fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map_or_else(String::new, |text| format!(": {text}"))
}

impl StepError {
    /// Build a [`StepError::Failed`] from a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Wrap any error value as the cause of a failure.
    #[must_use]
    pub fn from_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Source(Box::new(error))
    }

    /// Build a [`StepError::Skipped`] carrying a reason.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped(Some(reason.into()))
    }

    /// Build a [`StepError::Pending`] carrying a reason.
    #[must_use]
    pub fn pending(reason: impl Into<String>) -> Self {
        Self::Pending(Some(reason.into()))
    }

    /// Return `true` for the skip and pending signals.
    #[must_use]
    pub const fn is_control_flow(&self) -> bool {
        matches!(self, Self::Skipped(_) | Self::Pending(_))
    }
}

/// Cause recorded on a failed [`StepOutcome`](crate::StepOutcome).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepFailure {
    /// The step definition returned an error.
    #[error("step '{pattern}' failed: {message}")]
    Handler {
        /// Pattern of the failing definition.
        pattern: String,
        /// Rendered error message.
        message: String,
    },
    /// The step definition panicked.
    #[error("step '{pattern}' panicked: {message}")]
    Panic {
        /// Pattern of the panicking definition.
        pattern: String,
        /// Rendered panic payload.
        message: String,
    },
    /// The environment reported an error, usually through the exception probe.
    #[error("{detail}")]
    Environment {
        /// Error captured from the environment.
        detail: ErrorDetail,
    },
    /// Resolving the chain exceeded the configured nesting limit.
    #[error("chain from '{step}' exceeded the maximum depth of {limit}")]
    ChainDepthExceeded {
        /// Text of the step whose expansion hit the limit.
        step: String,
        /// Configured limit.
        limit: usize,
    },
    /// An element of a chained sequence resolved to no step.
    #[error("element {position} of the chain returned by '{step}' is not a step")]
    InvalidChain {
        /// Text of the step that returned the sequence.
        step: String,
        /// Zero-based position of the offending element.
        position: usize,
    },
}

/// Error raised while registering a step definition.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The pattern could not be compiled.
    #[error("invalid step pattern '{pattern}' at {file}:{line}: {source}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// File declaring the definition.
        file: &'static str,
        /// Line declaring the definition.
        line: u32,
        /// Underlying compilation error.
        #[source]
        source: PatternError,
    },
    /// Another definition already uses the same pattern.
    #[error("duplicate step pattern '{pattern}' at {file}:{line}")]
    Duplicate {
        /// Offending pattern.
        pattern: String,
        /// File declaring the duplicate.
        file: &'static str,
        /// Line declaring the duplicate.
        line: u32,
    },
    /// The pattern would capture the reserved exception probe step.
    #[error("step pattern '{pattern}' at {file}:{line} matches the reserved probe step")]
    ReservedText {
        /// Offending pattern.
        pattern: String,
        /// File declaring the definition.
        file: &'static str,
        /// Line declaring the definition.
        line: u32,
    },
}

/// Error raised when hook dispatch breaks down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// A subscriber panicked while handling an event.
    #[error("hook subscriber '{subscriber}' panicked during {phase}: {message}")]
    SubscriberPanicked {
        /// Name reported by the subscriber.
        subscriber: String,
        /// Phase of the event being dispatched.
        phase: EventPhase,
        /// Rendered panic payload.
        message: String,
    },
    /// An earlier subscriber panic left the bus unusable.
    #[error("hook bus is poisoned by an earlier subscriber panic")]
    Poisoned,
}
