//! Exception probe run after every passing step.
//!
//! The system under test may record errors out-of-band (uncaught exceptions,
//! debugging notices, warnings) while a step still appears to pass. The probe
//! is a reserved step definition that asks an [`ExceptionInspector`] whether
//! anything is pending and fails when it is.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use crate::chain::ChainItem;
use crate::context::StepContext;
use crate::error::StepError;
use crate::registry::{StepArgs, StepResult};
use crate::types::StepNode;
use stepchain_patterns::StepKeyword;

/// Text of the reserved probe step.
pub const PROBE_STEP_TEXT: &str = "I look for exceptions";

/// Category of an environment-reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Uncaught exception or error page.
    Exception,
    /// Debugging output emitted by the application.
    Debugging,
    /// Warning or notice emitted by the application.
    Warning,
}

impl ErrorKind {
    /// Lowercase label for messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exception => "exception",
            Self::Debugging => "debugging",
            Self::Warning => "warning",
        }
    }
}

/// One error captured from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    kind: ErrorKind,
    message: String,
}

impl ErrorDetail {
    /// Construct an error detail.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Category of the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Message reported by the environment.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

/// Access to error state recorded by the system under test.
pub trait ExceptionInspector {
    /// Return `true` when at least one error is waiting to be reported.
    fn has_pending(&self) -> bool;

    /// Return the next error to report and clear the recorded state.
    fn drain(&self) -> Option<ErrorDetail>;
}

/// In-memory [`ExceptionInspector`] fed by the application adapter.
///
/// # Examples
///
/// ```
/// use stepchain::{ErrorDetail, ErrorKind, ErrorLog, ExceptionInspector};
///
/// let log = ErrorLog::default();
/// log.record(ErrorDetail::new(ErrorKind::Warning, "deprecated call"));
/// assert!(log.has_pending());
/// assert_eq!(log.drain().map(|d| d.kind()), Some(ErrorKind::Warning));
/// assert!(!log.has_pending());
/// ```
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: RefCell<VecDeque<ErrorDetail>>,
}

impl ErrorLog {
    /// Record an error for the next probe.
    pub fn record(&self, detail: ErrorDetail) {
        self.entries.borrow_mut().push_back(detail);
    }

    /// Number of errors waiting to be reported.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Return `true` when nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ExceptionInspector for ErrorLog {
    fn has_pending(&self) -> bool {
        !self.is_empty()
    }

    /// Report the earliest error; later ones are discarded with it.
    fn drain(&self) -> Option<ErrorDetail> {
        let mut entries = self.entries.borrow_mut();
        let first = entries.pop_front();
        if !entries.is_empty() {
            log::debug!("discarding {} further environment errors", entries.len());
            entries.clear();
        }
        first
    }
}

/// Build the probe step attributed to `step`'s line.
#[must_use]
pub fn probe_step_for(step: &StepNode) -> StepNode {
    StepNode::new(StepKeyword::Then, PROBE_STEP_TEXT, step.line())
}

/// Definition registered for [`PROBE_STEP_TEXT`].
///
/// # Errors
/// Returns [`StepError::Environment`] when the inspector reports an error.
pub(crate) fn look_for_exceptions(ctx: &mut StepContext<'_>, _args: &StepArgs) -> StepResult {
    let Some(inspector) = ctx.inspector() else {
        return Ok(ChainItem::None);
    };
    if !inspector.has_pending() {
        return Ok(ChainItem::None);
    }
    inspector
        .drain()
        .map_or(Ok(ChainItem::None), |detail| Err(StepError::Environment(detail)))
}
