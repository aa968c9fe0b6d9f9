//! Per-run state shared across every step of a run.

/// Flags and counters accumulated while running steps.
///
/// The state belongs to whoever drives the run; it is reset at the start of
/// each run rather than living in a process-wide static.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    chained_step_used: bool,
    invocations: usize,
    probes: usize,
}

impl RunState {
    /// Fresh state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to the initial state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether any step in the run expanded a non-empty chain.
    #[must_use]
    pub const fn chained_step_used(&self) -> bool {
        self.chained_step_used
    }

    /// Number of step invocations, chain links included and probes excluded.
    #[must_use]
    pub const fn invocations(&self) -> usize {
        self.invocations
    }

    /// Number of exception probe invocations.
    #[must_use]
    pub const fn probes(&self) -> usize {
        self.probes
    }

    pub(crate) fn mark_chained_step_used(&mut self) {
        self.chained_step_used = true;
    }

    pub(crate) fn record_invocation(&mut self) {
        self.invocations += 1;
    }

    pub(crate) fn record_probe(&mut self) {
        self.probes += 1;
    }
}
