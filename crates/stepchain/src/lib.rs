//! Step-chaining execution engine for behaviour-driven scenarios.
//!
//! A step definition may return further steps to run as if they were written
//! inline in the scenario. The engine resolves such chains recursively, runs
//! an exception probe after every passing step, folds every result into one
//! [`StepOutcome`] per authored step, and emits exactly one before/after
//! event pair per authored step to scenario-level hook subscribers.
//!
//! Definitions are registered either explicitly through
//! [`StepRegistry::register`] or at link time with the [`step!`] macro and
//! collected by [`StepRegistry::from_inventory`].

mod chain;
mod config;
mod context;
mod error;
mod events;
mod expander;
mod invoker;
mod merge;
mod outcome;
mod panic;
mod probe;
mod registry;
pub mod reporting;
mod runner;
mod scenario;
mod state;
mod types;

pub use inventory::{iter, submit};

pub use chain::{ChainItem, ChainedStep, DeferredChain, DeferredLimitExceeded, ResolvedChain};
pub use config::{
    ConfigError, DEFAULT_MAX_CHAIN_DEPTH, EngineConfig, clear_dry_run_override, set_dry_run,
};
pub use context::StepContext;
pub use error::{DispatchError, RegistryError, StepError, StepFailure};
pub use events::{
    EventGate, EventPhase, EventScope, HookBus, HookDispatcher, HookNotice, HookSubscriber,
    StepCounter, StepEvent, SubscriberScope,
};
pub use expander::{ChainExpander, LinkRunner};
pub use invoker::{Invocation, StepInvoker};
pub use merge::merge;
pub use outcome::{DefinitionInfo, StepOutcome};
pub use panic::panic_message;
pub use probe::{
    ErrorDetail, ErrorKind, ErrorLog, ExceptionInspector, PROBE_STEP_TEXT, probe_step_for,
};
pub use registry::{
    Step, StepArgs, StepFn, StepMatch, StepRegistration, StepRegistry, StepResult,
};
pub use runner::{ChainRequest, ChainRunner, Resolution};
pub use scenario::{Scenario, ScenarioRunner};
pub use state::RunState;
pub use stepchain_patterns::{OutlineTokens, StepKeyword};
pub use types::{StepNode, StepStatus};
