//! Unit tests for chain resolution.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};

use rstest::{fixture, rstest};
use stepchain_patterns::StepKeyword;

use super::*;
use crate::chain::{ChainItem, ChainedStep};
use crate::error::{StepError, StepFailure};
use crate::events::{EventPhase, EventScope, StepEvent};
use crate::probe::{ErrorDetail, ErrorKind, ErrorLog};
use crate::registry::{StepArgs, StepResult};
use crate::types::StepStatus;

type Journal = RefCell<Vec<String>>;

static DEFERRED_CALLED: AtomicBool = AtomicBool::new(false);

fn note(ctx: &StepContext<'_>, entry: impl Into<String>) {
    if let Some(journal) = ctx.get::<Journal>("journal") {
        journal.borrow_mut().push(entry.into());
    }
}

fn passing(ctx: &mut StepContext<'_>, args: &StepArgs) -> StepResult {
    note(ctx, args.text());
    Ok(ChainItem::None)
}

fn failing(ctx: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    note(ctx, "failing");
    Err(StepError::failed("assertion failed"))
}

fn pending(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    Err(StepError::pending("not written yet"))
}

fn chaining(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    Ok(ChainItem::sequence([
        ChainedStep::given("a passing step"),
        ChainedStep::given("another passing step"),
    ]))
}

fn chaining_to_failure(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    Ok(ChainItem::sequence([
        ChainedStep::given("a passing step"),
        ChainedStep::given("a failing step"),
        ChainedStep::given("a never reached step"),
    ]))
}

fn deep(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    Ok(ChainItem::single(ChainedStep::given("a middle step")))
}

fn middle(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    Ok(ChainItem::single(ChainedStep::then("a failing step")))
}

fn looping(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    Ok(ChainItem::single(ChainedStep::given("a looping step")))
}

fn raising(ctx: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    if let Some(errors) = ctx.get::<ErrorLog>("errors") {
        errors.record(ErrorDetail::new(ErrorKind::Exception, "Coding error detected"));
    }
    Ok(ChainItem::deferred(|| {
        DEFERRED_CALLED.store(true, Ordering::SeqCst);
        ChainItem::single(ChainedStep::given("a never reached step"))
    }))
}

fn role_chain(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    Ok(ChainItem::single(ChainedStep::given("I am logged in as <role>")))
}

fn probe_chain(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    Ok(ChainItem::sequence([
        ChainedStep::given("a passing step"),
        ChainedStep::then(crate::probe::PROBE_STEP_TEXT),
    ]))
}

fn undefined_chain(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    Ok(ChainItem::single(ChainedStep::given("nobody defined this")))
}

fn empty_chain(_: &mut StepContext<'_>, _: &StepArgs) -> StepResult {
    Ok(ChainItem::Sequence(Vec::new()))
}

#[fixture]
fn registry() -> StepRegistry {
    let mut registry = StepRegistry::new();
    let definitions: [(&'static str, crate::registry::StepFn); 15] = [
        ("a passing step", passing),
        ("another passing step", passing),
        ("a never reached step", passing),
        ("I am logged in as {role}", passing),
        ("a failing step", failing),
        ("a pending step", pending),
        ("a chaining step", chaining),
        ("a step chaining to a failure", chaining_to_failure),
        ("a deep chain", deep),
        ("a middle step", middle),
        ("a looping step", looping),
        ("a step raising an exception", raising),
        ("a step acting as {role}", role_chain),
        ("a step chaining to the probe", probe_chain),
        ("a step chaining to an undefined step", undefined_chain),
    ];
    for (pattern, run) in definitions {
        registry
            .register(pattern, run)
            .unwrap_or_else(|e| panic!("'{pattern}' should register: {e}"));
    }
    registry
        .register("a step chaining to nothing", empty_chain)
        .unwrap_or_else(|e| panic!("empty chain step should register: {e}"));
    registry
}

/// Dispatcher recording every event it receives.
#[derive(Default)]
struct EventLog {
    events: Vec<(EventPhase, EventScope, String)>,
}

impl HookDispatcher for EventLog {
    fn dispatch(&mut self, event: &StepEvent<'_>) -> Result<(), DispatchError> {
        self.events
            .push((event.phase(), event.scope(), event.step().text().to_string()));
        Ok(())
    }
}

impl EventLog {
    fn is_balanced(&self) -> bool {
        let mut open: Vec<&str> = Vec::new();
        for (phase, _, text) in &self.events {
            match phase {
                EventPhase::BeforeStep => open.push(text),
                EventPhase::AfterStep => {
                    if open.pop() != Some(text.as_str()) {
                        return false;
                    }
                }
            }
        }
        open.is_empty()
    }
}

struct Harness {
    journal: Journal,
    errors: ErrorLog,
    events: EventLog,
    state: RunState,
}

impl Harness {
    fn new() -> Self {
        Self {
            journal: RefCell::new(Vec::new()),
            errors: ErrorLog::default(),
            events: EventLog::default(),
            state: RunState::new(),
        }
    }

    fn run(
        &mut self,
        registry: &StepRegistry,
        config: EngineConfig,
        request: &ChainRequest<'_>,
    ) -> StepOutcome {
        let mut ctx = StepContext::default().with_inspector(&self.errors);
        ctx.insert("journal", &self.journal);
        ctx.insert("errors", &self.errors);
        ChainRunner::new(registry, config)
            .run(request, &mut ctx, &mut self.events, &mut self.state)
            .unwrap_or_else(|e| panic!("dispatch should not fail: {e}"))
    }

    fn run_text(&mut self, registry: &StepRegistry, text: &str) -> StepOutcome {
        let step = StepNode::new(StepKeyword::Given, text, 7);
        self.run(registry, EngineConfig::default(), &ChainRequest::new(&step))
    }

    fn journal(&self) -> Vec<String> {
        self.journal.borrow().clone()
    }
}

#[rstest]
fn plain_step_emits_one_logical_pair(registry: StepRegistry) {
    let mut harness = Harness::new();
    let outcome = harness.run_text(&registry, "a passing step");

    assert_eq!(outcome.status(), StepStatus::Passed);
    assert_eq!(
        harness.events.events,
        [
            (EventPhase::BeforeStep, EventScope::Logical, "a passing step".to_string()),
            (EventPhase::AfterStep, EventScope::Logical, "a passing step".to_string()),
        ]
    );
    assert!(!harness.state.chained_step_used());
    assert_eq!(harness.state.probes(), 1);
}

#[rstest]
fn sequence_chain_nests_link_events(registry: StepRegistry) {
    let mut harness = Harness::new();
    let outcome = harness.run_text(&registry, "a chaining step");

    assert_eq!(outcome.status(), StepStatus::Passed);
    assert_eq!(outcome.step().text(), "a chaining step");
    assert_eq!(harness.journal(), ["a passing step", "another passing step"]);
    assert!(harness.state.chained_step_used());
    assert!(harness.events.is_balanced());
    let scopes: Vec<_> = harness.events.events.iter().map(|(p, s, _)| (*p, *s)).collect();
    let link = EventScope::ChainLink { depth: 1 };
    assert_eq!(
        scopes,
        [
            (EventPhase::BeforeStep, EventScope::Logical),
            (EventPhase::BeforeStep, link),
            (EventPhase::AfterStep, link),
            (EventPhase::BeforeStep, link),
            (EventPhase::AfterStep, link),
            (EventPhase::AfterStep, EventScope::Logical),
        ]
    );
}

#[rstest]
fn failing_link_stops_sequence(registry: StepRegistry) {
    let mut harness = Harness::new();
    let outcome = harness.run_text(&registry, "a step chaining to a failure");

    assert_eq!(outcome.status(), StepStatus::Failed);
    assert_eq!(outcome.step().text(), "a step chaining to a failure");
    assert_eq!(outcome.origin().map(StepNode::text), Some("a failing step"));
    assert_eq!(harness.journal(), ["a passing step", "failing"]);
    assert!(harness.events.is_balanced());
}

#[rstest]
fn deepest_cause_wins(registry: StepRegistry) {
    let mut harness = Harness::new();
    let outcome = harness.run_text(&registry, "a deep chain");

    assert_eq!(
        outcome.failure(),
        Some(&StepFailure::Handler {
            pattern: "a failing step".into(),
            message: "assertion failed".into(),
        })
    );
    assert_eq!(outcome.origin().map(StepNode::text), Some("a failing step"));
    assert_eq!(outcome.definition().map(|d| d.pattern()), Some("a deep chain"));
    let depths: Vec<_> = harness
        .events
        .events
        .iter()
        .filter(|(phase, _, _)| *phase == EventPhase::BeforeStep)
        .map(|(_, scope, _)| *scope)
        .collect();
    assert_eq!(
        depths,
        [
            EventScope::Logical,
            EventScope::ChainLink { depth: 1 },
            EventScope::ChainLink { depth: 2 },
        ]
    );
}

#[rstest]
fn probe_failure_overrides_and_blocks_chain(registry: StepRegistry) {
    DEFERRED_CALLED.store(false, Ordering::SeqCst);
    let mut harness = Harness::new();
    let outcome = harness.run_text(&registry, "a step raising an exception");

    assert_eq!(outcome.status(), StepStatus::Failed);
    assert_eq!(outcome.step().text(), "a step raising an exception");
    assert!(matches!(
        outcome.failure(),
        Some(StepFailure::Environment { detail }) if detail.kind() == ErrorKind::Exception
    ));
    assert!(!DEFERRED_CALLED.load(Ordering::SeqCst));
    assert!(!harness.state.chained_step_used());
    assert!(harness.errors.is_empty());
}

#[rstest]
fn disabled_probe_lets_step_pass(registry: StepRegistry) {
    let mut harness = Harness::new();
    let step = StepNode::new(StepKeyword::When, "a passing step", 3);
    harness.errors.record(ErrorDetail::new(ErrorKind::Warning, "ignored"));
    let config = EngineConfig::default().with_exception_probe(false);

    let outcome = harness.run(&registry, config, &ChainRequest::new(&step));

    assert_eq!(outcome.status(), StepStatus::Passed);
    assert_eq!(harness.state.probes(), 0);
    assert!(!harness.errors.is_empty());
}

#[rstest]
#[case(Some(1))]
#[case(Some(3))]
#[case(Some(10))]
fn looping_chain_hits_depth_limit(registry: StepRegistry, #[case] limit: Option<usize>) {
    let mut harness = Harness::new();
    let step = StepNode::new(StepKeyword::Given, "a looping step", 1);
    let config = EngineConfig::default().with_max_chain_depth(limit);

    let outcome = harness.run(&registry, config, &ChainRequest::new(&step));

    let Some(expected) = limit else {
        panic!("cases are bounded");
    };
    assert!(matches!(
        outcome.failure(),
        Some(StepFailure::ChainDepthExceeded { limit, .. }) if *limit == expected
    ));
    assert!(harness.events.is_balanced());
    assert_eq!(harness.state.invocations(), expected + 1);
}

#[rstest]
fn self_chaining_step_names_itself_as_origin(registry: StepRegistry) {
    let mut harness = Harness::new();
    let step = StepNode::new(StepKeyword::Given, "a looping step", 1);
    let config = EngineConfig::default().with_max_chain_depth(Some(2));

    let outcome = harness.run(&registry, config, &ChainRequest::new(&step));

    assert_eq!(outcome.origin().map(StepNode::text), Some("a looping step"));
    assert_eq!(
        outcome.failure(),
        Some(&StepFailure::ChainDepthExceeded {
            step: "a looping step".into(),
            limit: 2,
        })
    );
}

#[rstest]
#[case("a failing step", StepStatus::Failed)]
#[case("a pending step", StepStatus::Pending)]
fn non_passing_step_leaves_error_log_unread(
    registry: StepRegistry,
    #[case] text: &str,
    #[case] expected: StepStatus,
) {
    let mut harness = Harness::new();
    harness
        .errors
        .record(ErrorDetail::new(ErrorKind::Exception, "left over from setup"));

    let outcome = harness.run_text(&registry, text);

    assert_eq!(outcome.status(), expected);
    assert_eq!(harness.state.probes(), 0);
    assert_eq!(harness.errors.len(), 1);
}

#[rstest]
fn skip_mode_runs_nothing_and_emits_nothing(registry: StepRegistry) {
    let mut harness = Harness::new();
    let step = StepNode::new(StepKeyword::Given, "a chaining step", 1);
    let outcome = harness.run(
        &registry,
        EngineConfig::default(),
        &ChainRequest::new(&step).skipping(true),
    );

    assert_eq!(outcome.status(), StepStatus::Skipped);
    assert!(harness.journal().is_empty());
    assert!(harness.events.events.is_empty());
    assert!(!harness.state.chained_step_used());
}

#[rstest]
fn skip_mode_keeps_undefined(registry: StepRegistry) {
    let mut harness = Harness::new();
    let step = StepNode::new(StepKeyword::Given, "nobody defined this", 1);
    let outcome = harness.run(
        &registry,
        EngineConfig::default(),
        &ChainRequest::new(&step).skipping(true),
    );
    assert_eq!(outcome.status(), StepStatus::Undefined);
}

#[rstest]
fn dry_run_config_skips_everything(registry: StepRegistry) {
    let mut harness = Harness::new();
    let step = StepNode::new(StepKeyword::Given, "a passing step", 1);
    let outcome = harness.run(
        &registry,
        EngineConfig::default().with_dry_run(true),
        &ChainRequest::new(&step),
    );
    assert_eq!(outcome.status(), StepStatus::Skipped);
    assert!(harness.journal().is_empty());
    assert!(harness.events.events.is_empty());
}

#[rstest]
fn outline_tokens_reach_chained_links(registry: StepRegistry) {
    let mut harness = Harness::new();
    let step = StepNode::new(StepKeyword::Given, "a step acting as <role>", 1);
    let tokens = OutlineTokens::from(vec![("role", "manager")]);

    let outcome = harness.run(
        &registry,
        EngineConfig::default(),
        &ChainRequest::new(&step).with_tokens(&tokens),
    );

    assert_eq!(outcome.status(), StepStatus::Passed);
    assert_eq!(outcome.step().text(), "a step acting as manager");
    assert_eq!(harness.journal(), ["I am logged in as manager"]);
}

#[rstest]
fn chained_probe_link_has_no_events(registry: StepRegistry) {
    let mut harness = Harness::new();
    let outcome = harness.run_text(&registry, "a step chaining to the probe");

    assert_eq!(outcome.status(), StepStatus::Passed);
    assert!(harness.events.is_balanced());
    assert!(
        harness
            .events
            .events
            .iter()
            .all(|(_, _, text)| text != crate::probe::PROBE_STEP_TEXT)
    );
    assert_eq!(harness.events.events.len(), 4);
}

#[rstest]
fn undefined_link_decides_the_status(registry: StepRegistry) {
    let mut harness = Harness::new();
    let outcome = harness.run_text(&registry, "a step chaining to an undefined step");
    assert_eq!(outcome.status(), StepStatus::Undefined);
    assert_eq!(outcome.origin().map(StepNode::text), Some("nobody defined this"));
}

#[rstest]
fn empty_sequence_counts_as_no_chain(registry: StepRegistry) {
    let mut harness = Harness::new();
    let outcome = harness.run_text(&registry, "a step chaining to nothing");
    assert_eq!(outcome.status(), StepStatus::Passed);
    assert!(!harness.state.chained_step_used());
}

#[rstest]
#[case("a passing step")]
#[case("a failing step")]
#[case("a step raising an exception")]
#[case("nobody defined this")]
fn unchained_run_equals_merged_invocation(registry: StepRegistry, #[case] text: &str) {
    let mut harness = Harness::new();
    let step = StepNode::new(StepKeyword::When, text, 2);
    let via_runner = harness.run(&registry, EngineConfig::default(), &ChainRequest::new(&step));

    let direct_harness = Harness::new();
    let mut ctx = StepContext::default().with_inspector(&direct_harness.errors);
    ctx.insert("journal", &direct_harness.journal);
    ctx.insert("errors", &direct_harness.errors);
    let invoker = StepInvoker::new(&registry);
    let primary = invoker.invoke(&step, &mut ctx, false).outcome;
    let expected = if primary.status().is_passed() {
        merge(primary, invoker.invoke(&probe_step_for(&step), &mut ctx, false).outcome)
    } else {
        primary
    };

    assert_eq!(via_runner, expected);
}

#[rstest]
fn resolution_reports_after_dispatch(registry: StepRegistry) {
    let step = StepNode::new(StepKeyword::Given, "a passing step", 1);
    let runner = ChainRunner::new(&registry, EngineConfig::default());
    let mut state = RunState::new();
    let mut events = EventLog::default();

    let live = runner.resolve(
        &ChainRequest::new(&step),
        &mut StepContext::default(),
        &mut events,
        &mut state,
    );
    let skipped = runner.resolve(
        &ChainRequest::new(&step).skipping(true),
        &mut StepContext::default(),
        &mut events,
        &mut state,
    );

    assert_eq!(live.map(|r| r.dispatch_after), Ok(true));
    assert_eq!(skipped.map(|r| r.dispatch_after), Ok(false));
}

#[rstest]
fn dispatch_failure_aborts_resolution(registry: StepRegistry) {
    struct Broken;
    impl HookDispatcher for Broken {
        fn dispatch(&mut self, _: &StepEvent<'_>) -> Result<(), DispatchError> {
            Err(DispatchError::Poisoned)
        }
    }
    let journal = Journal::default();
    let mut ctx = StepContext::default();
    ctx.insert("journal", &journal);
    let step = StepNode::new(StepKeyword::Given, "a passing step", 1);

    let result = ChainRunner::new(&registry, EngineConfig::default()).run(
        &ChainRequest::new(&step),
        &mut ctx,
        &mut Broken,
        &mut RunState::new(),
    );

    assert_eq!(result, Err(DispatchError::Poisoned));
    assert!(journal.borrow().is_empty());
}
