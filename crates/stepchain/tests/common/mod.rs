//! Step definitions and hook subscribers shared by the integration tests.

use std::cell::RefCell;
use std::rc::Rc;

use stepchain::{
    ChainItem, ChainedStep, ErrorDetail, ErrorKind, ErrorLog, EventPhase, EventScope, HookNotice,
    HookSubscriber, StepArgs, StepContext, StepError, StepEvent, StepKeyword, StepNode,
    StepRegistry, StepResult, SubscriberScope,
};

/// Names of the steps that actually ran, in order.
pub type Journal = RefCell<Vec<String>>;

fn note(ctx: &StepContext<'_>, args: &StepArgs) {
    if let Some(journal) = ctx.get::<Journal>("journal") {
        journal.borrow_mut().push(args.text().to_string());
    }
}

fn on_the_site(ctx: &mut StepContext<'_>, args: &StepArgs) -> StepResult {
    note(ctx, args);
    Ok(ChainItem::None)
}

fn log_in(ctx: &mut StepContext<'_>, args: &StepArgs) -> StepResult {
    note(ctx, args);
    Ok(ChainItem::None)
}

fn see_error(ctx: &mut StepContext<'_>, args: &StepArgs) -> StepResult {
    note(ctx, args);
    Err(StepError::failed("no error message was shown"))
}

fn break_the_site(ctx: &mut StepContext<'_>, args: &StepArgs) -> StepResult {
    note(ctx, args);
    Ok(ChainItem::single(ChainedStep::then("I should see an error")))
}

fn print_debugging(ctx: &mut StepContext<'_>, args: &StepArgs) -> StepResult {
    note(ctx, args);
    if let Some(errors) = ctx.get::<ErrorLog>("errors") {
        errors.record(ErrorDetail::new(ErrorKind::Debugging, "Developer debug message"));
    }
    Ok(ChainItem::None)
}

fn three_step_setup(ctx: &mut StepContext<'_>, args: &StepArgs) -> StepResult {
    note(ctx, args);
    Ok(ChainItem::sequence([
        ChainedStep::given("I am on the site"),
        ChainedStep::then("I should see an error"),
        ChainedStep::when("I log in as admin"),
    ]))
}

fn log_in_as_role(ctx: &mut StepContext<'_>, args: &StepArgs) -> StepResult {
    note(ctx, args);
    Ok(ChainItem::sequence([
        ChainedStep::given("I am on the site"),
        ChainedStep::when("I log in as <role>"),
    ]))
}

fn nest(ctx: &mut StepContext<'_>, args: &StepArgs) -> StepResult {
    note(ctx, args);
    let levels = args.parse::<u32>(0)?;
    Ok(if levels == 0 {
        ChainItem::None
    } else {
        ChainItem::single(ChainedStep::given(format!("{} nested levels", levels - 1)))
    })
}

/// Registry with the site-flavoured definitions used across the tests.
pub fn site_registry() -> StepRegistry {
    let mut registry = StepRegistry::new();
    registry
        .register("I am on the site", on_the_site)
        .and_then(|r| r.register("I log in as {user:word}", log_in))
        .and_then(|r| r.register("I should see an error", see_error))
        .and_then(|r| r.register("I try to break the site", break_the_site))
        .and_then(|r| r.register("a debug message is printed", print_debugging))
        .and_then(|r| r.register("a three step setup", three_step_setup))
        .and_then(|r| r.register("the {role:word} logs in", log_in_as_role))
        .and_then(|r| r.register("{levels:u32} nested levels", nest))
        .unwrap_or_else(|e| panic!("site registry should build: {e}"));
    registry
}

/// Authored `Given` step.
pub fn given(text: &str, line: u32) -> StepNode {
    StepNode::new(StepKeyword::Given, text, line)
}

/// Subscriber recording every event, chain links included.
#[derive(Clone, Default)]
pub struct InternalLog {
    events: Rc<RefCell<Vec<(EventPhase, EventScope, String)>>>,
}

impl InternalLog {
    /// Recorded events as `(phase, scope, step text)`.
    pub fn events(&self) -> Vec<(EventPhase, EventScope, String)> {
        self.events.borrow().clone()
    }

    /// Number of after-step events seen for chain links.
    pub fn link_pairs(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|(phase, scope, _)| *phase == EventPhase::AfterStep && !scope.is_logical())
            .count()
    }
}

impl HookSubscriber for InternalLog {
    fn name(&self) -> &str {
        "internal-log"
    }

    fn scope(&self) -> SubscriberScope {
        SubscriberScope::Internal
    }

    fn on_event(&mut self, event: &StepEvent<'_>) -> Result<(), HookNotice> {
        self.events
            .borrow_mut()
            .push((event.phase(), event.scope(), event.step().text().to_string()));
        Ok(())
    }
}
