//! Built-in demonstration test cases
//!
//! Each demo assembles a test case in code from the containers and built-in
//! leaves, the way a suite author would.

use std::sync::Arc;
use std::time::Duration;

use crate::action::Action;
use crate::builtin::{
    AssertFailure, CreateVariables, Echo, Fail, Sleep, StopTime, TraceVariables,
};
use crate::container::{
    Catch, Conditional, Iterate, Parallel, RepeatOnErrorUntilTrue, Sequence, Template,
    TemplateDefinition, TemplateRegistry, TemplateResolver,
};
use crate::test_case::{TestCase, TestStatus};

/// A registered demo
pub struct DemoInfo {
    pub id: &'static str,
    pub description: &'static str,
    pub build: fn() -> TestCase,
}

/// All demos, in run order
pub fn all_demos() -> &'static [DemoInfo] {
    &DEMOS
}

/// Look up a demo by id
pub fn find(id: &str) -> Option<&'static DemoInfo> {
    DEMOS.iter().find(|d| d.id == id)
}

static DEMOS: [DemoInfo; 4] = [
    DemoInfo {
        id: "retry",
        description: "Retry a flaky step until it succeeds",
        build: retry,
    },
    DemoInfo {
        id: "parallel",
        description: "Run branches concurrently on a shared context",
        build: parallel,
    },
    DemoInfo {
        id: "template",
        description: "Reuse a parameterized template with global and isolated scope",
        build: template,
    },
    DemoInfo {
        id: "cleanup",
        description: "Catch and assert failures, then run the finally chain",
        build: cleanup,
    },
];

fn retry() -> TestCase {
    // Attempts 1 and 2 fail, attempt 3 succeeds and stops the loop
    let service = Sequence::new(vec![
        Conditional::new(
            "${attempt} < 3",
            vec![Action::leaf(
                Fail::new("service not ready (attempt ${attempt})").with_kind("IO"),
            )],
        )
        .into(),
        Action::leaf(Echo::new("service answered on attempt ${attempt}")),
    ])
    .with_name("poll-service");

    TestCase::new("retry")
        .with_description("Polls an unreliable service until it answers")
        .with_author("actionflow")
        .with_status(TestStatus::Final)
        .with_action(
            RepeatOnErrorUntilTrue::new("${attempt} >= 5", vec![service.into()])
                .with_index_name("attempt")
                .with_auto_sleep(Duration::from_millis(100)),
        )
        .with_action(Action::leaf(TraceVariables::names(["attempt"])))
}

fn parallel() -> TestCase {
    let branch = |n: u64| -> Action {
        Sequence::new(vec![
            Action::leaf(Echo::new(format!("branch {} started", n))),
            Action::leaf(Sleep::millis(50 * n)),
            Action::leaf(CreateVariables::new().variable(format!("branch_{}", n), "done")),
        ])
        .with_name(format!("branch-{}", n))
        .into()
    };

    TestCase::new("parallel")
        .with_description("Fans out three branches and joins on their results")
        .with_author("actionflow")
        .with_status(TestStatus::Final)
        .with_action(Action::leaf(StopTime::new("fan-out")))
        .with_action(Parallel::new((1..=3).map(branch).collect()))
        .with_action(Action::leaf(StopTime::new("fan-out")))
        .with_action(Action::leaf(TraceVariables::names([
            "branch_1",
            "branch_2",
            "branch_3",
            "fan-out_elapsed_ms",
        ])))
}

fn template() -> TestCase {
    let mut registry = TemplateRegistry::new();
    registry.register(
        TemplateDefinition::new(
            "login",
            vec![
                Action::leaf(Echo::new("logging in as ${user}")),
                Action::leaf(CreateVariables::new().variable("session", "token-${user}")),
            ],
        )
        .with_parameter("user", "guest"),
    );
    let resolver: Arc<dyn TemplateResolver> = Arc::new(registry);

    TestCase::new("template")
        .with_description("Logs in through a shared template")
        .with_author("actionflow")
        .with_status(TestStatus::Final)
        .with_variable("admin", "root")
        .with_action(Template::new("login", resolver.clone()))
        .with_action(Template::new("login", resolver.clone()).with_parameter("user", "${admin}"))
        .with_action(
            Template::new("login", resolver)
                .with_parameter("user", "sandbox")
                .with_global_context(false)
                .with_description("isolated login leaves the session untouched"),
        )
        .with_action(Action::leaf(TraceVariables::names(["session"])))
}

fn cleanup() -> TestCase {
    TestCase::new("cleanup")
        .with_description("Handles expected failures and always cleans up")
        .with_author("actionflow")
        .with_status(TestStatus::Final)
        .with_variable("resource", "queue-1")
        .with_action(Catch::for_kind(
            "IO",
            vec![Action::leaf(
                Fail::new("connection to ${resource} dropped").with_kind("IO"),
            )],
        ))
        .with_action(
            AssertFailure::new(Action::leaf(Fail::new("invalid order")))
                .with_kind("Fail")
                .with_message("invalid order"),
        )
        .with_action(Iterate::new(
            "i <= 3",
            vec![Action::leaf(Echo::new("checking message ${i}"))],
        ))
        .with_finally(Action::leaf(Echo::new("releasing ${resource}")))
}
