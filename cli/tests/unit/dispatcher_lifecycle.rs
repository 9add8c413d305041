//! Lifecycle tests for `Dispatcher`: phase ordering, hook failure handling,
//! root password caching and validation aborts.

#![allow(clippy::expect_used)]

use anyhow::Result;
use async_trait::async_trait;
use deckhand::application::{
    AbortReason, Command, CommandContext, CommandRegistry, CommandSpec, LifecycleState,
};
use deckhand::domain::{DispatchError, Identity, Invocation};

use crate::helpers::{CONFIG, Harness, MockOperator, RecordingShell, SUDO_CONFIG, staging, staging_hooks};

/// Test verb: `ping [root] on <env>` runs `perform` as the user, or
/// `whoami` twice as root.
struct Ping {
    root: bool,
}

#[async_trait]
impl Command for Ping {
    fn requires_root(&self) -> bool {
        self.root
    }

    async fn perform(&self, ctx: &CommandContext<'_>) -> Result<()> {
        if self.root {
            ctx.remote.execute_as_root("whoami").await?;
            ctx.remote.execute_as_root("whoami").await?;
        } else {
            ctx.remote.execute_as_user("perform").await?;
        }
        Ok(())
    }
}

fn ping(inv: &Invocation) -> Box<dyn Command> {
    Box::new(Ping {
        root: inv.arg(0) == Some("root"),
    })
}

const PING: CommandSpec = CommandSpec {
    verb: "ping",
    description: "Test verb.",
    usage: "ping [root] on <environment>",
    examples: &[],
    required_args: &[],
    requires_environment: true,
    performs_hooks: true,
    module: None,
    factory: ping,
};

const QUIET_PING: CommandSpec = CommandSpec {
    verb: "quiet-ping",
    performs_hooks: false,
    ..PING
};

const NEEDS_ARG: CommandSpec = CommandSpec {
    verb: "needs-arg",
    required_args: &["thing"],
    ..PING
};

fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(PING).register(QUIET_PING).register(NEEDS_ARG);
    registry
}

fn harness(config_src: &str) -> Harness {
    let mut harness = Harness::new(staging(config_src), registry());
    harness.hooks = staging_hooks();
    harness
}

#[tokio::test]
async fn test_pre_hooks_then_perform_then_post_hooks() {
    let harness = harness(CONFIG);

    let report = harness.dispatch("ping on staging").await.expect("dispatches");

    assert!(report.is_done());
    assert_eq!(
        report.states,
        vec![
            LifecycleState::Created,
            LifecycleState::Validated,
            LifecycleState::PrePerformed,
            LifecycleState::Performed,
            LifecycleState::PostPerformed,
            LifecycleState::Done,
        ]
    );
    assert_eq!(
        harness.shell.commands(),
        vec![
            "rm -rf output;".to_string(),
            "perform".to_string(),
            "rake render:output;".to_string(),
            "/etc/init.d/nginx stop;sleep 1;/etc/init.d/nginx start;mkdir tmp;touch tmp/restart.txt;"
                .to_string(),
            "git commit -am \"Commit and Ensuring\";git checkout master;".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_hooks_run_as_application_user() {
    let harness = harness(CONFIG);

    harness.dispatch("ping on staging").await.expect("dispatches");

    for call in harness.shell.calls() {
        assert_eq!(call.session.identity, Identity::AsUser);
        assert_eq!(call.session.login, "git");
        assert_eq!(call.session.host, "123.45.678.910");
        assert_eq!(call.session.port, 20);
        assert_eq!(call.session.password.as_deref(), Some("testtest"));
    }
}

#[tokio::test]
async fn test_failing_hook_does_not_stop_later_hooks() {
    let mut harness = harness(CONFIG);
    harness.shell = RecordingShell::failing_on("rake render:output");

    let report = harness.dispatch("ping on staging").await.expect("dispatches");

    assert!(report.is_done());
    assert_eq!(report.failed_hooks, vec!["1) render_output".to_string()]);
    assert_eq!(harness.shell.commands().len(), 5);
    assert!(
        harness
            .reporter
            .messages()
            .iter()
            .any(|m| m.starts_with("warn: post-hook 1) render_output failed")),
        "got: {:?}",
        harness.reporter.messages()
    );
}

#[tokio::test]
async fn test_command_without_hooks_still_passes_through_phases() {
    let harness = harness(CONFIG);

    let report = harness
        .dispatch("quiet-ping on staging")
        .await
        .expect("dispatches");

    assert!(report.is_done());
    assert!(report.states.contains(&LifecycleState::PrePerformed));
    assert!(report.states.contains(&LifecycleState::PostPerformed));
    assert_eq!(harness.shell.commands(), vec!["perform".to_string()]);
}

#[tokio::test]
async fn test_perform_failure_propagates_and_skips_post_hooks() {
    let mut harness = harness(CONFIG);
    harness.shell = RecordingShell::failing_on("perform");

    let err = harness
        .dispatch("ping on staging")
        .await
        .expect_err("perform fails");

    assert!(err.to_string().contains("connection reset"), "got: {err}");
    assert_eq!(
        harness.shell.commands(),
        vec!["rm -rf output;".to_string(), "perform".to_string()]
    );
}

#[tokio::test]
async fn test_root_password_prompted_once_per_dispatch() {
    let mut harness = harness(CONFIG);
    let mut prompter = MockOperator::new();
    prompter
        .expect_password()
        .times(1)
        .returning(|_| Ok("s3cret".to_string()));
    prompter.expect_confirm().never();
    harness.prompter = prompter;

    harness
        .dispatch("quiet-ping root on staging")
        .await
        .expect("dispatches");

    let calls = harness.shell.calls();
    assert_eq!(calls.len(), 2);
    for call in calls {
        assert_eq!(call.session.identity, Identity::AsRootDirect);
        assert_eq!(call.session.login, "root");
        assert_eq!(call.session.password.as_deref(), Some("s3cret"));
        assert_eq!(call.command, "whoami");
    }
}

#[tokio::test]
async fn test_sudo_configuration_never_prompts_and_wraps_commands() {
    let harness = harness(SUDO_CONFIG);

    harness
        .dispatch("quiet-ping root on staging")
        .await
        .expect("dispatches");

    let calls = harness.shell.calls();
    assert_eq!(calls.len(), 2);
    for call in calls {
        assert_eq!(call.session.identity, Identity::AsRootViaSudo);
        assert_eq!(call.session.login, "git");
        assert_eq!(call.session.port, 22);
        assert_eq!(call.command, "sudo su - -c 'whoami'");
    }
}

#[tokio::test]
async fn test_unknown_verb_is_command_not_found_and_executes_nothing() {
    let harness = harness(CONFIG);

    let err = harness
        .dispatch("deploy to staging")
        .await
        .expect_err("unknown verb");

    assert_eq!(
        err.downcast_ref::<DispatchError>(),
        Some(&DispatchError::CommandNotFound("deploy".to_string()))
    );
    assert!(harness.shell.calls().is_empty());
}

#[tokio::test]
async fn test_missing_argument_aborts_with_usage() {
    let harness = harness(CONFIG);

    let report = harness
        .dispatch("needs-arg on staging")
        .await
        .expect("aborts cleanly");

    assert_eq!(report.state(), LifecycleState::Aborted);
    assert_eq!(
        report.aborted,
        Some(AbortReason::Invalid(DispatchError::Validation {
            reason: "Missing <thing>.".to_string(),
            usage: "ping [root] on <environment>".to_string(),
        }))
    );
    assert!(harness.shell.calls().is_empty());
}

#[tokio::test]
async fn test_missing_environment_aborts() {
    let harness = harness(CONFIG);

    let report = harness.dispatch("ping").await.expect("aborts cleanly");

    assert!(matches!(
        report.aborted,
        Some(AbortReason::Invalid(DispatchError::Validation { ref reason, .. }))
            if reason == "No environment specified."
    ));
    assert!(harness.shell.calls().is_empty());
}

#[tokio::test]
async fn test_help_request_aborts_without_executing() {
    let harness = harness(CONFIG);

    let report = harness
        .dispatch("ping --help on staging")
        .await
        .expect("aborts cleanly");

    assert_eq!(report.aborted, Some(AbortReason::HelpRequested));
    assert_eq!(
        report.states,
        vec![LifecycleState::Created, LifecycleState::Aborted]
    );
    assert!(harness.shell.calls().is_empty());
}
