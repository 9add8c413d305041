//! `RemoteExecutor` identity handling and the spinner decorator.

#![allow(clippy::expect_used)]

use deckhand::application::{RemoteExecutor, RemoteShell};
use deckhand::domain::{Identity, KeyPair, RemoteSession, TransportError};
use deckhand::output::{OutputContext, SpinningShell};

use crate::helpers::{CONFIG, MockOperator, RecordingShell, SUDO_CONFIG, silent_prompter, staging};

#[tokio::test]
async fn test_execute_as_user_forwards_command_unmodified() {
    let config = staging(CONFIG);
    let shell = RecordingShell::new().responding("uptime", " 10:00 up 3 days\n");
    let prompter = silent_prompter();
    let remote = RemoteExecutor::new(&config, &shell, &prompter, None);

    let out = remote.execute_as_user("uptime").await.expect("runs");

    assert_eq!(out, " 10:00 up 3 days\n");
    let calls = shell.calls();
    assert_eq!(calls[0].command, "uptime");
    assert_eq!(calls[0].session.login, "git");
}

#[tokio::test]
async fn test_root_direct_without_password_uses_empty_password() {
    let config = staging(CONFIG);
    let shell = RecordingShell::new();
    let mut prompter = MockOperator::new();
    prompter
        .expect_password()
        .withf(|prompt| prompt.contains("root@123.45.678.910"))
        .times(1)
        .returning(|_| Ok(String::new()));
    let remote = RemoteExecutor::new(&config, &shell, &prompter, None);

    remote.execute_as_root("id").await.expect("runs");
    remote.execute("id -u", Identity::AsRootDirect).await.expect("runs");

    for call in shell.calls() {
        assert_eq!(call.session.login, "root");
        assert_eq!(call.session.password.as_deref(), Some(""));
    }
}

#[tokio::test]
async fn test_root_identity_follows_use_sudo() {
    let prompter = silent_prompter();
    let shell = RecordingShell::new();

    let direct = staging(CONFIG);
    let sudo = staging(SUDO_CONFIG);

    assert_eq!(
        RemoteExecutor::new(&direct, &shell, &prompter, None).root_identity(),
        Identity::AsRootDirect
    );
    assert_eq!(
        RemoteExecutor::new(&sudo, &shell, &prompter, None).root_identity(),
        Identity::AsRootViaSudo
    );
}

#[tokio::test]
async fn test_sudo_wrapping_does_not_escape_quotes() {
    let config = staging(SUDO_CONFIG);
    let shell = RecordingShell::new();
    let prompter = silent_prompter();
    let remote = RemoteExecutor::new(&config, &shell, &prompter, None);

    remote
        .execute_as_root("echo 'hi' > /tmp/x")
        .await
        .expect("runs");

    assert_eq!(shell.commands(), vec!["sudo su - -c 'echo 'hi' > /tmp/x'".to_string()]);
}

#[tokio::test]
async fn test_key_pair_is_offered_to_the_transport() {
    let config = staging(CONFIG);
    let shell = RecordingShell::new();
    let prompter = silent_prompter();
    let key = KeyPair {
        public: "/home/operator/.ssh/id_rsa.pub".into(),
        private: "/home/operator/.ssh/id_rsa".into(),
    };
    let remote = RemoteExecutor::new(&config, &shell, &prompter, Some(key.clone()));

    remote.execute_as_user("true").await.expect("runs");

    assert_eq!(shell.calls()[0].session.key, Some(key));
}

#[tokio::test]
async fn test_missing_host_is_reported_before_connecting() {
    let config = deckhand::domain::resolve(
        "- application: App\n  environments: [staging]\n  authorize:\n    user: git\n",
        Some("staging"),
    )
    .expect("resolves");
    let shell = RecordingShell::new();
    let prompter = silent_prompter();
    let remote = RemoteExecutor::new(&config, &shell, &prompter, None);

    let err = remote.execute_as_user("true").await.expect_err("no host");

    assert!(err.to_string().contains("authorize.ip"), "got: {err}");
    assert!(shell.calls().is_empty());
}

// --- SpinningShell ---

fn session() -> RemoteSession {
    RemoteSession {
        identity: Identity::AsUser,
        host: "10.0.0.5".to_string(),
        port: 22,
        login: "git".to_string(),
        password: None,
        passphrase: None,
        key: None,
    }
}

#[tokio::test]
async fn test_spinning_shell_passes_result_through() {
    let ctx = OutputContext::new(true, true);
    let shell = SpinningShell::new(RecordingShell::new().responding("ls", "a\nb\n"), &ctx);

    let out = shell.run(&session(), "ls").await.expect("runs");

    assert_eq!(out, "a\nb\n");
}

#[tokio::test]
async fn test_spinning_shell_propagates_transport_error() {
    let ctx = OutputContext::new(true, true);
    let shell = SpinningShell::new(RecordingShell::failing_on("ls"), &ctx);

    let err = shell.run(&session(), "ls").await.expect_err("fails");

    assert!(matches!(err, TransportError::Channel { .. }));
}
