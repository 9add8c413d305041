//! Shared test doubles: recording `RemoteShell`, `LocalGit`, `LocalFs` and
//! `ProgressReporter` implementations, a mockall `Prompter` (`MockOperator`),
//! and a harness that wires them into a `CommandContext`.

#![allow(dead_code, clippy::expect_used)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use deckhand::application::{
    CommandContext, CommandRegistry, DispatchReport, Dispatcher, LocalFs, LocalGit,
    ProgressReporter, Prompter, RemoteExecutor, RemoteShell,
};
use deckhand::domain::hooks::parse;
use deckhand::domain::{Configuration, HookSet, Invocation, RemoteSession, TransportError, resolve};
use mockall::mock;

// ── Fixtures ──────────────────────────────────────────────────────────────────

pub const CONFIG: &str = r"
- application: RSpec Staging Example Application
  environments: [staging]
  authorize:
    user: git
    password: testtest
    ip: 123.45.678.910
    port: 20
  git:
    path: /var/apps/
  modules: [passenger]
";

pub const SUDO_CONFIG: &str = r"
- application: RSpec Staging Example Application
  environments: [staging]
  authorize:
    user: git
    password: testtest
    ip: 123.45.678.910
    use_sudo: true
  git:
    path: /var/apps/
";

pub const HOOKS: &str = r#"
- perform_on: [staging]
  hooks:
    - pre: remove_output
      run:
        - rm -rf output
    - post: render_output
      run:
        - rake render:output
    - post: restart_nginx_and_passenger
      run:
        - /etc/init.d/nginx stop
        - sleep 1
        - /etc/init.d/nginx start
        - mkdir tmp
        - touch tmp/restart.txt
    - post: ensure_correct_branch
      run:
        - git commit -am "Commit and Ensuring"
        - git checkout master
"#;

pub const APP_DIR: &str = "/var/apps/rspec_staging_example_application.staging";

pub fn staging(config_src: &str) -> Configuration {
    resolve(config_src, Some("staging")).expect("fixture resolves")
}

pub fn staging_hooks() -> HookSet {
    parse(HOOKS, "staging").expect("fixture parses")
}

pub fn invocation(line: &str) -> Invocation {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    Invocation::parse(&tokens).expect("request has a verb")
}

// ── RemoteShell double ────────────────────────────────────────────────────────

/// One recorded remote call.
#[derive(Debug, Clone)]
pub struct ShellCall {
    pub session: RemoteSession,
    pub command: String,
}

/// Records every call and fails calls whose command contains `fail_on`.
/// Otherwise answers with the first canned response whose needle the command
/// contains. Scripted responses are consumed in turn; the last one repeats.
#[derive(Default)]
pub struct RecordingShell {
    calls: Mutex<Vec<ShellCall>>,
    fail_on: Option<String>,
    responses: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Self::default()
        }
    }

    pub fn responding(self, needle: &str, stdout: &str) -> Self {
        self.responding_in_turn(needle, &[stdout])
    }

    pub fn responding_in_turn(self, needle: &str, outputs: &[&str]) -> Self {
        self.responses.lock().expect("lock").push((
            needle.to_string(),
            outputs.iter().map(ToString::to_string).collect(),
        ));
        self
    }

    pub fn calls(&self) -> Vec<ShellCall> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }
}

#[async_trait]
impl RemoteShell for RecordingShell {
    async fn run(
        &self,
        session: &RemoteSession,
        wire_command: &str,
    ) -> Result<String, TransportError> {
        self.calls.lock().expect("lock").push(ShellCall {
            session: session.clone(),
            command: wire_command.to_string(),
        });
        if self
            .fail_on
            .as_deref()
            .is_some_and(|needle| wire_command.contains(needle))
        {
            return Err(TransportError::Channel {
                host: session.host.clone(),
                reason: "connection reset".to_string(),
            });
        }
        let mut responses = self.responses.lock().expect("lock");
        Ok(responses
            .iter_mut()
            .find(|(needle, _)| wire_command.contains(needle.as_str()))
            .map(|(_, outputs)| {
                if outputs.len() > 1 {
                    outputs.remove(0)
                } else {
                    outputs.first().cloned().unwrap_or_default()
                }
            })
            .unwrap_or_default())
    }
}

// ── LocalGit double ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    AddRemote { name: String, url: String },
    Push { remote: String, source: String },
}

#[derive(Default)]
pub struct RecordingGit {
    pub remote_exists: bool,
    calls: Mutex<Vec<GitCall>>,
}

impl RecordingGit {
    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl LocalGit for RecordingGit {
    async fn has_remote(&self, _name: &str) -> Result<bool> {
        Ok(self.remote_exists)
    }

    async fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.calls.lock().expect("lock").push(GitCall::AddRemote {
            name: name.to_string(),
            url: url.to_string(),
        });
        Ok(())
    }

    async fn push(&self, remote: &str, source: &str) -> Result<()> {
        self.calls.lock().expect("lock").push(GitCall::Push {
            remote: remote.to_string(),
            source: source.to_string(),
        });
        Ok(())
    }
}

// ── LocalFs double ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemFs {
    files: HashMap<PathBuf, String>,
    reads: AtomicUsize,
}

impl MemFs {
    /// Number of `read_to_string` calls so far, including failed ones.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files.insert(path.into(), content.to_string());
        self
    }
}

impl LocalFs for MemFs {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such file {}", path.display()))
    }
}

// ── ProgressReporter double ───────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("lock").clone()
    }

    fn record(&self, kind: &str, message: &str) {
        self.messages
            .lock()
            .expect("lock")
            .push(format!("{kind}: {message}"));
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.record("step", message);
    }
    fn success(&self, message: &str) {
        self.record("success", message);
    }
    fn warn(&self, message: &str) {
        self.record("warn", message);
    }
    fn output(&self, text: &str) {
        self.record("output", text);
    }
}

// ── Prompter mock ─────────────────────────────────────────────────────────────

mock! {
    pub Operator {}

    impl Prompter for Operator {
        fn password(&self, prompt: &str) -> Result<String>;
        fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
    }
}

/// A prompter that must not be asked anything.
pub fn silent_prompter() -> MockOperator {
    let mut prompter = MockOperator::new();
    prompter.expect_password().never();
    prompter.expect_confirm().never();
    prompter
}

// ── Harness ───────────────────────────────────────────────────────────────────

pub struct Harness {
    pub config: Configuration,
    pub hooks: HookSet,
    pub shell: RecordingShell,
    pub git: RecordingGit,
    pub fs: MemFs,
    pub prompter: MockOperator,
    pub reporter: RecordingReporter,
    pub registry: CommandRegistry,
    pub home: Option<PathBuf>,
}

impl Harness {
    pub fn new(config: Configuration, registry: CommandRegistry) -> Self {
        Self {
            config,
            hooks: HookSet::new(),
            shell: RecordingShell::new(),
            git: RecordingGit::default(),
            fs: MemFs::default(),
            prompter: silent_prompter(),
            reporter: RecordingReporter::default(),
            registry,
            home: None,
        }
    }

    pub async fn dispatch(&self, line: &str) -> Result<DispatchReport> {
        let invocation = invocation(line);
        let remote = RemoteExecutor::new(&self.config, &self.shell, &self.prompter, None);
        let ctx = CommandContext {
            invocation: &invocation,
            config: &self.config,
            hooks: &self.hooks,
            remote: &remote,
            git: &self.git,
            fs: &self.fs,
            prompter: &self.prompter,
            reporter: &self.reporter,
            registry: &self.registry,
            home: self.home.clone(),
            json: false,
        };
        Dispatcher::new(&self.registry).dispatch(&ctx).await
    }
}
