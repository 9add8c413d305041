//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`: never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{RemoteSession, TransportError};

// ── Remote Execution Port ─────────────────────────────────────────────────────

/// Runs one command on a remote host over a fresh authenticated session.
///
/// Implementations open and tear down their own connection on every call and
/// block until the remote command completes. Only stdout is returned; the
/// remote exit status is not surfaced.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `wire_command` exactly as given (no quoting or escaping).
    async fn run(&self, session: &RemoteSession, wire_command: &str)
    -> Result<String, TransportError>;
}

// ── Local Git Port ────────────────────────────────────────────────────────────

/// The local git repository the push verbs operate on.
#[async_trait]
pub trait LocalGit: Send + Sync {
    /// Whether a remote called `name` is configured.
    async fn has_remote(&self, name: &str) -> Result<bool>;
    /// Add remote `name` pointing at `url`.
    async fn add_remote(&self, name: &str, url: &str) -> Result<()>;
    /// Force-push `source` to the remote's `master` branch.
    async fn push(&self, remote: &str, source: &str) -> Result<()>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
}

// ── Prompt Port ───────────────────────────────────────────────────────────────

/// Interactive questions asked of the operator.
pub trait Prompter: Send + Sync {
    /// Ask for a secret without echo.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    fn password(&self, prompt: &str) -> Result<String>;

    /// Ask a yes/no question.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter: Send + Sync {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Emit raw text verbatim (remote output, printable command lines).
    fn output(&self, text: &str);
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Abstracts the local files the orchestrator reads.
pub trait LocalFs: Send + Sync {
    /// Returns `true` if `path` exists.
    fn exists(&self, path: &Path) -> bool;
    /// Read a UTF-8 file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> Result<String>;
}
