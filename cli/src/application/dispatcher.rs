//! Command lifecycle dispatcher.
//!
//! Verbs resolve through an explicit [`CommandRegistry`] built at startup.
//! Every dispatch walks the same state machine:
//!
//! ```text
//! Created -> Validated -> PrePerformed -> Performed -> PostPerformed -> Done
//!    |           |
//!    +-----------+--> Aborted   (help request, missing arguments/environment)
//! ```
//!
//! Pre and post hooks run as the application user, one remote call per hook,
//! in HookSet order. A failing hook is reported and the next hook still runs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

use crate::application::ports::{LocalFs, LocalGit, Prompter, ProgressReporter};
use crate::application::remote::RemoteExecutor;
use crate::domain::hooks::{display_key, render_command};
use crate::domain::{Configuration, DispatchError, HookPhase, HookSet, Invocation};

// ── Command contract ──────────────────────────────────────────────────────────

/// Everything a command may touch while performing.
pub struct CommandContext<'a> {
    pub invocation: &'a Invocation,
    pub config: &'a Configuration,
    pub hooks: &'a HookSet,
    pub remote: &'a RemoteExecutor<'a>,
    pub git: &'a dyn LocalGit,
    pub fs: &'a dyn LocalFs,
    pub prompter: &'a dyn Prompter,
    pub reporter: &'a dyn ProgressReporter,
    pub registry: &'a CommandRegistry,
    /// Local home directory, for `~/.ssh` lookups.
    pub home: Option<PathBuf>,
    /// Emit machine-readable output where a command supports it.
    pub json: bool,
}

/// A verb's body. Argument and environment checks are declared on its
/// [`CommandSpec`]; `validate` adds verb-specific checks on top.
#[async_trait]
pub trait Command: Send + Sync {
    /// Extra validation beyond the declared required arguments.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the invocation is unusable.
    fn validate(&self, _invocation: &Invocation) -> Result<(), String> {
        Ok(())
    }

    /// Whether `perform` runs commands as root. When it does and sudo is not
    /// configured, the root password is asked for once before performing.
    fn requires_root(&self) -> bool {
        false
    }

    /// The verb-specific action.
    async fn perform(&self, ctx: &CommandContext<'_>) -> Result<()>;
}

/// Constructs a command for one invocation.
pub type CommandFactory = fn(&Invocation) -> Box<dyn Command>;

/// Static description of a verb.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub verb: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub examples: &'static [&'static str],
    /// Names of the positional arguments that must be present.
    pub required_args: &'static [&'static str],
    pub requires_environment: bool,
    /// Run pre/post hooks around `perform`.
    pub performs_hooks: bool,
    /// Module that contributes this verb, if any.
    pub module: Option<&'static str>,
    pub factory: CommandFactory,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("verb", &self.verb)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Verb → spec mapping, populated once and passed by reference.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    specs: BTreeMap<&'static str, CommandSpec>,
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `spec`, replacing any earlier spec for the same verb.
    pub fn register(&mut self, spec: CommandSpec) -> &mut Self {
        self.specs.insert(spec.verb, spec);
        self
    }

    /// Look up a verb.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::CommandNotFound`] for unknown verbs.
    pub fn get(&self, verb: &str) -> Result<&CommandSpec, DispatchError> {
        self.specs
            .get(verb)
            .ok_or_else(|| DispatchError::CommandNotFound(verb.to_string()))
    }

    #[must_use]
    pub fn contains(&self, verb: &str) -> bool {
        self.specs.contains_key(verb)
    }

    /// Specs in verb order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.specs.values()
    }
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

/// Lifecycle states of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Validated,
    PrePerformed,
    Performed,
    PostPerformed,
    Done,
    Aborted,
}

/// Why a dispatch stopped before performing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// `--help` after the verb; not an error.
    HelpRequested,
    /// Missing arguments or environment; usage should be shown.
    Invalid(DispatchError),
}

/// Result of a dispatch that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub verb: String,
    /// Every state visited, in order.
    pub states: Vec<LifecycleState>,
    pub aborted: Option<AbortReason>,
    /// Display keys of hooks whose remote call failed.
    pub failed_hooks: Vec<String>,
}

impl DispatchReport {
    fn new(verb: &str) -> Self {
        Self {
            verb: verb.to_string(),
            states: vec![LifecycleState::Created],
            aborted: None,
            failed_hooks: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.states
            .last()
            .copied()
            .unwrap_or(LifecycleState::Created)
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state() == LifecycleState::Done
    }

    fn advance(&mut self, next: LifecycleState) {
        self.states.push(next);
    }

    fn abort(mut self, reason: AbortReason) -> Self {
        self.states.push(LifecycleState::Aborted);
        self.aborted = Some(reason);
        self
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

pub struct Dispatcher<'a> {
    registry: &'a CommandRegistry,
}

impl<'a> Dispatcher<'a> {
    #[must_use]
    pub fn new(registry: &'a CommandRegistry) -> Self {
        Self { registry }
    }

    /// Resolve the verb and drive the lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::CommandNotFound`] before anything executes for
    /// unknown verbs, and propagates failures of `perform` (including
    /// transport errors). Hook failures are reported, never returned.
    pub async fn dispatch(&self, ctx: &CommandContext<'_>) -> Result<DispatchReport> {
        let invocation = ctx.invocation;
        let spec = self.registry.get(&invocation.verb)?;
        let report = DispatchReport::new(&invocation.verb);

        if invocation.help {
            return Ok(report.abort(AbortReason::HelpRequested));
        }

        let command = (spec.factory)(invocation);
        if let Err(reason) = validate(spec, invocation, ctx.config)
            .and_then(|()| command.validate(invocation))
        {
            return Ok(report.abort(AbortReason::Invalid(DispatchError::Validation {
                reason,
                usage: spec.usage.to_string(),
            })));
        }

        let mut report = report;
        report.advance(LifecycleState::Validated);

        if spec.performs_hooks {
            self.run_hooks(HookPhase::Pre, ctx, &mut report).await;
        }
        report.advance(LifecycleState::PrePerformed);

        if command.requires_root() {
            ctx.remote.ensure_root_access()?;
        }
        command.perform(ctx).await?;
        report.advance(LifecycleState::Performed);

        if spec.performs_hooks {
            self.run_hooks(HookPhase::Post, ctx, &mut report).await;
        }
        report.advance(LifecycleState::PostPerformed);
        report.advance(LifecycleState::Done);
        Ok(report)
    }

    async fn run_hooks(
        &self,
        phase: HookPhase,
        ctx: &CommandContext<'_>,
        report: &mut DispatchReport,
    ) {
        for hook in ctx.hooks.phase(phase) {
            let key = display_key(hook);
            let command = render_command(hook);
            ctx.reporter
                .step(&format!("Performing {phase}-hook {key}"));
            match ctx.remote.execute_as_user(&command).await {
                Ok(output) => {
                    if !output.trim().is_empty() {
                        ctx.reporter.output(output.trim_end());
                    }
                }
                Err(err) => {
                    tracing::warn!(hook = %key, error = %err, "hook failed");
                    ctx.reporter
                        .warn(&format!("{phase}-hook {key} failed: {err:#}"));
                    report.failed_hooks.push(key);
                }
            }
        }
    }
}

fn validate(
    spec: &CommandSpec,
    invocation: &Invocation,
    config: &Configuration,
) -> Result<(), String> {
    if let Some(missing) = spec.required_args.get(invocation.args.len()) {
        return Err(format!("Missing <{missing}>."));
    }
    if spec.requires_environment && (invocation.environment.is_none() || !config.found) {
        return Err("No environment specified.".to_string());
    }
    Ok(())
}
