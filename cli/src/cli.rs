//! CLI argument parsing with clap derive, and the request pipeline:
//! configuration → command registry → hooks → dispatch.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::application::{
    AbortReason, CommandContext, DEFAULT_PROJECT_DIR, Dispatcher, HookRegistry, RemoteExecutor,
    load_configuration,
};
use crate::commands::{self, help};
use crate::domain::ssh::key_pair;
use crate::domain::{DispatchError, HookSet, Invocation};
use crate::infra::fs::StdFs;
use crate::infra::git::GitCli;
use crate::infra::prompt::DialoguerPrompter;
use crate::infra::ssh::Ssh2Shell;
use crate::output::{SpinningShell, TerminalReporter};

/// Push applications to remote environments and run their lifecycle hooks
#[derive(Parser)]
#[command(
    name = "deckhand",
    version,
    arg_required_else_help = true,
    after_help = "Run 'deckhand help' to list the available commands."
)]
pub struct Cli {
    /// Project directory holding config.yml and hooks.yml
    #[arg(long, env = "DECKHAND_DIR", default_value = DEFAULT_PROJECT_DIR)]
    pub dir: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    /// Answer confirmations with yes
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Log diagnostics to stderr (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,

    /// <command> [args...] [to|for|from|on|in <environment>]
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "REQUEST"
    )]
    pub request: Vec<String>,
}

impl Cli {
    /// Execute the request.
    ///
    /// Returns the exit code for completed and aborted dispatches: success
    /// for a finished command or an explicit help request, failure when
    /// validation aborted it.
    ///
    /// # Errors
    ///
    /// Returns an error for configuration and hooks failures, unknown
    /// commands, and failures while performing.
    pub async fn run(self) -> Result<ExitCode> {
        let invocation = Invocation::parse(&self.request).context("no command given")?;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color: self.no_color,
                quiet: self.quiet,
                json: self.json,
            },
            behaviour: BehaviourFlags {
                yes: self.yes,
                dir: self.dir,
            },
        });

        let fs = StdFs;
        let config = load_configuration(&fs, &app.paths, invocation.environment.as_deref())?;
        let registry = commands::registry(&config.modules);
        let spec = *registry.get(&invocation.verb)?;

        let hooks = match config.environment.as_deref() {
            Some(environment) if config.found => HookRegistry::new(&fs, environment)
                .parse(&app.paths.hooks_file())?
                .merge_modules(&app.paths, &config.modules)?
                .into_set(),
            _ => HookSet::new(),
        };

        let home = dirs::home_dir();
        let key = home
            .as_deref()
            .map(|h| key_pair(h, config.credentials.ssh_key.as_deref()));
        let shell = SpinningShell::new(Ssh2Shell, &app.output);
        let prompter = DialoguerPrompter::new(app.non_interactive);
        let remote = RemoteExecutor::new(&config, &shell, &prompter, key);
        let git = GitCli::default();
        let reporter = TerminalReporter::new(&app.output);

        let ctx = CommandContext {
            invocation: &invocation,
            config: &config,
            hooks: &hooks,
            remote: &remote,
            git: &git,
            fs: &fs,
            prompter: &prompter,
            reporter: &reporter,
            registry: &registry,
            home,
            json: app.is_json(),
        };

        let report = Dispatcher::new(&registry).dispatch(&ctx).await?;
        tracing::debug!(verb = %report.verb, states = ?report.states, "dispatch finished");
        match report.aborted {
            None => Ok(ExitCode::SUCCESS),
            Some(AbortReason::HelpRequested) => {
                print!("{}", help::usage_text(&spec));
                Ok(ExitCode::SUCCESS)
            }
            Some(AbortReason::Invalid(DispatchError::Validation { reason, .. })) => {
                app.output.error(&reason);
                eprint!("\n{}", help::usage_text(&spec));
                Ok(ExitCode::FAILURE)
            }
            Some(AbortReason::Invalid(err)) => Err(err.into()),
        }
    }
}
