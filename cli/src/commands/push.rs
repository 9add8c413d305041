//! `branch`, `tag` and `ref`: push a local revision to an environment.
//!
//! The environment's git remote is named after the environment and points at
//! the application directory on the host. Pushes always land on the remote's
//! `master` branch and are forced.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::application::{Command, CommandContext, CommandSpec};
use crate::domain::{ConfigError, Configuration, Invocation};

pub const BRANCH: CommandSpec = CommandSpec {
    verb: "branch",
    description: "Pushes the specified branch to a remote environment.",
    usage: "branch <branch> to <environment>",
    examples: &[
        "deckhand branch develop to staging",
        "deckhand branch master to production",
    ],
    required_args: &["branch"],
    requires_environment: true,
    performs_hooks: true,
    module: None,
    factory: branch,
};

pub const TAG: CommandSpec = CommandSpec {
    verb: "tag",
    description: "Pushes the specified tag to a remote environment.",
    usage: "tag <tag> to <environment>",
    examples: &["deckhand tag 1.4.2 to staging"],
    required_args: &["tag"],
    requires_environment: true,
    performs_hooks: true,
    module: None,
    factory: tag,
};

pub const REF: CommandSpec = CommandSpec {
    verb: "ref",
    description: "Pushes the specified ref to a remote environment.",
    usage: "ref <ref> to <environment>",
    examples: &["deckhand ref 2dbec02aa0b8604b8512e2fcbb8aac582c7f6a73 to production"],
    required_args: &["ref"],
    requires_environment: true,
    performs_hooks: true,
    module: None,
    factory: reference,
};

/// What is being pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    Branch,
    Tag,
    Ref,
}

impl PushKind {
    /// The git source of the refspec for `name`.
    #[must_use]
    pub fn source(self, name: &str) -> String {
        match self {
            Self::Branch | Self::Ref => name.to_string(),
            Self::Tag => format!("{name}~0"),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::Tag => "tag",
            Self::Ref => "ref",
        }
    }
}

fn branch(inv: &Invocation) -> Box<dyn Command> {
    Box::new(Push::new(PushKind::Branch, inv))
}

fn tag(inv: &Invocation) -> Box<dyn Command> {
    Box::new(Push::new(PushKind::Tag, inv))
}

fn reference(inv: &Invocation) -> Box<dyn Command> {
    Box::new(Push::new(PushKind::Ref, inv))
}

/// `ssh://<user>@<host>:<port>/<app_dir>`.
///
/// # Errors
///
/// Returns an error if user, host, path, application or environment is unset.
pub fn remote_url(config: &Configuration) -> Result<String, ConfigError> {
    let app_dir = config.app_dir()?;
    Ok(format!(
        "ssh://{}@{}:{}/{}",
        config.user()?,
        config.host()?,
        config.credentials.port,
        app_dir.trim_start_matches('/')
    ))
}

struct Push {
    kind: PushKind,
    name: String,
}

impl Push {
    fn new(kind: PushKind, inv: &Invocation) -> Self {
        Self {
            kind,
            name: inv.arg(0).unwrap_or_default().to_string(),
        }
    }
}

#[async_trait]
impl Command for Push {
    async fn perform(&self, ctx: &CommandContext<'_>) -> Result<()> {
        let environment = ctx
            .config
            .environment
            .as_deref()
            .context("no environment resolved")?;
        let url = remote_url(ctx.config)?;

        if !ctx.git.has_remote(environment).await? {
            ctx.git.add_remote(environment, &url).await?;
            ctx.reporter
                .step(&format!("Added git remote {environment} ({url})"));
        }

        ctx.reporter.step(&format!(
            "Pushing {} {} to the {environment} environment.",
            self.kind.label(),
            self.name
        ));
        ctx.git
            .push(environment, &self.kind.source(&self.name))
            .await?;
        ctx.reporter.success(&format!(
            "Pushed {} {} to {environment}.",
            self.kind.label(),
            self.name
        ));
        Ok(())
    }
}
