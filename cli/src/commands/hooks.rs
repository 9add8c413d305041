//! `deckhand hooks for <environment>`: show the rendered hook plan.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::application::{Command, CommandContext, CommandSpec};
use crate::domain::hooks::{display_key, render_command};
use crate::domain::{Invocation, render_commands};
use crate::output::json;

pub const SPEC: CommandSpec = CommandSpec {
    verb: "hooks",
    description: "Lists the pre and post hooks for an environment as they will be executed.",
    usage: "hooks for <environment>",
    examples: &["deckhand hooks for staging", "deckhand --json hooks for production"],
    required_args: &[],
    requires_environment: true,
    performs_hooks: false,
    module: None,
    factory,
};

fn factory(_: &Invocation) -> Box<dyn Command> {
    Box::new(Hooks)
}

struct Hooks;

#[async_trait]
impl Command for Hooks {
    async fn perform(&self, ctx: &CommandContext<'_>) -> Result<()> {
        if ctx.json {
            let rendered = render_commands(ctx.hooks.hooks());
            println!("{}", json::format_hooks(&rendered)?);
            return Ok(());
        }

        let environment = ctx
            .config
            .environment
            .as_deref()
            .context("no environment resolved")?;
        if ctx.hooks.is_empty() {
            ctx.reporter.step(&format!("No hooks for {environment}."));
            return Ok(());
        }
        for hook in ctx.hooks.hooks() {
            println!(
                "{:<4} {}: {}",
                hook.phase.to_string(),
                display_key(hook),
                render_command(hook)
            );
        }
        Ok(())
    }
}
