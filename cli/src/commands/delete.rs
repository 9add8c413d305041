//! `deckhand delete from <environment>`: remove the deployed application.

use anyhow::Result;
use async_trait::async_trait;

use crate::application::{Command, CommandContext, CommandSpec};
use crate::domain::Invocation;

pub const SPEC: CommandSpec = CommandSpec {
    verb: "delete",
    description: "Removes the application directory from a remote environment.",
    usage: "delete from <environment>",
    examples: &["deckhand delete from staging"],
    required_args: &[],
    requires_environment: true,
    performs_hooks: false,
    module: None,
    factory,
};

fn factory(_: &Invocation) -> Box<dyn Command> {
    Box::new(Delete)
}

struct Delete;

#[async_trait]
impl Command for Delete {
    async fn perform(&self, ctx: &CommandContext<'_>) -> Result<()> {
        let app_dir = ctx.config.app_dir()?;
        let host = ctx.config.host()?;

        ctx.reporter
            .warn(&format!("This will permanently remove {app_dir} from {host}."));
        if !ctx.prompter.confirm("Continue?", false)? {
            ctx.reporter.step("Cancelled.");
            return Ok(());
        }

        ctx.reporter.step(&format!("Removing {app_dir}"));
        ctx.remote
            .execute_as_user(&format!("rm -rf '{app_dir}'"))
            .await?;
        ctx.reporter.success(&format!("Removed {app_dir} from {host}."));
        Ok(())
    }
}
