//! `passenger` module: Phusion Passenger controls.

use anyhow::Result;
use async_trait::async_trait;

use crate::application::{Command, CommandContext, CommandSpec};
use crate::domain::Invocation;

/// Module identifier that enables this verb.
pub const MODULE: &str = "passenger";

pub const SPEC: CommandSpec = CommandSpec {
    verb: "passenger",
    description: "Invoke various passenger commands on the remote server.",
    usage: "passenger <command> for <environment>",
    examples: &["deckhand passenger restart for staging"],
    required_args: &["command"],
    requires_environment: true,
    performs_hooks: false,
    module: Some(MODULE),
    factory,
};

const COMMANDS: &[&str] = &["restart"];

fn factory(inv: &Invocation) -> Box<dyn Command> {
    Box::new(Passenger {
        command: inv.arg(0).unwrap_or_default().to_string(),
    })
}

/// `cd <app_dir>; mkdir -p tmp; touch tmp/restart.txt`.
#[must_use]
pub fn restart_command(app_dir: &str) -> String {
    format!("cd {app_dir}; mkdir -p tmp; touch tmp/restart.txt")
}

struct Passenger {
    command: String,
}

#[async_trait]
impl Command for Passenger {
    fn validate(&self, _invocation: &Invocation) -> Result<(), String> {
        if COMMANDS.contains(&self.command.as_str()) {
            Ok(())
        } else {
            Err(format!("Unknown passenger command <{}>.", self.command))
        }
    }

    async fn perform(&self, ctx: &CommandContext<'_>) -> Result<()> {
        let app_dir = ctx.config.app_dir()?;
        ctx.reporter.step("Restarting Passenger");
        ctx.remote.execute_as_user(&restart_command(&app_dir)).await?;
        ctx.reporter.success("Passenger restarted.");
        Ok(())
    }
}
