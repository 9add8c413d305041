//! Version command

use anyhow::Result;
use async_trait::async_trait;

use crate::application::{Command, CommandContext, CommandSpec};
use crate::domain::Invocation;

pub const SPEC: CommandSpec = CommandSpec {
    verb: "version",
    description: "Displays the installed version.",
    usage: "version",
    examples: &["deckhand version"],
    required_args: &[],
    requires_environment: false,
    performs_hooks: false,
    module: None,
    factory,
};

fn factory(_: &Invocation) -> Box<dyn Command> {
    Box::new(Version)
}

struct Version;

#[async_trait]
impl Command for Version {
    async fn perform(&self, ctx: &CommandContext<'_>) -> Result<()> {
        let version = env!("CARGO_PKG_VERSION");

        if ctx.json {
            println!(r#"{{"version":"{version}"}}"#);
        } else {
            println!("deckhand {version}");
        }
        Ok(())
    }
}
