//! `deckhand help [verb]`: list commands or show a verb's usage.

use anyhow::Result;
use async_trait::async_trait;

use crate::application::{Command, CommandContext, CommandRegistry, CommandSpec};
use crate::domain::Invocation;

pub const SPEC: CommandSpec = CommandSpec {
    verb: "help",
    description: "Lists the available commands, or shows how to use one.",
    usage: "help [command]",
    examples: &["deckhand help", "deckhand help branch"],
    required_args: &[],
    requires_environment: false,
    performs_hooks: false,
    module: None,
    factory,
};

fn factory(inv: &Invocation) -> Box<dyn Command> {
    Box::new(Help {
        verb: inv.arg(0).map(str::to_string),
    })
}

/// Usage block for one verb.
#[must_use]
pub fn usage_text(spec: &CommandSpec) -> String {
    let mut out = format!("{}\n\nUsage:\n  deckhand {}\n", spec.description, spec.usage);
    if !spec.examples.is_empty() {
        out.push_str("\nExamples:\n");
        for example in spec.examples {
            out.push_str("  ");
            out.push_str(example);
            out.push('\n');
        }
    }
    if let Some(module) = spec.module {
        out.push_str(&format!("\nProvided by module '{module}'.\n"));
    }
    out
}

/// Overview of every registered verb.
#[must_use]
pub fn overview_text(registry: &CommandRegistry) -> String {
    let mut out = String::from(
        "Usage:\n  deckhand [OPTIONS] <command> [args...] (to|for|from|on|in) <environment>\n\nCommands:\n",
    );
    let width = registry.iter().map(|s| s.verb.len()).max().unwrap_or(0);
    for spec in registry.iter() {
        out.push_str(&format!("  {:<width$}  {}\n", spec.verb, spec.description));
    }
    out.push_str("\nRun 'deckhand help <command>' for details on a command.\n");
    out
}

struct Help {
    verb: Option<String>,
}

#[async_trait]
impl Command for Help {
    async fn perform(&self, ctx: &CommandContext<'_>) -> Result<()> {
        match self.verb.as_deref() {
            Some(verb) => print!("{}", usage_text(ctx.registry.get(verb)?)),
            None => print!("{}", overview_text(ctx.registry)),
        }
        Ok(())
    }
}
