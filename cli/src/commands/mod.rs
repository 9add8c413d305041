//! Command implementations
//!
//! Built-in verbs are always registered; module verbs only when the module
//! is named in the resolved configuration.

pub mod delete;
pub mod help;
pub mod hooks;
pub mod passenger;
pub mod push;
pub mod user;
pub mod version;

use crate::application::{CommandRegistry, CommandSpec};

/// Verbs available in every project.
pub const BUILTINS: &[CommandSpec] = &[
    push::BRANCH,
    push::TAG,
    push::REF,
    delete::SPEC,
    user::SPEC,
    hooks::SPEC,
    help::SPEC,
    version::SPEC,
];

/// Verbs contributed by `module`, if it is a known module.
#[must_use]
pub fn module_commands(module: &str) -> &'static [CommandSpec] {
    match module {
        passenger::MODULE => &[passenger::SPEC],
        _ => &[],
    }
}

/// Build the registry for a project using `modules`.
#[must_use]
pub fn registry(modules: &[String]) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for spec in BUILTINS {
        registry.register(*spec);
    }
    for module in modules {
        let specs = module_commands(module);
        if specs.is_empty() {
            tracing::debug!(%module, "module contributes no commands");
        }
        for spec in specs {
            registry.register(*spec);
        }
    }
    registry
}
