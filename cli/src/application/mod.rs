//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`: never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod dispatcher;
pub mod hook_registry;
pub mod ports;
pub mod project;
pub mod remote;

pub use dispatcher::{
    AbortReason, Command, CommandContext, CommandRegistry, CommandSpec, DispatchReport,
    Dispatcher, LifecycleState,
};
pub use hook_registry::HookRegistry;
pub use ports::{CommandRunner, LocalFs, LocalGit, ProgressReporter, Prompter, RemoteShell};
pub use project::{DEFAULT_PROJECT_DIR, ProjectPaths, load_configuration};
pub use remote::RemoteExecutor;
