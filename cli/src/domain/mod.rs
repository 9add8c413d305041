//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod account;
pub mod config;
pub mod error;
pub mod hooks;
pub mod invocation;
pub mod remote;
pub mod ssh;

pub use config::{Configuration, Credentials, resolve};
pub use error::{ConfigError, DispatchError, HookError, TransportError};
pub use hooks::{Hook, HookPhase, HookSet, RenderedHooks, render_commands};
pub use invocation::Invocation;
pub use remote::{Identity, KeyPair, RemoteSession};
