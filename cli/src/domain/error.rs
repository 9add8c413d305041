//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while resolving the deployment configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Could not find any configuration for '{environment}'.")]
    NotFound { environment: String },

    #[error("No configuration file at {path}. Create one before deploying to '{environment}'.")]
    SourceMissing { path: String, environment: String },

    #[error("Invalid environment name {0}: environments must be plain identifiers (e.g. staging).")]
    InvalidEnvironment(String),

    #[error("Invalid port '{0}': expected a number between 1 and 65535.")]
    InvalidPort(String),

    #[error("Malformed configuration: {0}")]
    Parse(String),

    #[error("Configuration for '{environment}' does not set '{field}'.")]
    MissingField {
        environment: String,
        field: &'static str,
    },
}

// ── Hook errors ───────────────────────────────────────────────────────────────

/// Errors raised while evaluating a hooks source.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("Hook entry #{index} in perform_on({environments}) must name exactly one of 'pre' or 'post'.")]
    AmbiguousPhase { index: usize, environments: String },

    #[error("Malformed hooks source: {0}")]
    Parse(String),
}

// ── Dispatch errors ───────────────────────────────────────────────────────────

/// Errors raised while resolving or validating a command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Command <{0}> not found.")]
    CommandNotFound(String),

    #[error("{reason}\n\nUsage: {usage}")]
    Validation { reason: String, usage: String },
}

// ── Transport errors ──────────────────────────────────────────────────────────

/// Errors raised by a single remote execution. Never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Cannot connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("SSH handshake with {host} failed: {reason}")]
    Handshake { host: String, reason: String },

    #[error("Authentication as '{user}' on {host} failed.")]
    Authentication { user: String, host: String },

    #[error("Remote command on {host} failed: {reason}")]
    Channel { host: String, reason: String },
}
