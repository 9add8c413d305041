//! JSON output helpers for `--json` code paths.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::RenderedHooks;

/// One rendered hook, as emitted by `hooks --json`.
#[derive(Debug, Serialize)]
struct HookEntry<'a> {
    key: &'a str,
    command: &'a str,
}

/// Format the rendered hook mapping as an ordered JSON array of
/// `{"key", "command"}` objects.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_hooks(rendered: &RenderedHooks) -> Result<String> {
    let entries: Vec<HookEntry<'_>> = rendered
        .iter()
        .map(|(key, command)| HookEntry { key, command })
        .collect();
    serde_json::to_string_pretty(&entries).context("JSON serialization failed")
}

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
