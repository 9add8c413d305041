//! Lifecycle hooks: the `perform_on`/`pre`/`post`/`run` collector, the
//! ordered [`HookSet`], and rendering of hooks into remote command strings.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::domain::error::HookError;

static SEMICOLON_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r";{2,}").expect("valid regex")
});

// ── Hook records ─────────────────────────────────────────────────────────────

/// When a hook runs relative to the command's own action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Pre,
    Post,
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pre => f.write_str("pre"),
            Self::Post => f.write_str("post"),
        }
    }
}

/// A named, ordered list of shell commands. Names are not unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    pub phase: HookPhase,
    pub name: String,
    pub commands: Vec<String>,
    /// Zero-based position in the overall [`HookSet`].
    pub position: usize,
}

/// All hooks matching one environment, in declaration order: primary source
/// first, then module fragments in module order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookSet {
    hooks: Vec<Hook>,
}

impl HookSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    #[must_use]
    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    /// Pre hooks in HookSet order.
    #[must_use]
    pub fn pre_hooks(&self) -> Vec<&Hook> {
        self.phase(HookPhase::Pre)
    }

    /// Post hooks in HookSet order.
    #[must_use]
    pub fn post_hooks(&self) -> Vec<&Hook> {
        self.phase(HookPhase::Post)
    }

    #[must_use]
    pub fn phase(&self, phase: HookPhase) -> Vec<&Hook> {
        self.hooks.iter().filter(|h| h.phase == phase).collect()
    }

    fn push(&mut self, phase: HookPhase, name: String, commands: Vec<String>) {
        let position = self.hooks.len();
        self.hooks.push(Hook {
            phase,
            name,
            commands,
            position,
        });
    }
}

// ── Collector ────────────────────────────────────────────────────────────────

/// Typed builder mirroring the hooks grammar.
///
/// `run` appends to an accumulator that every `pre`/`post` registration
/// resets before evaluating its body, so commands never leak between hooks.
pub struct HookCollector<'a> {
    environment: &'a str,
    set: &'a mut HookSet,
    commands_to_run: Vec<String>,
}

impl<'a> HookCollector<'a> {
    /// Collect hooks for `environment`, appending to `set`.
    pub fn new(environment: &'a str, set: &'a mut HookSet) -> Self {
        Self {
            environment,
            set,
            commands_to_run: Vec::new(),
        }
    }

    /// Evaluate `block` only if `environments` names the active environment.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `block`.
    pub fn perform_on<E>(
        &mut self,
        environments: &[String],
        block: impl FnOnce(&mut Self) -> Result<(), E>,
    ) -> Result<(), E> {
        if environments.iter().any(|env| env == self.environment) {
            block(self)?;
        }
        Ok(())
    }

    /// Register a pre hook whose commands are the `run` calls made by `body`.
    pub fn pre(&mut self, name: &str, body: impl FnOnce(&mut Self)) {
        self.register(HookPhase::Pre, name, body);
    }

    /// Register a post hook whose commands are the `run` calls made by `body`.
    pub fn post(&mut self, name: &str, body: impl FnOnce(&mut Self)) {
        self.register(HookPhase::Post, name, body);
    }

    /// Append a command to the hook being registered.
    pub fn run(&mut self, command: &str) {
        self.commands_to_run.push(command.to_string());
    }

    fn register(&mut self, phase: HookPhase, name: &str, body: impl FnOnce(&mut Self)) {
        self.commands_to_run = Vec::new();
        body(self);
        let commands = std::mem::take(&mut self.commands_to_run);
        self.set.push(phase, name.to_string(), commands);
    }
}

// ── Source schema ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PerformOnDecl {
    perform_on: Vec<String>,
    #[serde(default)]
    hooks: Vec<HookDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HookDecl {
    pre: Option<String>,
    post: Option<String>,
    #[serde(default)]
    run: Vec<String>,
}

/// Evaluate a hooks source for `environment`, appending matching hooks to `set`.
///
/// # Errors
///
/// Returns [`HookError::Parse`] on malformed YAML and
/// [`HookError::AmbiguousPhase`] when an entry names both or neither phase.
pub fn evaluate(source: &str, environment: &str, set: &mut HookSet) -> Result<(), HookError> {
    if source.trim().is_empty() {
        return Ok(());
    }
    let blocks: Option<Vec<PerformOnDecl>> =
        serde_yaml::from_str(source).map_err(|e| HookError::Parse(e.to_string()))?;

    let mut collector = HookCollector::new(environment, set);
    for block in blocks.unwrap_or_default() {
        collector.perform_on(&block.perform_on, |c| {
            for (index, hook) in block.hooks.iter().enumerate() {
                let (phase, name) = match (&hook.pre, &hook.post) {
                    (Some(name), None) => (HookPhase::Pre, name),
                    (None, Some(name)) => (HookPhase::Post, name),
                    _ => {
                        return Err(HookError::AmbiguousPhase {
                            index,
                            environments: block.perform_on.join(", "),
                        });
                    }
                };
                match phase {
                    HookPhase::Pre => c.pre(name, |c| hook.run.iter().for_each(|cmd| c.run(cmd))),
                    HookPhase::Post => {
                        c.post(name, |c| hook.run.iter().for_each(|cmd| c.run(cmd)));
                    }
                }
            }
            Ok(())
        })?;
    }
    Ok(())
}

/// Parse a single hooks source into a fresh [`HookSet`].
///
/// # Errors
///
/// See [`evaluate`].
pub fn parse(source: &str, environment: &str) -> Result<HookSet, HookError> {
    let mut set = HookSet::new();
    evaluate(source, environment, &mut set)?;
    Ok(set)
}

// ── Rendering ────────────────────────────────────────────────────────────────

/// Ordered mapping from `"<index>) <name>"` to the joined command string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedHooks {
    entries: Vec<(String, String)>,
}

impl RenderedHooks {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a command string by display key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<(String, String)> {
        self.entries
    }
}

/// Render hooks to `"<position>) <name>" -> "cmd1;cmd2;"`.
///
/// The key index is the hook's position in the overall [`HookSet`], so keys
/// stay unique even when names repeat.
pub fn render_commands<'h>(hooks: impl IntoIterator<Item = &'h Hook>) -> RenderedHooks {
    let entries = hooks
        .into_iter()
        .map(|hook| (display_key(hook), render_command(hook)))
        .collect();
    RenderedHooks { entries }
}

/// `"<position>) <name>"`.
#[must_use]
pub fn display_key(hook: &Hook) -> String {
    format!("{}) {}", hook.position, hook.name)
}

/// Join a hook's commands with `;`, collapsing runs of `;`.
#[must_use]
pub fn render_command(hook: &Hook) -> String {
    let joined: String = hook.commands.iter().map(|c| format!("{c};")).collect();
    SEMICOLON_RUN_RE.replace_all(&joined, ";").into_owned()
}

// ── Unit tests ───────────────────────────────────────────────────────────────
