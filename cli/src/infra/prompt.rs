//! `DialoguerPrompter`: terminal implementation of the `Prompter` port.

use anyhow::{Context, Result};

use crate::application::ports::Prompter;

pub struct DialoguerPrompter {
    /// Answer every confirmation with yes (`--yes`, `CI`).
    assume_yes: bool,
}

impl DialoguerPrompter {
    #[must_use]
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompter for DialoguerPrompter {
    fn password(&self, prompt: &str) -> Result<String> {
        dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .context("reading password")
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .context("reading confirmation")
    }
}
