//! `HookRegistry`: builds the [`HookSet`] for one environment from the
//! project hooks source and the optional per-module fragments.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::LocalFs;
use crate::application::project::ProjectPaths;
use crate::domain::HookSet;
use crate::domain::hooks::evaluate;

pub struct HookRegistry<'a, F: LocalFs> {
    fs: &'a F,
    environment: String,
    set: HookSet,
}

impl<'a, F: LocalFs> HookRegistry<'a, F> {
    #[must_use]
    pub fn new(fs: &'a F, environment: &str) -> Self {
        Self {
            fs,
            environment: environment.to_string(),
            set: HookSet::new(),
        }
    }

    /// Evaluate the hooks source at `path`, appending matching hooks.
    ///
    /// A missing source is not an error: a warning is logged and the file is
    /// not read.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn parse(mut self, path: &Path) -> Result<Self> {
        if !self.fs.exists(path) {
            tracing::warn!(path = %path.display(), "could not locate the hooks file");
            return Ok(self);
        }
        self.evaluate_file(path)?;
        Ok(self)
    }

    /// Append hooks from each module's fragment, in the given module order.
    ///
    /// Modules without a fragment contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a fragment exists but cannot be read or parsed.
    pub fn merge_modules(mut self, paths: &ProjectPaths, modules: &[String]) -> Result<Self> {
        for module in modules {
            let fragment = paths.module_hooks_file(module);
            if self.fs.exists(&fragment) {
                tracing::debug!(%module, path = %fragment.display(), "merging module hooks");
                self.evaluate_file(&fragment)?;
            }
        }
        Ok(self)
    }

    #[must_use]
    pub fn into_set(self) -> HookSet {
        self.set
    }

    fn evaluate_file(&mut self, path: &Path) -> Result<()> {
        let source = self.fs.read_to_string(path)?;
        evaluate(&source, &self.environment, &mut self.set)
            .with_context(|| format!("cannot load {}", path.display()))
    }
}
