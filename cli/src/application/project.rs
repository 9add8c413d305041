//! Project layout and configuration loading.
//!
//! A project keeps its deployment sources under one directory
//! (`.deckhand/` by default):
//!
//! ```text
//! .deckhand/
//!   config.yml
//!   hooks.yml
//!   modules/<module>/hooks.yml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::LocalFs;
use crate::domain::{ConfigError, Configuration, resolve};

/// Default project directory, relative to the working directory.
pub const DEFAULT_PROJECT_DIR: &str = ".deckhand";

/// Locations of the declarative sources for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.yml")
    }

    #[must_use]
    pub fn hooks_file(&self) -> PathBuf {
        self.root.join("hooks.yml")
    }

    #[must_use]
    pub fn module_hooks_file(&self, module: &str) -> PathBuf {
        self.root.join("modules").join(module).join("hooks.yml")
    }
}

/// Read and resolve the configuration source for `environment`.
///
/// Without an environment, a missing file yields an unresolved, empty
/// configuration so that `help` and `version` work outside a project.
///
/// # Errors
///
/// Returns [`ConfigError::SourceMissing`] when an environment is requested but
/// no configuration file exists, any resolution error, or a read failure.
pub fn load_configuration(
    fs: &impl LocalFs,
    paths: &ProjectPaths,
    environment: Option<&str>,
) -> Result<Configuration> {
    let path = paths.config_file();
    if !fs.exists(&path) {
        return match environment {
            Some(env) => Err(ConfigError::SourceMissing {
                path: path.display().to_string(),
                environment: env.to_string(),
            }
            .into()),
            None => resolve("", None).map_err(Into::into),
        };
    }
    let source = fs.read_to_string(&path)?;
    let config = resolve(&source, environment)
        .with_context(|| format!("cannot load {}", path.display()))?;
    tracing::debug!(
        environment = ?config.environment,
        application = ?config.application,
        modules = ?config.modules,
        forced = config.force_parse,
        "configuration resolved"
    );
    Ok(config)
}
