//! `GitCli`: `LocalGit` backed by the `git` executable.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::application::ports::{CommandRunner, LocalGit};
use crate::infra::command_runner::{PUSH_TIMEOUT, TokioCommandRunner};

/// Runs `git` in the current working directory.
#[derive(Default)]
pub struct GitCli {
    runner: TokioCommandRunner,
}

impl GitCli {
    #[must_use]
    pub fn new(runner: TokioCommandRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl LocalGit for GitCli {
    async fn has_remote(&self, name: &str) -> Result<bool> {
        let out = self
            .runner
            .run("git", &["remote"])
            .await
            .context("listing git remotes")?;
        if !out.status.success() {
            bail!(
                "git remote failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&out.stdout)
            .lines()
            .any(|line| line.trim() == name))
    }

    async fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        let out = self
            .runner
            .run("git", &["remote", "add", name, url])
            .await
            .with_context(|| format!("adding git remote {name}"))?;
        if !out.status.success() {
            bail!(
                "git remote add {name} failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(())
    }

    async fn push(&self, remote: &str, source: &str) -> Result<()> {
        let refspec = format!("{source}:refs/heads/master");
        let out = self
            .runner
            .run_with_timeout("git", &["push", remote, &refspec, "--force"], PUSH_TIMEOUT)
            .await
            .with_context(|| format!("pushing {source} to {remote}"))?;
        if !out.status.success() {
            bail!(
                "git push to {remote} failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(())
    }
}
