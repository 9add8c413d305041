//! `RemoteExecutor`: runs commands on the target host under an identity.
//!
//! Builds a fresh [`RemoteSession`] per call from the resolved configuration,
//! wraps the command for the identity, and hands it to the [`RemoteShell`]
//! port. The root password is asked for at most once per executor.

use std::sync::{Mutex, PoisonError};

use anyhow::Result;

use crate::application::ports::{Prompter, RemoteShell};
use crate::domain::{Configuration, Identity, KeyPair, RemoteSession};

pub struct RemoteExecutor<'a> {
    config: &'a Configuration,
    shell: &'a dyn RemoteShell,
    prompter: &'a dyn Prompter,
    key: Option<KeyPair>,
    root_password: Mutex<Option<String>>,
}

impl<'a> RemoteExecutor<'a> {
    #[must_use]
    pub fn new(
        config: &'a Configuration,
        shell: &'a dyn RemoteShell,
        prompter: &'a dyn Prompter,
        key: Option<KeyPair>,
    ) -> Self {
        Self {
            config,
            shell,
            prompter,
            key,
            root_password: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Configuration {
        self.config
    }

    /// Run `command` under `identity` and return its stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be built (missing host/user),
    /// the root password prompt fails, or the transport fails.
    pub async fn execute(&self, command: &str, identity: Identity) -> Result<String> {
        let root_password = match identity {
            Identity::AsRootDirect => Some(self.root_password()?),
            Identity::AsUser | Identity::AsRootViaSudo => None,
        };
        let session =
            RemoteSession::new(self.config, identity, root_password.as_deref(), self.key.clone())?;
        let wire = session.wire_command(command);
        tracing::debug!(
            host = %session.host,
            port = session.port,
            login = %session.login,
            ?identity,
            command = %wire,
            "executing remote command"
        );
        Ok(self.shell.run(&session, &wire).await?)
    }

    /// Run `command` as the application user.
    ///
    /// # Errors
    ///
    /// See [`RemoteExecutor::execute`].
    pub async fn execute_as_user(&self, command: &str) -> Result<String> {
        self.execute(command, Identity::AsUser).await
    }

    /// Run `command` as root: through sudo when configured, else by logging in as root.
    ///
    /// # Errors
    ///
    /// See [`RemoteExecutor::execute`].
    pub async fn execute_as_root(&self, command: &str) -> Result<String> {
        self.execute(command, self.root_identity()).await
    }

    #[must_use]
    pub fn root_identity(&self) -> Identity {
        Identity::root(self.config.credentials.use_sudo)
    }

    /// Ask for the root password up front when root calls will log in as root.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt fails.
    pub fn ensure_root_access(&self) -> Result<()> {
        if self.root_identity() == Identity::AsRootDirect {
            self.root_password()?;
        }
        Ok(())
    }

    /// The root password, prompting on first use and caching afterwards.
    fn root_password(&self) -> Result<String> {
        let mut cached = self
            .root_password
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(password) = cached.as_ref() {
            return Ok(password.clone());
        }
        let host = self.config.credentials.ip.as_deref().unwrap_or("the remote host");
        let password = self
            .prompter
            .password(&format!("Password for root@{host}"))?;
        *cached = Some(password.clone());
        Ok(password)
    }
}
