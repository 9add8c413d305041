//! Remote-execution identity model.
//!
//! An [`Identity`] decides who logs in and how the command is wrapped; a
//! [`RemoteSession`] is the per-call bundle of host, login and credentials.
//! Sessions are never cached or pooled.

use std::path::PathBuf;

use crate::domain::config::Configuration;
use crate::domain::error::ConfigError;

/// Login name used by [`Identity::AsRootDirect`].
pub const ROOT_USER: &str = "root";

/// Identity mode of a single remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// Log in as the application user; command unmodified.
    AsUser,
    /// Log in as `root`; command unmodified.
    AsRootDirect,
    /// Log in as the application user; command run through `sudo su -`.
    AsRootViaSudo,
}

impl Identity {
    /// Root identity for the configuration's sudo setting.
    #[must_use]
    pub fn root(use_sudo: bool) -> Self {
        if use_sudo {
            Self::AsRootViaSudo
        } else {
            Self::AsRootDirect
        }
    }

    /// Command as sent over the wire.
    ///
    /// Embedded single quotes are not escaped; callers own their quoting.
    #[must_use]
    pub fn wrap(self, command: &str) -> String {
        match self {
            Self::AsUser | Self::AsRootDirect => command.to_string(),
            Self::AsRootViaSudo => format!("sudo su - -c '{command}'"),
        }
    }
}

/// Local key pair offered during authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub public: PathBuf,
    pub private: PathBuf,
}

/// Transient context for one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSession {
    pub identity: Identity,
    pub host: String,
    pub port: u16,
    pub login: String,
    pub password: Option<String>,
    pub passphrase: Option<String>,
    pub key: Option<KeyPair>,
}

impl RemoteSession {
    /// Build the session for `identity` from the resolved configuration.
    ///
    /// `root_password` is only used for [`Identity::AsRootDirect`], where an
    /// absent password becomes the empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if the host, or the user for a user-level login, is unset.
    pub fn new(
        config: &Configuration,
        identity: Identity,
        root_password: Option<&str>,
        key: Option<KeyPair>,
    ) -> Result<Self, ConfigError> {
        let creds = &config.credentials;
        let (login, password) = match identity {
            Identity::AsRootDirect => (
                ROOT_USER.to_string(),
                Some(root_password.unwrap_or_default().to_string()),
            ),
            Identity::AsUser | Identity::AsRootViaSudo => {
                (config.user()?.to_string(), creds.password.clone())
            }
        };
        Ok(Self {
            identity,
            host: config.host()?.to_string(),
            port: creds.port,
            login,
            password,
            passphrase: creds.passphrase.clone(),
            key,
        })
    }

    /// The command as it will be sent for this session's identity.
    #[must_use]
    pub fn wire_command(&self, command: &str) -> String {
        self.identity.wrap(command)
    }
}
