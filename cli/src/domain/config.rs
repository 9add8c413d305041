//! Deployment configuration: schema, resolution, and derived remote paths.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

/// SSH port used when no configuration block sets one.
pub const DEFAULT_PORT: u16 = 22;

/// Environment identifiers are plain symbols: `staging`, `production_eu`.
pub static ENVIRONMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern: cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex")
});

// ── Resolved configuration ───────────────────────────────────────────────────

/// Connection credentials for the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
    pub passphrase: Option<String>,
    /// File name of the public key under `~/.ssh`.
    pub ssh_key: Option<String>,
    pub ip: Option<String>,
    pub port: u16,
    /// Run root commands as `sudo su - -c '<command>'` instead of logging in as root.
    pub use_sudo: bool,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            user: None,
            password: None,
            passphrase: None,
            ssh_key: None,
            ip: None,
            port: DEFAULT_PORT,
            use_sudo: false,
        }
    }
}

/// One resolved deployment target.
///
/// Created once per invocation by [`resolve`]. When resolved for a concrete
/// environment, `found` implies `application` and `environment` are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub environment: Option<String>,
    pub application: Option<String>,
    pub found: bool,
    pub credentials: Credentials,
    /// Deploy path on the remote host; also the application user's home.
    pub path: Option<String>,
    /// Module identifiers in declaration order.
    pub modules: Vec<String>,
    /// Opaque environment tags (operating system, web server, framework, ...).
    pub metadata: BTreeMap<String, String>,
    pub force_parse: bool,
}

impl Configuration {
    /// Application name lower-cased with spaces replaced by `_`.
    #[must_use]
    pub fn sanitized_application(&self) -> Option<String> {
        self.application.as_deref().map(sanitize_application_name)
    }

    /// `<path>/<sanitized_application>.<environment>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path, application, or environment is unset.
    pub fn app_dir(&self) -> Result<String, ConfigError> {
        let path = self.require(self.path.as_deref(), "git.path")?;
        let app = self.require(self.application.as_deref(), "application")?;
        let env = self.require(self.environment.as_deref(), "environments")?;
        Ok(join_remote(
            path,
            &format!("{}.{env}", sanitize_application_name(app)),
        ))
    }

    /// The configured path without a trailing `/`.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is configured.
    pub fn home_dir(&self) -> Result<String, ConfigError> {
        let path = self.require(self.path.as_deref(), "git.path")?;
        Ok(trim_trailing_slash(path).to_string())
    }

    /// The application user.
    ///
    /// # Errors
    ///
    /// Returns an error if `authorize.user` is unset.
    pub fn user(&self) -> Result<&str, ConfigError> {
        self.require(self.credentials.user.as_deref(), "authorize.user")
    }

    /// The remote host.
    ///
    /// # Errors
    ///
    /// Returns an error if `authorize.ip` is unset.
    pub fn host(&self) -> Result<&str, ConfigError> {
        self.require(self.credentials.ip.as_deref(), "authorize.ip")
    }

    fn require<'a>(
        &self,
        value: Option<&'a str>,
        field: &'static str,
    ) -> Result<&'a str, ConfigError> {
        value.ok_or_else(|| ConfigError::MissingField {
            environment: self.environment.clone().unwrap_or_default(),
            field,
        })
    }
}

/// Lower-case the name and replace spaces with `_`.
#[must_use]
pub fn sanitize_application_name(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

/// Join a remote base path and a child without doubling `/`.
#[must_use]
pub fn join_remote(base: &str, child: &str) -> String {
    format!("{}/{child}", trim_trailing_slash(base))
}

fn trim_trailing_slash(path: &str) -> &str {
    path.trim_end_matches('/')
}

// ── Source schema ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BlockDecl {
    application: String,
    environments: OneOrMany,
    #[serde(default)]
    authorize: Option<AuthorizeDecl>,
    #[serde(default)]
    git: Option<GitDecl>,
    #[serde(default)]
    environment: BTreeMap<String, String>,
    #[serde(default)]
    modules: Vec<String>,
}

/// `environments: staging` or `environments: [staging, production]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<serde_yaml::Value>),
    One(serde_yaml::Value),
}

impl OneOrMany {
    fn values(&self) -> &[serde_yaml::Value] {
        match self {
            Self::Many(values) => values,
            Self::One(value) => std::slice::from_ref(value),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AuthorizeDecl {
    user: Option<String>,
    password: Option<String>,
    passphrase: Option<String>,
    ssh_key: Option<String>,
    ip: Option<String>,
    port: Option<PortDecl>,
    use_sudo: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortDecl {
    Number(u64),
    Text(String),
}

impl PortDecl {
    fn to_port(&self) -> Result<u16, ConfigError> {
        let raw = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        };
        match raw.parse::<u16>() {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(ConfigError::InvalidPort(raw)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GitDecl {
    path: Option<String>,
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Resolve the configuration source for `target`.
///
/// With `target = None` every block is evaluated (forced parse) and the
/// module list is deduplicated; this mode never fails for lack of a match.
///
/// # Errors
///
/// - [`ConfigError::Parse`] / [`ConfigError::InvalidPort`] on malformed input
/// - [`ConfigError::InvalidEnvironment`] if any block declares a non-identifier
/// - [`ConfigError::NotFound`] if `target` is set and no block matches it
pub fn resolve(source: &str, target: Option<&str>) -> Result<Configuration, ConfigError> {
    let blocks = parse_blocks(source)?;
    let mut resolver = Resolver::new(target);
    resolver.evaluate(&blocks)?;

    if !resolver.config.found && target.is_none() {
        resolver.config.force_parse = true;
        resolver.evaluate(&blocks)?;
        dedup_preserving_order(&mut resolver.config.modules);
    }

    if let (false, Some(environment)) = (resolver.config.found, target) {
        return Err(ConfigError::NotFound {
            environment: environment.to_string(),
        });
    }

    Ok(resolver.finish())
}

fn parse_blocks(source: &str) -> Result<Vec<BlockDecl>, ConfigError> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }
    let blocks: Option<Vec<BlockDecl>> =
        serde_yaml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(blocks.unwrap_or_default())
}

fn environment_names(block: &BlockDecl) -> Result<Vec<&str>, ConfigError> {
    block
        .environments
        .values()
        .iter()
        .map(|value| match value {
            serde_yaml::Value::String(name) if ENVIRONMENT_RE.is_match(name) => Ok(name.as_str()),
            other => Err(ConfigError::InvalidEnvironment(describe_value(other))),
        })
        .collect()
}

fn describe_value(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| format!("'{}'", s.trim_end()))
        .unwrap_or_else(|_| "<unprintable>".to_string())
}

struct Resolver<'a> {
    target: Option<&'a str>,
    config: Configuration,
    port: Option<u16>,
}

impl<'a> Resolver<'a> {
    fn new(target: Option<&'a str>) -> Self {
        Self {
            target,
            config: Configuration {
                environment: target.map(str::to_string),
                ..Configuration::default()
            },
            port: None,
        }
    }

    fn evaluate(&mut self, blocks: &[BlockDecl]) -> Result<(), ConfigError> {
        for block in blocks {
            let names = environment_names(block)?;
            let matches = self.target.is_some_and(|t| names.contains(&t));
            if matches || self.config.force_parse {
                self.apply(block)?;
            }
        }
        Ok(())
    }

    // Last writer wins for scalars; modules accumulate.
    fn apply(&mut self, block: &BlockDecl) -> Result<(), ConfigError> {
        let config = &mut self.config;
        config.application = Some(block.application.clone());
        config.found = true;

        if let Some(auth) = &block.authorize {
            let creds = &mut config.credentials;
            overwrite(&mut creds.user, auth.user.as_ref());
            overwrite(&mut creds.password, auth.password.as_ref());
            overwrite(&mut creds.passphrase, auth.passphrase.as_ref());
            overwrite(&mut creds.ssh_key, auth.ssh_key.as_ref());
            overwrite(&mut creds.ip, auth.ip.as_ref());
            if let Some(use_sudo) = auth.use_sudo {
                creds.use_sudo = use_sudo;
            }
            if let Some(port) = &auth.port {
                self.port = Some(port.to_port()?);
            }
        }
        if let Some(git) = &block.git {
            overwrite(&mut config.path, git.path.as_ref());
        }
        for (key, value) in &block.environment {
            config.metadata.insert(key.clone(), value.clone());
        }
        config.modules.extend(block.modules.iter().cloned());
        Ok(())
    }

    fn finish(mut self) -> Configuration {
        self.config.credentials.port = self.port.unwrap_or(DEFAULT_PORT);
        self.config
    }
}

fn overwrite(slot: &mut Option<String>, value: Option<&String>) {
    if let Some(value) = value {
        *slot = Some(value.clone());
    }
}

fn dedup_preserving_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

// ── Unit tests ───────────────────────────────────────────────────────────────
