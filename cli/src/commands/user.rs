//! `deckhand user <command> (to|for|from|on) <environment>`: manage the
//! application user on the remote host, install SSH keys, and print login
//! commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::application::{Command, CommandContext, CommandSpec};
use crate::domain::account::{
    COMMON_PACKAGES, GIT_PACKAGES, READ_SUDOERS, add_to_rvm_group_command,
    add_to_sudoers_command, add_user_command, bashrc_command, chown_home_command,
    gitconfig_command, in_sudoers, install_packages_command, remove_home_command,
    remove_user_command, rvm_check_command, rvm_found, user_exists, user_exists_command,
};
use crate::domain::ssh::{
    READ_ROOT_AUTHORIZED_KEYS, install_key_command, install_root_key_command, public_key_path,
    read_authorized_keys_command,
};
use crate::domain::{Identity, Invocation, remote::ROOT_USER};

pub const SPEC: CommandSpec = CommandSpec {
    verb: "user",
    description: "Manages the application user, its SSH keys, and login commands for an environment.",
    usage: "user <add|remove|reconfigure|install-ssh-key|install-root-ssh-key|login|login-root> (to|for|from|on) <environment>",
    examples: &[
        "deckhand user add to production                # Sets up the user on the remote server.",
        "deckhand user reconfigure for production       # Reconfigures the user without removing applications.",
        "deckhand user remove from production           # Removes the user and its applications.",
        "deckhand user install-ssh-key to staging       # Installs your ssh key for the user.",
        "deckhand user install-root-ssh-key to staging  # Installs your ssh key for root.",
        "$(deckhand user login to staging)              # Logs in as the user.",
        "$(deckhand user login-root to production)      # Logs in as root.",
    ],
    required_args: &["command"],
    requires_environment: true,
    performs_hooks: false,
    module: None,
    factory,
};

/// Subcommands of `user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Add,
    Remove,
    Reconfigure,
    InstallSshKey,
    InstallRootSshKey,
    Login,
    LoginRoot,
}

impl UserAction {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "reconfigure" => Some(Self::Reconfigure),
            "install-ssh-key" | "install_ssh_key" => Some(Self::InstallSshKey),
            "install-root-ssh-key" | "install_root_ssh_key" => Some(Self::InstallRootSshKey),
            "login" => Some(Self::Login),
            "login-root" | "login_root" => Some(Self::LoginRoot),
            _ => None,
        }
    }
}

fn factory(inv: &Invocation) -> Box<dyn Command> {
    let name = inv.arg(0).unwrap_or_default().to_string();
    Box::new(User {
        action: UserAction::parse(&name),
        name,
    })
}

struct User {
    name: String,
    action: Option<UserAction>,
}

#[async_trait]
impl Command for User {
    fn validate(&self, _invocation: &Invocation) -> Result<(), String> {
        match self.action {
            Some(_) => Ok(()),
            None => Err(format!("Unknown user command <{}>.", self.name)),
        }
    }

    fn requires_root(&self) -> bool {
        !matches!(
            self.action,
            None | Some(UserAction::Login | UserAction::LoginRoot)
        )
    }

    async fn perform(&self, ctx: &CommandContext<'_>) -> Result<()> {
        let config = ctx.config;
        match self.action {
            Some(UserAction::Login) => {
                println!(
                    "{}",
                    login_line(config.user()?, config.host()?, config.credentials.port)
                );
                Ok(())
            }
            Some(UserAction::LoginRoot) => {
                println!(
                    "{}",
                    login_line(ROOT_USER, config.host()?, config.credentials.port)
                );
                Ok(())
            }
            Some(UserAction::Add) => add_user(ctx).await,
            Some(UserAction::Remove) => remove_user(ctx).await,
            Some(UserAction::Reconfigure) => reconfigure_user(ctx).await,
            Some(UserAction::InstallSshKey) => {
                let (path, key) = local_public_key(ctx)?;
                install_user_key(ctx, ctx.remote.root_identity(), &path, &key).await
            }
            Some(UserAction::InstallRootSshKey) => install_root_key(ctx).await,
            None => bail!("Unknown user command <{}>.", self.name),
        }
    }
}

/// `ssh <user>@<host> -p <port>`.
#[must_use]
pub fn login_line(user: &str, host: &str, port: u16) -> String {
    format!("ssh {user}@{host} -p {port}")
}

async fn remote_user_exists(ctx: &CommandContext<'_>, identity: Identity) -> Result<bool> {
    let output = ctx
        .remote
        .execute(&user_exists_command(ctx.config.user()?), identity)
        .await?;
    Ok(user_exists(&output))
}

fn environment_name<'a>(ctx: &'a CommandContext<'a>) -> &'a str {
    ctx.config.environment.as_deref().unwrap_or_default()
}

/// Create the user and set it up. Always logs in as root, even when sudo
/// is configured, since the sudo user may not exist yet.
async fn add_user(ctx: &CommandContext<'_>) -> Result<()> {
    let config = ctx.config;
    let user = config.user()?;
    let host = config.host()?;
    let env = environment_name(ctx);
    let identity = Identity::AsRootDirect;

    if remote_user_exists(ctx, identity).await? {
        bail!(
            "User {user} already exists. Remove it with `deckhand user remove from {env}` \
             or reconfigure it with `deckhand user reconfigure for {env}`."
        );
    }

    ctx.reporter
        .step(&format!("It looks like {user} does not yet exist on {host}."));
    if !ctx.prompter.confirm(&format!("Add {user} to {host}?"), true)? {
        ctx.reporter.step("Cancelled.");
        return Ok(());
    }

    let home_dir = config.home_dir()?;
    ctx.reporter.step(&format!("Adding {user} to {host}"));
    ctx.remote
        .execute(
            &add_user_command(user, &home_dir, config.credentials.password.as_deref()),
            identity,
        )
        .await?;
    if !remote_user_exists(ctx, identity).await? {
        bail!("Failed to add user {user} to {host}. Is the configuration file correct?");
    }
    ctx.reporter.success(&format!("Added {user} to {host}."));

    ctx.reporter.step("Ensuring git is installed");
    ctx.remote
        .execute(&install_packages_command(GIT_PACKAGES), identity)
        .await?;
    ctx.reporter
        .step("Ensuring common application dependencies are installed");
    ctx.remote
        .execute(&install_packages_command(COMMON_PACKAGES), identity)
        .await?;

    configure_user(ctx, identity).await?;
    ctx.reporter.success(&format!(
        "Finished adding and configuring {user}. You can now push to {env}."
    ));
    Ok(())
}

/// Delete the user and its home directory, applications included. Asks
/// twice. Always logs in as root.
async fn remove_user(ctx: &CommandContext<'_>) -> Result<()> {
    let config = ctx.config;
    let user = config.user()?;
    let host = config.host()?;
    let home_dir = config.home_dir()?;
    let identity = Identity::AsRootDirect;

    if !remote_user_exists(ctx, identity).await? {
        bail!("User {user} does not exist at {host}.");
    }

    ctx.reporter.warn(&format!(
        "Removing {user} also removes {home_dir}, which holds the applications of {user}."
    ));
    let sure = ctx
        .prompter
        .confirm(&format!("Are you SURE you want to remove {user}?"), false)?;
    if !sure || !ctx.prompter.confirm("Are you REALLY sure?", false)? {
        ctx.reporter.step("Cancelled.");
        return Ok(());
    }

    ctx.reporter.step(&format!("Removing {user} from {host}"));
    ctx.remote
        .execute(&remove_user_command(user), identity)
        .await?;
    if remote_user_exists(ctx, identity).await? {
        bail!("Failed to remove user {user} from {host}. Is the configuration file correct?");
    }
    ctx.remote
        .execute(&remove_home_command(&home_dir), identity)
        .await?;
    ctx.reporter
        .success(&format!("User {user} has been removed from {host}."));
    Ok(())
}

/// Re-apply the user configuration without touching its applications.
async fn reconfigure_user(ctx: &CommandContext<'_>) -> Result<()> {
    let identity = ctx.remote.root_identity();
    if !remote_user_exists(ctx, identity).await? {
        let config = ctx.config;
        bail!(
            "User {} does not exist at {}. Add it with `deckhand user add to {}`.",
            config.user()?,
            config.host()?,
            environment_name(ctx)
        );
    }
    configure_user(ctx, identity).await
}

/// Overwrites the user's shell and git setup, grants sudo, joins the RVM
/// group when RVM is present, and installs the operator's key if it exists.
async fn configure_user(ctx: &CommandContext<'_>, identity: Identity) -> Result<()> {
    let config = ctx.config;
    let user = config.user()?;
    let home_dir = config.home_dir()?;
    ctx.reporter.step(&format!("Configuring {user}"));

    if let Some((path, key)) = existing_public_key(ctx) {
        install_user_key(ctx, identity, &path, &key).await?;
    }

    ctx.reporter.step("Configuring .bashrc");
    ctx.remote
        .execute(&bashrc_command(&home_dir), identity)
        .await?;

    let sudoers = ctx.remote.execute(READ_SUDOERS, identity).await?;
    if !in_sudoers(&sudoers, user) {
        ctx.reporter.step(&format!("Adding {user} to sudoers"));
        ctx.remote
            .execute(&add_to_sudoers_command(user), identity)
            .await?;
    }

    let rvm = ctx.remote.execute(&rvm_check_command(), identity).await?;
    if rvm_found(&rvm) {
        ctx.reporter
            .step(&format!("Adding {user} to the RVM group"));
        ctx.remote
            .execute(&add_to_rvm_group_command(user), identity)
            .await?;
    }

    ctx.reporter.step(&format!("Configuring git for {user}"));
    ctx.remote
        .execute(&gitconfig_command(&home_dir), identity)
        .await?;

    ctx.reporter.step("Setting permissions");
    ctx.remote
        .execute(&chown_home_command(user, &home_dir), identity)
        .await?;

    ctx.reporter
        .success(&format!("Finished configuring {user}."));
    Ok(())
}

/// The operator's public key, trimmed.
fn local_public_key(ctx: &CommandContext<'_>) -> Result<(PathBuf, String)> {
    let home = ctx
        .home
        .as_deref()
        .context("cannot determine home directory")?;
    let path = public_key_path(home, ctx.config.credentials.ssh_key.as_deref());
    if !ctx.fs.exists(&path) {
        bail!(
            "Could not find ssh key in {}. To create one, run: ssh-keygen -t rsa",
            path.display()
        );
    }
    let key = ctx.fs.read_to_string(&path)?.trim().to_string();
    Ok((path, key))
}

/// The operator's public key when one exists locally.
fn existing_public_key(ctx: &CommandContext<'_>) -> Option<(PathBuf, String)> {
    let home = ctx.home.as_deref()?;
    let path = public_key_path(home, ctx.config.credentials.ssh_key.as_deref());
    if !ctx.fs.exists(&path) {
        return None;
    }
    let key = ctx.fs.read_to_string(&path).ok()?.trim().to_string();
    Some((path, key))
}

async fn install_user_key(
    ctx: &CommandContext<'_>,
    identity: Identity,
    path: &Path,
    key: &str,
) -> Result<()> {
    let config = ctx.config;
    let home_dir = config.home_dir()?;
    let user = config.user()?;
    let host = config.host()?;

    let installed = ctx
        .remote
        .execute(&read_authorized_keys_command(&home_dir), identity)
        .await?;
    if installed.contains(key) {
        ctx.reporter.success(&format!(
            "Your ssh key has already been installed for {user} at {host}."
        ));
        return Ok(());
    }

    ctx.reporter
        .step(&format!("Installing {} for {user}", path.display()));
    ctx.remote
        .execute(&install_key_command(&home_dir, user, key), identity)
        .await?;
    ctx.reporter
        .success(&format!("Installed your ssh key for {user} at {host}."));
    Ok(())
}

async fn install_root_key(ctx: &CommandContext<'_>) -> Result<()> {
    let (path, key) = local_public_key(ctx)?;
    let host = ctx.config.host()?;

    let installed = ctx
        .remote
        .execute_as_root(READ_ROOT_AUTHORIZED_KEYS)
        .await?;
    if installed.contains(&key) {
        ctx.reporter.success(&format!(
            "Your ssh key has already been installed for {ROOT_USER} at {host}."
        ));
        return Ok(());
    }

    ctx.reporter
        .step(&format!("Installing {} for {ROOT_USER}", path.display()));
    ctx.remote
        .execute_as_root(&install_root_key_command(&key))
        .await?;
    ctx.reporter
        .success(&format!("Installed your ssh key for {ROOT_USER} at {host}."));
    Ok(())
}
