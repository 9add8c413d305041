//! Remote account management for the application user: existence checks,
//! creation and removal, and the shell environment a deploy user needs.
//!
//! Builders only. Every command is meant to run as root.

use crate::domain::config::join_remote;

/// Packages every deploy host needs.
pub const GIT_PACKAGES: &str = "git-core";

/// Libraries applications commonly link against (XML parsing, images).
pub const COMMON_PACKAGES: &str = "libxml2-dev libxslt1-dev imagemagick";

/// Where a system-wide RVM lives.
pub const RVM_DIR: &str = "/usr/local/rvm";

pub const READ_SUDOERS: &str = "cat /etc/sudoers";

/// Prints the number of `/etc/passwd` entries for `user`.
#[must_use]
pub fn user_exists_command(user: &str) -> String {
    format!("grep -c '^{user}:' /etc/passwd")
}

/// Interpret the output of [`user_exists_command`].
#[must_use]
pub fn user_exists(output: &str) -> bool {
    output
        .trim()
        .parse::<u32>()
        .is_ok_and(|count| count > 0)
}

/// Create `user` with `home_dir` as its home and bash as its shell.
#[must_use]
pub fn add_user_command(user: &str, home_dir: &str, password: Option<&str>) -> String {
    let add = format!("useradd -m --home='{home_dir}' -s /bin/bash '{user}'");
    match password {
        Some(password) => format!("{add};echo '{user}:{password}' | chpasswd"),
        None => add,
    }
}

#[must_use]
pub fn remove_user_command(user: &str) -> String {
    format!("userdel -f '{user}'")
}

#[must_use]
pub fn remove_home_command(home_dir: &str) -> String {
    format!("rm -rf '{home_dir}'")
}

#[must_use]
pub fn install_packages_command(packages: &str) -> String {
    format!("aptitude update; aptitude install -y {packages}")
}

/// Overwrite the user's `.bashrc` with the production environment.
#[must_use]
pub fn bashrc_command(home_dir: &str) -> String {
    format!(
        "echo -e \"export RAILS_ENV=production\\nsource /etc/profile\" > '{}'",
        join_remote(home_dir, ".bashrc")
    )
}

/// The line that grants `user` sudo rights.
#[must_use]
pub fn sudoers_entry(user: &str) -> String {
    format!("{user} ALL=(ALL) ALL")
}

/// Whether `sudoers` (the output of [`READ_SUDOERS`]) grants `user` sudo.
#[must_use]
pub fn in_sudoers(sudoers: &str, user: &str) -> bool {
    let entry = sudoers_entry(user);
    sudoers.lines().any(|line| line.trim() == entry)
}

#[must_use]
pub fn add_to_sudoers_command(user: &str) -> String {
    format!("echo '{}' >> /etc/sudoers", sudoers_entry(user))
}

/// Prints `yes` when [`RVM_DIR`] exists.
#[must_use]
pub fn rvm_check_command() -> String {
    format!("test -d '{RVM_DIR}' && echo yes")
}

#[must_use]
pub fn rvm_found(output: &str) -> bool {
    output.trim() == "yes"
}

#[must_use]
pub fn add_to_rvm_group_command(user: &str) -> String {
    format!("usermod -G rvm '{user}'")
}

/// Write a minimal `.gitconfig` that accepts pushes to the checked-out
/// branch, unless one exists.
#[must_use]
pub fn gitconfig_command(home_dir: &str) -> String {
    let path = join_remote(home_dir, ".gitconfig");
    format!(
        "test -f '{path}' || echo -e \"[receive]\\n\\tdenyCurrentBranch = ignore\" > '{path}'"
    )
}

/// Hand the home directory back to the user after root wrote into it.
#[must_use]
pub fn chown_home_command(user: &str, home_dir: &str) -> String {
    format!("chown -R {user}:{user} '{home_dir}'")
}
