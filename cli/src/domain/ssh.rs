//! SSH key conventions: local key location and the remote commands that
//! install a key into `authorized_keys`.

use std::path::{Path, PathBuf};

use crate::domain::config::join_remote;
use crate::domain::remote::KeyPair;

/// Public key used when the configuration does not name one.
pub const DEFAULT_PUBLIC_KEY: &str = "id_rsa.pub";

/// `<home>/.ssh/<key_name|id_rsa.pub>`.
#[must_use]
pub fn public_key_path(home: &Path, key_name: Option<&str>) -> PathBuf {
    home.join(".ssh").join(key_name.unwrap_or(DEFAULT_PUBLIC_KEY))
}

/// The public key and its private counterpart (same name without `.pub`).
#[must_use]
pub fn key_pair(home: &Path, key_name: Option<&str>) -> KeyPair {
    let public = public_key_path(home, key_name);
    let private = match public.to_str().and_then(|p| p.strip_suffix(".pub")) {
        Some(stripped) => PathBuf::from(stripped),
        None => public.clone(),
    };
    KeyPair { public, private }
}

/// `<home>/.ssh/authorized_keys` on the remote host.
#[must_use]
pub fn authorized_keys_path(home_dir: &str) -> String {
    join_remote(&join_remote(home_dir, ".ssh"), "authorized_keys")
}

/// Read the application user's `authorized_keys`.
#[must_use]
pub fn read_authorized_keys_command(home_dir: &str) -> String {
    format!("cat '{}'", authorized_keys_path(home_dir))
}

/// Append `key` to the application user's `authorized_keys` and fix ownership.
#[must_use]
pub fn install_key_command(home_dir: &str, user: &str, key: &str) -> String {
    let ssh_dir = join_remote(home_dir, ".ssh");
    let keys = authorized_keys_path(home_dir);
    format!(
        "mkdir -p '{ssh_dir}';echo '{key}' >> '{keys}';chown -R {user}:{user} '{ssh_dir}';chmod 700 '{ssh_dir}'; chmod 600 '{keys}'"
    )
}

/// Read root's `authorized_keys`.
pub const READ_ROOT_AUTHORIZED_KEYS: &str = "cat $HOME/.ssh/authorized_keys";

/// Append `key` to root's `authorized_keys`.
#[must_use]
pub fn install_root_key_command(key: &str) -> String {
    format!(
        "mkdir -p $HOME/.ssh; echo '{key}' >> $HOME/.ssh/authorized_keys;chmod 700 $HOME/.ssh; chmod 600 $HOME/.ssh/authorized_keys"
    )
}
