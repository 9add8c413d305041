//! `Ssh2Shell`: `RemoteShell` over libssh2.
//!
//! One TCP connection and one SSH session per call. The blocking libssh2
//! calls run on tokio's blocking pool.

use std::io::{self, Read};
use std::net::TcpStream;
use std::time::Duration;

use async_trait::async_trait;
use ssh2::Session;

use crate::application::ports::RemoteShell;
use crate::domain::{RemoteSession, TransportError};

/// Connect timeout for the TCP leg.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Production `RemoteShell`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ssh2Shell;

#[async_trait]
impl RemoteShell for Ssh2Shell {
    async fn run(
        &self,
        session: &RemoteSession,
        wire_command: &str,
    ) -> Result<String, TransportError> {
        let session = session.clone();
        let command = wire_command.to_string();
        let host = session.host.clone();
        tokio::task::spawn_blocking(move || exec(&session, &command))
            .await
            .map_err(|err| TransportError::Channel {
                host,
                reason: err.to_string(),
            })?
    }
}

fn exec(remote: &RemoteSession, command: &str) -> Result<String, TransportError> {
    let session = connect(remote)?;
    let channel_err = |err: ssh2::Error| TransportError::Channel {
        host: remote.host.clone(),
        reason: err.message().to_string(),
    };

    let mut channel = session.channel_session().map_err(channel_err)?;
    channel.exec(command).map_err(channel_err)?;

    session.set_blocking(false);
    let mut stdout_stream = channel.stream(0);
    let mut stderr_stream = channel.stderr();
    let drained = drain_output(&mut stdout_stream, &mut stderr_stream, || channel.eof());
    session.set_blocking(true);
    let (stdout, stderr) = drained.map_err(|err| TransportError::Channel {
        host: remote.host.clone(),
        reason: err.to_string(),
    })?;
    channel.wait_close().map_err(channel_err)?;

    if !stderr.is_empty() {
        tracing::debug!(
            host = %remote.host,
            stderr = %String::from_utf8_lossy(&stderr).trim_end(),
            "remote stderr"
        );
    }
    tracing::debug!(
        host = %remote.host,
        exit_status = channel.exit_status().unwrap_or(-1),
        bytes = stdout.len(),
        "remote command finished"
    );
    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

/// Pause between polls when neither stream had data.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Append what `source` has ready to `sink`. `false` when nothing was read.
fn read_chunk(source: &mut impl Read, sink: &mut Vec<u8>) -> io::Result<bool> {
    let mut buf = [0u8; 8192];
    match source.read(&mut buf) {
        Ok(n) => {
            sink.extend_from_slice(&buf[..n]);
            Ok(n > 0)
        }
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ) =>
        {
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Read stdout and stderr side by side until the channel reports EOF, so a
/// chatty stderr cannot fill the channel window and stall the remote command.
///
/// Both sources may be non-blocking. Returns raw `(stdout, stderr)` bytes.
fn drain_output(
    stdout: &mut impl Read,
    stderr: &mut impl Read,
    at_eof: impl Fn() -> bool,
) -> io::Result<(Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    let mut err = Vec::new();
    loop {
        let read_out = read_chunk(stdout, &mut out)?;
        let read_err = read_chunk(stderr, &mut err)?;
        if !read_out && !read_err {
            if at_eof() {
                return Ok((out, err));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
