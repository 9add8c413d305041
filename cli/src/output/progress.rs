//! Progress indicators using indicatif

#![allow(clippy::expect_used)] // Templates are compile-time constants

use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::ports::RemoteShell;
use crate::domain::{RemoteSession, TransportError};
use crate::output::OutputContext;

/// Create a spinner for indeterminate progress.
///
/// # Panics
///
/// Panics if the spinner template string is invalid (it is a compile-time constant and will not panic).
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠁", "⠂", "⠄", "⡀", "⡈", "⡐", "⡠", "⣀", "⣁", "⣂", "⣄", "⣌", "⣔", "⣤", "⣥", "⣦",
                "⣮", "⣶", "⣷", "⣿", "⡿", "⠿", "⢟", "⠟", "⡛", "⠛", "⠫", "⢋", "⠋", "⠍", "⡉", "⠉",
                "⠑", "⠡", "⢁",
            ])
            .template("  {spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Finish a spinner with a checkmark on the left.
pub fn finish_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {prefix} {msg}")
            .expect("valid template"),
    );
    pb.set_prefix("✓");
    pb.finish_with_message(msg.to_string());
}

/// Finish a spinner with an error mark on the left.
pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {prefix} {msg}")
            .expect("valid template"),
    );
    pb.set_prefix("✗");
    pb.finish_with_message(msg.to_string());
}

/// `RemoteShell` decorator that shows a spinner while the wrapped call is
/// in flight. The spinner is finished when the call resolves, whatever the
/// outcome, and the result is passed through untouched.
pub struct SpinningShell<'a, S: RemoteShell> {
    inner: S,
    ctx: &'a OutputContext,
}

impl<'a, S: RemoteShell> SpinningShell<'a, S> {
    #[must_use]
    pub fn new(inner: S, ctx: &'a OutputContext) -> Self {
        Self { inner, ctx }
    }
}

#[async_trait]
impl<S: RemoteShell> RemoteShell for SpinningShell<'_, S> {
    async fn run(
        &self,
        session: &RemoteSession,
        wire_command: &str,
    ) -> Result<String, TransportError> {
        if !self.ctx.show_progress() {
            return self.inner.run(session, wire_command).await;
        }
        let target = format!("{}@{}", session.login, session.host);
        let pb = spinner(&format!("Running on {target}"));
        let result = self.inner.run(session, wire_command).await;
        match &result {
            Ok(_) => finish_ok(&pb, &format!("Ran on {target}")),
            Err(err) => finish_error(&pb, &err.to_string()),
        }
        result
    }
}
