//! Shared helpers for command handlers.

use std::future::Future;
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use labscope_core::CoreError;

use crate::error::CliError;

/// Run `fut` under an optional overall deadline.
pub async fn with_timeout<T>(
    seconds: Option<u64>,
    fut: impl Future<Output = Result<T, CoreError>>,
) -> Result<T, CliError> {
    match seconds {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), fut)
            .await
            .map_err(|_| CliError::Timeout { seconds: secs })?
            .map_err(CliError::from),
        None => fut.await.map_err(CliError::from),
    }
}

/// Stderr spinner, hidden when quiet or stderr is not a terminal.
pub fn spinner(message: impl Into<String>, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Read a verification request body from a file, or stdin for `-`.
pub fn read_request_file(path: &Path) -> Result<String, CliError> {
    if path == Path::new("-") {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        Ok(body)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}
