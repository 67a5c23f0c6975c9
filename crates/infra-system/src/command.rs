// Service manager command runner
// reason: tokio::process keeps service manager calls off the runtime threads
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use valet_core::port::ProbeError;

/// Spawn `program args...` and wait for its output
///
/// The child is killed if it outlives `limit`.
///
/// # Errors
/// - ProbeError::SpawnFailed if the program cannot be started
/// - ProbeError::Timeout if it does not exit within `limit`
pub async fn run_command(
    program: &str,
    args: &[&str],
    limit: Duration,
) -> Result<Output, ProbeError> {
    debug!(program = %program, args = ?args, "Running service manager command");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ProbeError::SpawnFailed(format!("{}: {}", program, e)))?;

    match timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ProbeError::SpawnFailed(format!(
            "waiting for {}: {}",
            program, e
        ))),
        Err(_) => Err(timeout_error(limit)),
    }
}

fn timeout_error(limit: Duration) -> ProbeError {
    ProbeError::Timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
}

/// Turn a non-zero exit into ProbeError::CommandFailed
pub fn ensure_success(program: &str, args: &[&str], output: &Output) -> Result<(), ProbeError> {
    if output.status.success() {
        return Ok(());
    }
    Err(ProbeError::CommandFailed {
        command: command_line(program, args),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
