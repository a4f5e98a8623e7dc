//! External process invocation
//!
//! Every verb ends up running some other tool (Maven, git, unzip, curl). This
//! module turns a non-zero exit or a failed spawn into a `ProcessError` so the
//! callers can propagate it with `?`.

use std::ffi::OsStr;
use std::process::{Command, ExitStatus};

use log::debug;
use thiserror::Error;

use crate::config_file::NotificationConfig;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("unable to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {}", describe_status(.status))]
    Failed { program: String, status: ExitStatus },
}

fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Render a command line for logging.
#[must_use]
pub fn display(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}

fn program(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

pub(crate) fn spawn_error(cmd: &Command, source: std::io::Error) -> ProcessError {
    ProcessError::Spawn {
        program: program(cmd),
        source,
    }
}

/// Turn an exit status into a result.
///
/// # Errors
///
/// Returns `ProcessError::Failed` when `status` is not a success.
pub fn check_status(cmd: &Command, status: ExitStatus) -> Result<(), ProcessError> {
    if status.success() {
        Ok(())
    } else {
        Err(ProcessError::Failed {
            program: program(cmd),
            status,
        })
    }
}

/// Run a command with inherited stdio and wait for it.
///
/// # Errors
///
/// Returns `ProcessError` if the command cannot be started or exits non-zero.
pub fn run(cmd: &mut Command) -> Result<(), ProcessError> {
    debug!("Running: {}", display(cmd));
    let status = cmd.status().map_err(|e| spawn_error(cmd, e))?;
    check_status(cmd, status)
}

/// Run a command and capture its stdout.
///
/// # Errors
///
/// Returns `ProcessError` if the command cannot be started or exits non-zero.
pub fn output(cmd: &mut Command) -> Result<String, ProcessError> {
    debug!("Running: {}", display(cmd));
    let output = cmd.output().map_err(|e| spawn_error(cmd, e))?;
    check_status(cmd, output.status)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Send a desktop notification. Failures are only logged.
pub fn notify(config: &NotificationConfig, message: &str) {
    if !config.enabled || config.command.trim().is_empty() {
        return;
    }
    let result = Command::new(&config.command)
        .arg("mdev")
        .arg(message)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status();
    match result {
        Ok(status) if !status.success() => {
            debug!("Notification command exited with {status}");
        }
        Err(e) => debug!("Notification not sent: {e}"),
        Ok(_) => {}
    }
}
