use std::process::ExitCode;

use clap::Args;

use mdev::config_file::Settings;
use mdev::{logs, prompt};

use crate::BoxError;

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Delete without asking
    #[arg(short, long)]
    force: bool,
}

/// Follow the most recent build log.
///
/// # Errors
///
/// Returns an error if there is no saved log.
pub fn tail(settings: &Settings) -> Result<ExitCode, BoxError> {
    logs::tail(settings)?;
    Ok(ExitCode::SUCCESS)
}

/// Print one saved log directory per line, oldest first.
///
/// # Errors
///
/// Returns an error if the log root cannot be read.
pub fn list(settings: &Settings) -> Result<ExitCode, BoxError> {
    for dir in logs::list(&settings.log_root())? {
        println!("{}", dir.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// Delete saved log directories.
///
/// # Errors
///
/// Returns an error if a directory cannot be removed.
pub fn clean(settings: &Settings, args: &CleanArgs) -> Result<ExitCode, BoxError> {
    let root = settings.log_root();
    logs::clean(&root, |count| {
        args.force
            || prompt::confirm(&format!(
                "Delete {count} log directories in {}?",
                root.display()
            ))
    })?;
    Ok(ExitCode::SUCCESS)
}
