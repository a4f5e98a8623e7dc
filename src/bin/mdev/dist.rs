use std::process::ExitCode;

use clap::Args;

use mdev::config_file::Settings;
use mdev::{dist, prompt};

use crate::BoxError;

#[derive(Args, Debug)]
pub struct UnzipArgs {
    /// Replace an existing unpacked directory without asking
    #[arg(short, long)]
    force: bool,
}

/// Unpack the distribution archive.
///
/// # Errors
///
/// Returns an error if no archive is found or extraction fails.
pub fn unzip(settings: &Settings, args: &UnzipArgs) -> Result<ExitCode, BoxError> {
    let archive = dist::find_distribution(settings)?;
    dist::extract(settings, &archive, args.force, |dir| {
        prompt::confirm(&format!("Remove existing {}?", dir.display()))
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Run the unpacked distribution.
///
/// # Errors
///
/// Returns an error if no launcher is found or it fails.
pub fn run(settings: &Settings, args: &[String]) -> Result<ExitCode, BoxError> {
    let entry = dist::find_entry_point(settings)?;
    dist::run_entry_point(&entry, args)?;
    Ok(ExitCode::SUCCESS)
}

/// Print the launcher path.
///
/// # Errors
///
/// Returns an error if no launcher is found.
pub fn findbin(settings: &Settings) -> Result<ExitCode, BoxError> {
    println!("{}", dist::find_entry_point(settings)?.display());
    Ok(ExitCode::SUCCESS)
}

/// Print the distribution archive path.
///
/// # Errors
///
/// Returns an error if no archive is found.
pub fn finddist(settings: &Settings) -> Result<ExitCode, BoxError> {
    println!("{}", dist::find_distribution(settings)?.display());
    Ok(ExitCode::SUCCESS)
}
