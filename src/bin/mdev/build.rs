use std::process::ExitCode;

use log::info;

use mdev::build::{self as maven, BuildMode, BuildOptions};
use mdev::config_file::Settings;
use mdev::{changes, dist, vcs};

use crate::BoxError;

/// Run one of the fixed build modes.
///
/// # Errors
///
/// Returns an error if Maven fails.
pub fn run(
    settings: &Settings,
    options: BuildOptions,
    mode: &BuildMode,
    args: &[String],
) -> Result<ExitCode, BoxError> {
    maven::build(settings, options, mode, args)?;
    Ok(ExitCode::SUCCESS)
}

/// Incremental build of the updated modules.
///
/// # Errors
///
/// Returns an error if nothing changed or Maven fails.
pub fn rebuild(
    settings: &Settings,
    options: BuildOptions,
    args: &[String],
) -> Result<ExitCode, BoxError> {
    maven::rebuild_updated(settings, options, args)?;
    Ok(ExitCode::SUCCESS)
}

/// Rebuild, unpack over the previous distribution and run it.
///
/// # Errors
///
/// Returns an error if any step fails.
pub fn redo(
    settings: &Settings,
    options: BuildOptions,
    args: &[String],
) -> Result<ExitCode, BoxError> {
    maven::rebuild_updated(settings, options, &[])?;
    let archive = dist::find_distribution(settings)?;
    let entry = match dist::extract(settings, &archive, true, |_| true)? {
        Some(dir) => dist::entry_point_in(settings, &dir)?,
        None => dist::find_entry_point(settings)?,
    };
    dist::run_entry_point(&entry, args)?;
    Ok(ExitCode::SUCCESS)
}

/// Print the updated modules as a `-pl` filter.
///
/// # Errors
///
/// Returns an error if the repository status cannot be read.
pub fn updated(settings: &Settings) -> Result<ExitCode, BoxError> {
    let selection = changes::updated_modules(settings)?;
    if selection.is_empty() {
        info!("No updated modules");
    } else {
        println!("{}", selection.to_filter());
    }
    Ok(ExitCode::SUCCESS)
}

/// Pull upstream changes, then quick build.
///
/// # Errors
///
/// Returns an error if the pull or the build fails.
pub fn upgrade(
    settings: &Settings,
    options: BuildOptions,
    args: &[String],
) -> Result<ExitCode, BoxError> {
    vcs::pull_upstream(settings)?;
    maven::build(settings, options, &BuildMode::Quick, args)?;
    Ok(ExitCode::SUCCESS)
}
