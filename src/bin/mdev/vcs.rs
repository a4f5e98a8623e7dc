use std::process::ExitCode;

use clap::Args;

use mdev::config_file::Settings;

use crate::BoxError;

#[derive(Args, Debug)]
pub struct PrArgs {
    /// Pull request number
    number: u32,
}

/// Check out a pull request into `pr/<number>`.
///
/// # Errors
///
/// Returns an error if fetching or checking out fails.
pub fn pr(settings: &Settings, args: &PrArgs) -> Result<ExitCode, BoxError> {
    mdev::vcs::checkout_pr(settings, args.number)?;
    Ok(ExitCode::SUCCESS)
}
