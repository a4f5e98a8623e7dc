//! Git helpers
//!
//! Local reads go through libgit2; anything touching a remote is delegated to
//! the `git` binary so the user's credentials and transport setup apply.

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::Repository;
use log::{debug, info};
use thiserror::Error;

use crate::config_file::Settings;
use crate::process::{self, ProcessError};

#[derive(Error, Debug)]
pub enum VcsError {
    #[error("git repository not found: {0}")]
    NoRepo(#[from] git2::Error),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Work tree root of the repository containing `path`, if any.
#[must_use]
pub fn workdir(path: &Path) -> Option<PathBuf> {
    let repo = Repository::discover(path).ok()?;
    repo.workdir().map(Path::to_path_buf)
}

/// Branch name and abbreviated commit of HEAD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadInfo {
    pub branch: String,
    pub short_hash: String,
}

impl HeadInfo {
    /// Placeholder used outside of a repository or before the first commit.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            branch: "nobranch".to_string(),
            short_hash: "0000000".to_string(),
        }
    }
}

/// Describe HEAD of the repository containing `path`.
///
/// # Errors
///
/// Returns `VcsError::NoRepo` if there is no repository or HEAD cannot be read.
pub fn head_info(path: &Path) -> Result<HeadInfo, VcsError> {
    let repo = Repository::discover(path)?;
    let head = repo.head()?;
    let branch = if repo.head_detached()? {
        "detached".to_string()
    } else {
        head.shorthand().unwrap_or("detached").to_string()
    };
    let commit = head.peel_to_commit()?;
    let short_hash = commit
        .as_object()
        .short_id()?
        .as_str()
        .unwrap_or_default()
        .to_string();
    debug!("HEAD is {branch} at {short_hash}");
    Ok(HeadInfo { branch, short_hash })
}

/// Local branch a pull request is checked out into.
#[must_use]
pub fn pr_branch(number: u32) -> String {
    format!("pr/{number}")
}

/// Fetch `pull/<n>/head` from the configured remote and switch to it.
///
/// # Errors
///
/// Returns `VcsError::Process` if `git fetch` or `git checkout` fails.
pub fn checkout_pr(settings: &Settings, number: u32) -> Result<(), VcsError> {
    let branch = pr_branch(number);
    info!(
        "Fetching pull request #{number} from {} into {branch}",
        settings.git.remote
    );
    process::run(
        Command::new("git")
            .current_dir(&settings.root)
            .arg("fetch")
            .arg(&settings.git.remote)
            .arg(format!("+pull/{number}/head:{branch}")),
    )?;
    process::run(
        Command::new("git")
            .current_dir(&settings.root)
            .args(["checkout", &branch]),
    )?;
    Ok(())
}

/// Rebase the current branch onto its upstream, stashing local edits around it.
///
/// # Errors
///
/// Returns `VcsError::Process` if `git pull` fails.
pub fn pull_upstream(settings: &Settings) -> Result<(), VcsError> {
    info!("Pulling upstream changes");
    process::run(
        Command::new("git")
            .current_dir(&settings.root)
            .args(["pull", "--rebase", "--autostash"]),
    )?;
    Ok(())
}
