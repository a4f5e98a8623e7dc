//! Uncommitted changes and the modules that own them
//!
//! A [`ChangeSet`] is read from the repository status (tracked files only) and
//! mapped by a [`module::ModuleResolver`] onto a [`module::ModuleSelection`],
//! the list of modules handed to Maven's `-pl` option.

use std::fmt;
use std::path::PathBuf;

use log::debug;
use thiserror::Error;

use crate::config_file::Settings;

pub mod module;
mod status;

pub use module::{ModulePath, ModuleResolver, ModuleSelection};
pub use status::read_change_set;

/// Errors that can occur while reading changes
#[derive(Error, Debug)]
pub enum ChangeError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),
    #[error("{0} is not inside a git work tree")]
    NoWorkdir(PathBuf),
}

/// Kind of modification in one column of the short status format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    TypeChange,
    Conflicted,
}

impl ChangeKind {
    fn code(self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Modified => 'M',
            ChangeKind::Deleted => 'D',
            ChangeKind::Renamed => 'R',
            ChangeKind::TypeChange => 'T',
            ChangeKind::Conflicted => 'U',
        }
    }
}

/// Two-column status: staged (index) and unstaged (worktree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCode {
    pub index: Option<ChangeKind>,
    pub worktree: Option<ChangeKind>,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = |kind: Option<ChangeKind>| kind.map_or(' ', ChangeKind::code);
        write!(f, "{}{}", column(self.index), column(self.worktree))
    }
}

/// A tracked file differing from HEAD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub status: StatusCode,
    /// Path relative to the project root
    pub path: PathBuf,
    /// Previous path of a rename
    pub orig_path: Option<PathBuf>,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.orig_path {
            Some(orig) => write!(
                f,
                "{} {} -> {}",
                self.status,
                orig.display(),
                self.path.display()
            ),
            None => write!(f, "{} {}", self.status, self.path.display()),
        }
    }
}

/// Modifications of tracked files since the last commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Every path touched, a rename contributing its old path first.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.changes
            .iter()
            .flat_map(|change| change.orig_path.iter().chain(std::iter::once(&change.path)))
    }
}

/// Read the working tree changes under the project root and select their modules.
///
/// # Errors
///
/// Returns `ChangeError` if the repository status cannot be read.
pub fn updated_modules(settings: &Settings) -> Result<ModuleSelection, ChangeError> {
    let change_set = read_change_set(&settings.root)?;
    for change in &change_set.changes {
        debug!("Changed: {change}");
    }
    let resolver = ModuleResolver::new(&settings.root, &settings.modules);
    Ok(resolver.select(&change_set))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_display() {
        let code = StatusCode {
            index: None,
            worktree: Some(ChangeKind::Modified),
        };
        assert_eq!(code.to_string(), " M");
        let code = StatusCode {
            index: Some(ChangeKind::Renamed),
            worktree: Some(ChangeKind::Deleted),
        };
        assert_eq!(code.to_string(), "RD");
    }

    #[test]
    fn test_rename_contributes_both_paths() {
        let set = ChangeSet {
            changes: vec![Change {
                status: StatusCode {
                    index: Some(ChangeKind::Renamed),
                    worktree: None,
                },
                path: PathBuf::from("b/src/New.java"),
                orig_path: Some(PathBuf::from("a/src/Old.java")),
            }],
        };
        let paths: Vec<_> = set.paths().collect();
        assert_eq!(
            paths,
            vec![
                &PathBuf::from("a/src/Old.java"),
                &PathBuf::from("b/src/New.java")
            ]
        );
        assert_eq!(
            set.changes[0].to_string(),
            "R  a/src/Old.java -> b/src/New.java"
        );
    }
}
