use std::path::{Path, PathBuf};

use git2::{Repository, Status, StatusEntry, StatusOptions};
use log::debug;

use super::{Change, ChangeError, ChangeKind, ChangeSet, StatusCode};

fn index_kind(status: Status) -> Option<ChangeKind> {
    if status.is_conflicted() {
        Some(ChangeKind::Conflicted)
    } else if status.is_index_new() {
        Some(ChangeKind::Added)
    } else if status.is_index_modified() {
        Some(ChangeKind::Modified)
    } else if status.is_index_deleted() {
        Some(ChangeKind::Deleted)
    } else if status.is_index_renamed() {
        Some(ChangeKind::Renamed)
    } else if status.is_index_typechange() {
        Some(ChangeKind::TypeChange)
    } else {
        None
    }
}

fn worktree_kind(status: Status) -> Option<ChangeKind> {
    if status.is_conflicted() {
        Some(ChangeKind::Conflicted)
    } else if status.is_wt_modified() {
        Some(ChangeKind::Modified)
    } else if status.is_wt_deleted() {
        Some(ChangeKind::Deleted)
    } else if status.is_wt_renamed() {
        Some(ChangeKind::Renamed)
    } else if status.is_wt_typechange() {
        Some(ChangeKind::TypeChange)
    } else {
        None
    }
}

/// Repository-relative (old, new) paths of an entry.
///
/// Only staged renames are detected; untracked files are never scanned, so a
/// rename in the work tree shows up as a deletion.
fn entry_paths(entry: &StatusEntry<'_>) -> Option<(Option<PathBuf>, PathBuf)> {
    let renamed = entry
        .head_to_index()
        .filter(|_| entry.status().is_index_renamed());
    if let Some(delta) = renamed {
        let old = delta.old_file().path().map(Path::to_path_buf);
        let new = delta.new_file().path()?.to_path_buf();
        return Some((old, new));
    }
    entry.path().map(|p| (None, PathBuf::from(p)))
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Re-base a repository-relative path onto the project root.
fn relative_to_root(workdir: &Path, root: &Path, path: &Path) -> Option<PathBuf> {
    workdir
        .join(path)
        .strip_prefix(root)
        .ok()
        .map(Path::to_path_buf)
}

/// Read the status of tracked files of the repository containing `root`.
///
/// Paths in the returned set are relative to `root`; changes outside of it
/// are dropped.
///
/// # Errors
///
/// Returns `ChangeError::Git` if the repository cannot be opened or its status
/// read, or `ChangeError::NoWorkdir` for a bare repository.
pub fn read_change_set(root: &Path) -> Result<ChangeSet, ChangeError> {
    let repo = Repository::discover(root)?;
    let workdir = repo
        .workdir()
        .map(canonical)
        .ok_or_else(|| ChangeError::NoWorkdir(root.to_path_buf()))?;
    let root = canonical(root);

    let mut options = StatusOptions::new();
    options
        .include_untracked(false)
        .include_ignored(false)
        .renames_head_to_index(true);

    let mut changes = Vec::new();
    for entry in repo.statuses(Some(&mut options))?.iter() {
        let status = entry.status();
        let code = StatusCode {
            index: index_kind(status),
            worktree: worktree_kind(status),
        };
        if code == StatusCode::default() {
            continue;
        }
        let Some((orig, path)) = entry_paths(&entry) else {
            continue;
        };
        let Some(path) = relative_to_root(&workdir, &root, &path) else {
            debug!("Ignoring change outside project root: {}", path.display());
            continue;
        };
        let orig_path = orig.and_then(|orig| relative_to_root(&workdir, &root, &orig));
        changes.push(Change {
            status: code,
            path,
            orig_path,
        });
    }
    debug!(
        "Found {} changed files in {}",
        changes.len(),
        workdir.display()
    );
    Ok(ChangeSet { changes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::tests::{commit_all, init_repo};

    #[test]
    fn test_clean_tree_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path(), &["pom.xml", "a/pom.xml", "a/src/A.java"]);
        let set = read_change_set(dir.path()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_untracked_files_excluded() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path(), &["pom.xml", "a/src/A.java"]);
        std::fs::write(dir.path().join("a/src/New.java"), "x").unwrap();
        let set = read_change_set(dir.path()).unwrap();
        assert!(set.is_empty(), "got: {set:?}");
    }

    #[test]
    fn test_modified_staged_and_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path(), &["pom.xml", "a/src/A.java", "b/src/B.java"]);
        std::fs::write(dir.path().join("a/src/A.java"), "changed").unwrap();
        std::fs::remove_file(dir.path().join("b/src/B.java")).unwrap();
        std::fs::write(dir.path().join("c.txt"), "new").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("c.txt")).unwrap();
        index.write().unwrap();

        let set = read_change_set(dir.path()).unwrap();
        let mut found: Vec<(String, PathBuf)> = set
            .changes
            .iter()
            .map(|c| (c.status.to_string(), c.path.clone()))
            .collect();
        found.sort_by(|a, b| a.1.cmp(&b.1));
        assert_eq!(
            found,
            vec![
                (" M".to_string(), PathBuf::from("a/src/A.java")),
                (" D".to_string(), PathBuf::from("b/src/B.java")),
                ("A ".to_string(), PathBuf::from("c.txt")),
            ]
        );
    }

    #[test]
    fn test_staged_rename_keeps_both_paths() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path(), &["pom.xml", "a/src/A.java"]);
        std::fs::create_dir_all(dir.path().join("b/src")).unwrap();
        std::fs::rename(dir.path().join("a/src/A.java"), dir.path().join("b/src/A.java")).unwrap();
        let mut index = repo.index().unwrap();
        index.remove_path(Path::new("a/src/A.java")).unwrap();
        index.add_path(Path::new("b/src/A.java")).unwrap();
        index.write().unwrap();

        let set = read_change_set(dir.path()).unwrap();
        assert_eq!(set.changes.len(), 1, "got: {set:?}");
        let change = &set.changes[0];
        assert_eq!(change.status.to_string(), "R ");
        assert_eq!(change.path, PathBuf::from("b/src/A.java"));
        assert_eq!(change.orig_path, Some(PathBuf::from("a/src/A.java")));
        let paths: Vec<PathBuf> = set.paths().cloned().collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("a/src/A.java"), PathBuf::from("b/src/A.java")]
        );
    }

    #[test]
    fn test_paths_relative_to_nested_root() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path(), &["README.md", "java/pom.xml", "java/a/src/A.java"]);
        std::fs::write(dir.path().join("README.md"), "changed").unwrap();
        std::fs::write(dir.path().join("java/a/src/A.java"), "changed").unwrap();

        let set = read_change_set(&dir.path().join("java")).unwrap();
        assert_eq!(set.changes.len(), 1);
        assert_eq!(set.changes[0].path, PathBuf::from("a/src/A.java"));
    }

    #[test]
    fn test_committed_changes_disappear() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path(), &["pom.xml"]);
        std::fs::write(dir.path().join("pom.xml"), "changed").unwrap();
        assert_eq!(read_change_set(dir.path()).unwrap().changes.len(), 1);
        commit_all(&repo, "second");
        assert!(read_change_set(dir.path()).unwrap().is_empty());
    }
}
