//! Persisted build logs
//!
//! Each build invocation gets its own directory under `<tmp_root>/logs`, named
//! by timestamp, branch and abbreviated commit so that a plain name sort is
//! chronological. The log file inside it is only written when the output is
//! saved.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Local};
use log::{debug, info};
use thiserror::Error;

use crate::config_file::Settings;
use crate::process::{self, ProcessError};
use crate::vcs::{self, HeadInfo};

/// Name of the log file inside a log directory
pub const LOG_FILE: &str = "build.log";

#[derive(Error, Debug)]
pub enum LogsError {
    #[error("unable to access log directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no build logs found in {0}")]
    NoLogs(PathBuf),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> LogsError + '_ {
    move |source| LogsError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Directory name for a build started at `now` on `head`.
#[must_use]
pub fn dir_name(now: DateTime<Local>, head: &HeadInfo) -> String {
    format!(
        "{}-{}-{}",
        now.format("%Y%m%d-%H%M%S"),
        sanitize(&head.branch),
        sanitize(&head.short_hash)
    )
}

/// Create the log directory for this invocation.
///
/// # Errors
///
/// Returns `LogsError::Io` if the directory cannot be created.
pub fn create_log_dir(settings: &Settings) -> Result<PathBuf, LogsError> {
    let head = vcs::head_info(&settings.root).unwrap_or_else(|e| {
        debug!("No HEAD information for log directory: {e}");
        HeadInfo::unknown()
    });
    let dir = settings.log_root().join(dir_name(Local::now(), &head));
    std::fs::create_dir_all(&dir).map_err(io_error(&dir))?;
    info!("Log directory {}", dir.display());
    Ok(dir)
}

/// Log directories under `root`, oldest first.
///
/// # Errors
///
/// Returns `LogsError::Io` if `root` exists but cannot be read.
pub fn list(root: &Path) -> Result<Vec<PathBuf>, LogsError> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root).map_err(io_error(root))? {
        let entry = entry.map_err(io_error(root))?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Most recent log file under `root`.
///
/// # Errors
///
/// Returns `LogsError::NoLogs` if no log directory holds a log file.
pub fn latest(root: &Path) -> Result<PathBuf, LogsError> {
    list(root)?
        .into_iter()
        .rev()
        .map(|dir| dir.join(LOG_FILE))
        .find(|file| file.is_file())
        .ok_or_else(|| LogsError::NoLogs(root.to_path_buf()))
}

/// Follow the most recent build log.
///
/// # Errors
///
/// Returns `LogsError` if there is no log or `tail` fails.
pub fn tail(settings: &Settings) -> Result<(), LogsError> {
    let file = latest(&settings.log_root())?;
    info!("Following {}", file.display());
    process::run(Command::new("tail").arg("-F").arg(&file))?;
    Ok(())
}

/// Delete every log directory under `root` once `confirm` agrees.
///
/// Returns the number of directories removed.
///
/// # Errors
///
/// Returns `LogsError::Io` if a directory cannot be removed.
pub fn clean(root: &Path, confirm: impl FnOnce(usize) -> bool) -> Result<usize, LogsError> {
    let dirs = list(root)?;
    if dirs.is_empty() {
        info!("No build logs in {}", root.display());
        return Ok(0);
    }
    if !confirm(dirs.len()) {
        return Ok(0);
    }
    for dir in &dirs {
        debug!("Removing {}", dir.display());
        std::fs::remove_dir_all(dir).map_err(io_error(dir))?;
    }
    info!("Removed {} log directories", dirs.len());
    Ok(dirs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_log_dir(root: &Path, name: &str, with_log: bool) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        if with_log {
            std::fs::write(dir.join(LOG_FILE), "[INFO] BUILD SUCCESS\n").unwrap();
        }
    }

    #[test]
    fn test_dir_name() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let head = HeadInfo {
            branch: "feature/login".to_string(),
            short_hash: "abc1234".to_string(),
        };
        assert_eq!(dir_name(now, &head), "20240309-140507-feature_login-abc1234");
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list(&dir.path().join("logs")).unwrap().is_empty());
    }

    #[test]
    fn test_list_sorted_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        make_log_dir(dir.path(), "20240310-090000-main-bbbbbbb", true);
        make_log_dir(dir.path(), "20240309-090000-main-aaaaaaa", true);
        make_log_dir(dir.path(), "20240311-090000-main-ccccccc", false);
        std::fs::write(dir.path().join("stray.txt"), "").unwrap();

        let names: Vec<String> = list(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "20240309-090000-main-aaaaaaa",
                "20240310-090000-main-bbbbbbb",
                "20240311-090000-main-ccccccc"
            ]
        );
        assert_eq!(
            latest(dir.path()).unwrap(),
            dir.path().join("20240310-090000-main-bbbbbbb").join(LOG_FILE)
        );
    }

    #[test]
    fn test_latest_without_logs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(latest(dir.path()), Err(LogsError::NoLogs(_))));
    }

    #[test]
    fn test_clean_declined_keeps_logs() {
        let dir = tempfile::tempdir().unwrap();
        make_log_dir(dir.path(), "20240309-090000-main-aaaaaaa", true);
        assert_eq!(clean(dir.path(), |_| false).unwrap(), 0);
        assert_eq!(list(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_clean_removes_all_logs() {
        let dir = tempfile::tempdir().unwrap();
        make_log_dir(dir.path(), "20240309-090000-main-aaaaaaa", true);
        make_log_dir(dir.path(), "20240310-090000-main-bbbbbbb", true);
        let removed = clean(dir.path(), |count| {
            assert_eq!(count, 2);
            true
        })
        .unwrap();
        assert_eq!(removed, 2);
        assert!(list(dir.path()).unwrap().is_empty());
    }
}
