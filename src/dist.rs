//! Distribution discovery and lifecycle
//!
//! Locates the packaged archive produced by the build, unpacks it and runs the
//! launcher found in the unpacked snapshot directory.

use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use log::{debug, info};
use thiserror::Error;

use crate::config_file::Settings;
use crate::process::{self, ProcessError};

#[derive(Error, Debug)]
pub enum DistError {
    #[error("no distribution archive matching {0}")]
    NoDistribution(String),
    #[error("no runnable entry point under {0}")]
    NoEntryPoint(PathBuf),
    #[error("invalid glob pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("{0} has no top-level directory")]
    NoTopLevelDirectory(PathBuf),
    #[error("unable to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Process(#[from] ProcessError),
}

fn glob_paths(pattern: &str) -> Result<Vec<PathBuf>, DistError> {
    let paths = glob::glob(pattern).map_err(|source| DistError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(paths.filter_map(Result::ok).collect())
}

fn modified(path: &Path) -> SystemTime {
    path.metadata()
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Most recently modified path, ties going to the last in name order.
fn newest(mut paths: Vec<PathBuf>) -> Option<PathBuf> {
    paths.sort();
    paths.into_iter().max_by_key(|p| modified(p))
}

fn file_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Directory distributions are unpacked into.
#[must_use]
pub fn unpack_dir(settings: &Settings) -> PathBuf {
    crate::absolute(&settings.root, &settings.dist.unpack_dir)
}

/// Locate the distribution archive under the project root.
///
/// # Errors
///
/// Returns `DistError::NoDistribution` if no archive survives the exclusions.
pub fn find_distribution(settings: &Settings) -> Result<PathBuf, DistError> {
    let root = glob::Pattern::escape(&settings.root.to_string_lossy());
    let pattern = format!("{root}/{}", settings.dist.archive_glob);
    let candidates: Vec<PathBuf> = glob_paths(&pattern)?
        .into_iter()
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = file_name(path);
            let excluded = settings.dist.exclude.iter().any(|re| re.is_match(name));
            if excluded {
                debug!("Skipping excluded archive {}", path.display());
            }
            !excluded
        })
        .collect();
    newest(candidates).ok_or(DistError::NoDistribution(pattern))
}

fn launchers(settings: &Settings, dir: &Path) -> Result<Vec<PathBuf>, DistError> {
    let pattern = format!("{}/bin/*", glob::Pattern::escape(&dir.to_string_lossy()));
    Ok(glob_paths(&pattern)?
        .into_iter()
        .filter(|path| settings.dist.bin_pattern.is_match(file_name(path)))
        .filter(|path| is_executable(path))
        .collect())
}

/// Locate the launcher of the most recent unpacked snapshot distribution.
///
/// # Errors
///
/// Returns `DistError::NoEntryPoint` if no snapshot directory holds a matching
/// executable in its `bin` directory.
pub fn find_entry_point(settings: &Settings) -> Result<PathBuf, DistError> {
    let unpack = unpack_dir(settings);
    let pattern = format!("{}/*", glob::Pattern::escape(&unpack.to_string_lossy()));
    let mut candidates = Vec::new();
    for dir in glob_paths(&pattern)? {
        if dir.is_dir() && settings.dist.snapshot_pattern.is_match(file_name(&dir)) {
            candidates.extend(launchers(settings, &dir)?);
        }
    }
    newest(candidates).ok_or(DistError::NoEntryPoint(unpack))
}

/// Locate the launcher inside a specific distribution directory.
///
/// # Errors
///
/// Returns `DistError::NoEntryPoint` if `dist_dir/bin` holds no matching executable.
pub fn entry_point_in(settings: &Settings, dist_dir: &Path) -> Result<PathBuf, DistError> {
    newest(launchers(settings, dist_dir)?)
        .ok_or_else(|| DistError::NoEntryPoint(dist_dir.to_path_buf()))
}

/// First top-level directory named in a `unzip -Z1` listing.
///
/// Only a plain directory name qualifies; `.` and `..` never do.
#[must_use]
pub fn top_level_dir(listing: &str) -> Option<&str> {
    listing
        .lines()
        .filter_map(|line| line.split_once('/'))
        .map(|(top, _)| top)
        .find(|top| !top.is_empty())
        .filter(|top| {
            let mut components = Path::new(top).components();
            matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            )
        })
}

/// Make room for extracting into `target`.
///
/// Without `force`, an existing directory is only removed when `confirm`
/// agrees. Returns whether extraction may proceed.
///
/// # Errors
///
/// Returns `DistError::Io` if the directory cannot be removed.
pub fn clear_existing(
    target: &Path,
    force: bool,
    confirm: impl FnOnce(&Path) -> bool,
) -> Result<bool, DistError> {
    if !target.exists() {
        return Ok(true);
    }
    if !force && !confirm(target) {
        return Ok(false);
    }
    info!("Removing {}", target.display());
    std::fs::remove_dir_all(target).map_err(|source| DistError::Io {
        path: target.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Unpack `archive` into the unpack directory.
///
/// Returns the extracted directory, or `None` when the user declined to
/// replace an existing one.
///
/// # Errors
///
/// Returns `DistError` if the archive cannot be listed or extracted.
pub fn extract(
    settings: &Settings,
    archive: &Path,
    force: bool,
    confirm: impl FnOnce(&Path) -> bool,
) -> Result<Option<PathBuf>, DistError> {
    let listing = process::output(Command::new("unzip").arg("-Z1").arg(archive))?;
    let top = top_level_dir(&listing)
        .ok_or_else(|| DistError::NoTopLevelDirectory(archive.to_path_buf()))?;
    let unpack = unpack_dir(settings);
    std::fs::create_dir_all(&unpack).map_err(|source| DistError::Io {
        path: unpack.clone(),
        source,
    })?;

    let target = unpack.join(top);
    if target.parent() != Some(unpack.as_path()) || target.file_name().is_none() {
        return Err(DistError::NoTopLevelDirectory(archive.to_path_buf()));
    }
    if !clear_existing(&target, force, confirm)? {
        info!("Keeping existing {}", target.display());
        return Ok(None);
    }

    info!("Extracting {} into {}", archive.display(), unpack.display());
    process::run(
        Command::new("unzip")
            .arg("-q")
            .arg("-o")
            .arg(archive)
            .arg("-d")
            .arg(&unpack),
    )?;
    Ok(Some(target))
}

/// Execute the launcher from its distribution directory.
///
/// # Errors
///
/// Returns `DistError::Process` if the launcher fails.
pub fn run_entry_point(entry: &Path, args: &[String]) -> Result<(), DistError> {
    let mut cmd = Command::new(entry);
    cmd.args(args);
    if let Some(dist_dir) = entry.parent().and_then(Path::parent) {
        cmd.current_dir(dist_dir);
    }
    info!("Running {}", entry.display());
    process::run(&mut cmd)?;
    Ok(())
}
