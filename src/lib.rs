//! Core implementation of mdev
//!
//! mdev wraps the everyday Maven workflow of a multi-module project: full and
//! quick builds, an incremental build of the modules touched by uncommitted git
//! changes, and helpers to unpack and run the resulting distribution.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config_file::{Config, ConfigError, Settings};

pub mod build;
pub mod changes;
pub mod config_file;
pub mod dist;
pub mod http;
pub mod logger;
pub mod logs;
pub mod process;
pub mod prompt;
pub mod vcs;

/// Load configuration from a file (or auto-detect it from the current directory).
///
/// # Errors
///
/// Returns `ConfigError` if an explicit config file does not exist, a file
/// cannot be parsed, or it contains invalid values.
pub fn load_config(config_file: Option<&str>) -> Result<Settings, ConfigError> {
    let cwd = std::env::current_dir()
        .map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))?;
    load_config_from(&cwd, config_file)
}

/// Like [`load_config`], resolving relative paths and the search against `cwd`.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_from(cwd: &Path, config_file: Option<&str>) -> Result<Settings, ConfigError> {
    let config_path = match config_file {
        Some(file) => {
            let config_path = cwd.join(file);
            if !config_path.exists() {
                return Err(ConfigError::ConfigNotFound(config_path));
            }
            Some(config_path)
        }
        None => Config::find_config(cwd),
    };

    let Some(config_path) = config_path else {
        let root = vcs::workdir(cwd).unwrap_or_else(|| cwd.to_path_buf());
        debug!("No config file, using defaults (root: {})", root.display());
        return Settings::try_from((Config::default(), root));
    };

    let root = config_path
        .parent()
        .ok_or_else(|| ConfigError::ConfigNotFound(config_path.clone()))?
        .to_path_buf();
    debug!(
        "Loading config file: {} (root: {})",
        config_path.display(),
        root.display()
    );
    let parsed = Config::from_file(&config_path)?;
    if let Some(version) = &parsed.mdev_version {
        validate_version(version);
    }
    Settings::try_from((parsed, root))
}

/// Warn if the config's `mdev_version` doesn't match the binary version
fn validate_version(config_version: &str) {
    let binary_version = env!("CARGO_PKG_VERSION");
    if config_version != binary_version {
        warn!(
            "Config mdev_version '{config_version}' differs from binary version '{binary_version}'"
        );
    }
}

/// Absolute form of `path`, relative paths being taken from `root`.
pub(crate) fn absolute(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        match load_config_from(dir.path(), Some("missing.yaml")) {
            Err(ConfigError::ConfigNotFound(path)) => {
                assert_eq!(path, dir.path().join("missing.yaml"));
            }
            other => panic!("Expected ConfigNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn test_root_is_config_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".mdev.yaml"), "maven:\n  command: ./mvnw\n").unwrap();
        let nested = dir.path().join("module");
        std::fs::create_dir(&nested).unwrap();
        let settings = load_config_from(&nested, None).unwrap();
        assert_eq!(settings.root, dir.path());
        assert_eq!(settings.maven.command, "./mvnw");
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_config_from(dir.path(), None).unwrap();
        assert_eq!(settings.maven.command, "mvn");
        assert_eq!(settings.root, dir.path());
    }
}
