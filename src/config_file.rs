//! Configuration file handling for mdev

use std::path::{Path, PathBuf};

use log::{debug, info};
use regex_cache::LazyRegex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON config file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Invalid regex pattern `{pattern}`: {source}")]
    Regex {
        source: regex::Error,
        pattern: String,
    },
    #[error("Invalid config: {0}")]
    Validation(String),
}

/// Compile a single regex pattern.
///
/// # Errors
///
/// Returns `ConfigError::Regex` if the pattern fails to compile.
pub fn parse_regex(pattern: &str) -> Result<LazyRegex, ConfigError> {
    LazyRegex::new(pattern).map_err(|e| ConfigError::Regex {
        source: e,
        pattern: pattern.to_string(),
    })
}

/// Parse a list of regex pattern strings into compiled regexes.
///
/// # Errors
///
/// Returns `ConfigError::Regex` if any pattern fails to compile.
pub fn parse_regexes(regex: &[String]) -> Result<Vec<LazyRegex>, ConfigError> {
    regex.iter().map(|r| parse_regex(r)).collect()
}

/// How Maven is invoked
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MavenConfig {
    pub command: String,
    /// Environment variable carrying the JVM memory limit
    pub memory_env: String,
    pub memory: String,
    /// Profile disabled by the `sd` build
    pub docs_profile: String,
    /// Passed as `-T <threads>` when set
    pub threads: Option<String>,
    pub extra_args: Vec<String>,
}

impl Default for MavenConfig {
    fn default() -> Self {
        Self {
            command: "mvn".to_string(),
            memory_env: "MAVEN_OPTS".to_string(),
            memory: "-Xmx2g".to_string(),
            docs_profile: "docs".to_string(),
            threads: None,
            extra_args: Vec::new(),
        }
    }
}

/// Markers used to map a changed file to its owning module
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ModulesConfig {
    pub source_marker: String,
    pub descriptor: String,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            source_marker: "src".to_string(),
            descriptor: "pom.xml".to_string(),
        }
    }
}

/// Raw distribution settings as found in the config file
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ConfigDist {
    pub archive_glob: String,
    pub exclude: Vec<String>,
    pub snapshot_pattern: String,
    pub bin_pattern: String,
    pub unpack_dir: Option<PathBuf>,
}

impl Default for ConfigDist {
    fn default() -> Self {
        Self {
            archive_glob: "**/target/*.zip".to_string(),
            exclude: vec![
                "-sources".to_string(),
                "-javadoc".to_string(),
                "-src".to_string(),
            ],
            snapshot_pattern: "-SNAPSHOT$".to_string(),
            bin_pattern: "^[a-z][a-z0-9_-]{1,15}$".to_string(),
            unpack_dir: None,
        }
    }
}

/// Compiled distribution settings
#[derive(Debug, Clone)]
pub struct DistConfig {
    pub archive_glob: String,
    pub exclude: Vec<LazyRegex>,
    pub snapshot_pattern: LazyRegex,
    pub bin_pattern: LazyRegex,
    pub unpack_dir: PathBuf,
}

impl ConfigDist {
    fn compile(self, tmp_root: &Path) -> Result<DistConfig, ConfigError> {
        Ok(DistConfig {
            exclude: parse_regexes(&self.exclude)?,
            snapshot_pattern: parse_regex(&self.snapshot_pattern)?,
            bin_pattern: parse_regex(&self.bin_pattern)?,
            unpack_dir: self.unpack_dir.unwrap_or_else(|| tmp_root.join("dist")),
            archive_glob: self.archive_glob,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub command: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "notify-send".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GitConfig {
    pub remote: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CurlConfig {
    pub args: Vec<String>,
    /// Appended after `args` by `xcurl`
    pub extended_args: Vec<String>,
}

impl Default for CurlConfig {
    fn default() -> Self {
        Self {
            args: ["--silent", "--show-error", "--location"]
                .map(String::from)
                .to_vec(),
            extended_args: [
                "-H",
                "Accept: application/xml",
                "-H",
                "Content-Type: application/xml",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Root configuration structure as written on disk
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    pub mdev_version: Option<String>,
    pub tmp_root: Option<PathBuf>,
    pub maven: MavenConfig,
    pub modules: ModulesConfig,
    pub dist: ConfigDist,
    pub notification: NotificationConfig,
    pub git: GitConfig,
    pub curl: CurlConfig,
}

/// Validated configuration threaded through every operation
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory Maven runs in; module paths are relative to it
    pub root: PathBuf,
    pub tmp_root: PathBuf,
    pub maven: MavenConfig,
    pub modules: ModulesConfig,
    pub dist: DistConfig,
    pub notification: NotificationConfig,
    pub git: GitConfig,
    pub curl: CurlConfig,
}

impl Settings {
    /// Directory holding the persisted build logs
    #[must_use]
    pub fn log_root(&self) -> PathBuf {
        self.tmp_root.join("logs")
    }
}

const DEFAULT_TMP_ROOT: &str = "/tmp/mdev";

impl TryFrom<(Config, PathBuf)> for Settings {
    type Error = ConfigError;

    fn try_from((config, root): (Config, PathBuf)) -> Result<Self, Self::Error> {
        if config.maven.command.trim().is_empty() {
            return Err(ConfigError::Validation(
                "maven.command must not be empty".to_string(),
            ));
        }
        if config.modules.source_marker.trim().is_empty()
            || config.modules.descriptor.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "modules.source_marker and modules.descriptor must not be empty".to_string(),
            ));
        }
        let tmp_root = config
            .tmp_root
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TMP_ROOT));
        Ok(Settings {
            dist: config.dist.compile(&tmp_root)?,
            root,
            tmp_root,
            maven: config.maven,
            modules: config.modules,
            notification: config.notification,
            git: config.git,
            curl: config.curl,
        })
    }
}

/// List of supported configuration file names
const FILENAMES: [&str; 3] = [".mdev.json", ".mdev.yaml", ".mdev.yml"];

impl Config {
    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file cannot be read, or
    /// `ConfigError::Yaml`/`ConfigError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(file)
            .map_err(|_| ConfigError::ConfigNotFound(file.to_path_buf()))?;
        if file.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
                source: e,
                path: file.to_path_buf(),
            })
        } else if contents.trim().is_empty() {
            Ok(Config::default())
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })
        }
    }

    /// Searches for a configuration file in `start` and its parents.
    #[must_use]
    pub fn find_config(start: &Path) -> Option<PathBuf> {
        let mut path = start.to_path_buf();
        debug!("Searching for config file in {}", start.display());
        loop {
            for file in &FILENAMES {
                let config_path = path.join(file);
                if config_path.exists() {
                    info!("Found config file: {}", config_path.display());
                    return Some(config_path);
                }
            }
            if !path.pop() {
                return None;
            }
        }
    }
}
