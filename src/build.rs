//! Maven invocation wrapper
//!
//! Four fixed build modes plus the incremental one differ only in the goals
//! and the quality gates they switch off. Output handling (quiet, saved log)
//! is carried by [`BuildOptions`] rather than process-wide state.

use std::fs::File;
use std::io::{self, Write};
use std::process::{Child, Command, Stdio};

use log::{debug, info};
use thiserror::Error;

use crate::changes::{self, ChangeError, ModuleSelection};
use crate::config_file::{MavenConfig, Settings};
use crate::logs::{self, LogsError};
use crate::process::{self, ProcessError};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("no updated modules, nothing to build")]
    NothingToBuild,
    #[error("build failed: {0}")]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Changes(#[from] ChangeError),
    #[error(transparent)]
    Logs(#[from] LogsError),
    #[error("unable to write build log: {0}")]
    Io(#[from] io::Error),
}

/// Output handling for one invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Discard Maven's stdout
    pub quiet: bool,
    /// Tee Maven's stdout into a timestamped log directory
    pub save_log: bool,
}

/// Quality gates switched off by the quick build
const QUICK_GATES: [&str; 7] = [
    "-DskipTests",
    "-Dcheckstyle.skip",
    "-Dspotbugs.skip",
    "-Dpmd.skip",
    "-Drat.skip",
    "-Denforcer.skip",
    "-Dmaven.javadoc.skip",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    /// `clean install` with every gate
    Full,
    /// Full build without the documentation profile
    SkipDocs,
    /// Full build without tests
    SkipTests,
    /// `install` without static analysis or tests, no snapshot updates
    Quick,
    /// Quick build of the given modules and their dependents
    Incremental(ModuleSelection),
}

impl BuildMode {
    /// Maven arguments for this mode, before threads and extra arguments.
    #[must_use]
    pub fn args(&self, maven: &MavenConfig) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        match self {
            BuildMode::Full => args.extend(["clean", "install"].map(String::from)),
            BuildMode::SkipDocs => {
                args.extend(["clean", "install"].map(String::from));
                args.push(format!("-P!{}", maven.docs_profile));
            }
            BuildMode::SkipTests => {
                args.extend(["clean", "install", "-DskipTests"].map(String::from));
            }
            BuildMode::Quick => {
                args.extend(["install", "-nsu"].map(String::from));
                args.extend(QUICK_GATES.map(String::from));
            }
            BuildMode::Incremental(selection) => {
                args = BuildMode::Quick.args(maven);
                args.extend(["-pl".to_string(), selection.to_filter(), "-amd".to_string()]);
            }
        }
        args
    }

    fn label(&self) -> &'static str {
        match self {
            BuildMode::Full => "full build",
            BuildMode::SkipDocs => "full build without docs",
            BuildMode::SkipTests => "full build without tests",
            BuildMode::Quick => "quick build",
            BuildMode::Incremental(_) => "incremental build",
        }
    }
}

/// Assemble the Maven command line for `mode`.
#[must_use]
pub fn maven_command(settings: &Settings, mode: &BuildMode, passthrough: &[String]) -> Command {
    let maven = &settings.maven;
    let mut cmd = Command::new(&maven.command);
    cmd.current_dir(&settings.root)
        .env(&maven.memory_env, &maven.memory)
        .args(mode.args(maven));
    if let Some(threads) = &maven.threads {
        cmd.arg("-T").arg(threads);
    }
    cmd.args(&maven.extra_args).args(passthrough);
    cmd
}

/// Writes everything to a file and, optionally, to a second sink
struct Tee<W: Write> {
    file: File,
    echo: Option<W>,
}

impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        if let Some(echo) = &mut self.echo {
            echo.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if let Some(echo) = &mut self.echo {
            echo.flush()?;
        }
        Ok(())
    }
}

/// Copy the child's stdout into `sink`, stopping the child if the copy fails.
fn drain_stdout(child: &mut Child, sink: &mut impl Write) -> io::Result<()> {
    let Some(mut stdout) = child.stdout.take() else {
        return Ok(());
    };
    let copied = io::copy(&mut stdout, sink).and_then(|_| sink.flush());
    if copied.is_err() {
        drop(stdout);
        if let Err(e) = child.kill() {
            debug!("Unable to stop process {}: {e}", child.id());
        }
        let _ = child.wait();
    }
    copied
}

/// Run Maven in `mode`.
///
/// Every invocation gets a fresh log directory; the build log is written into
/// it only when `options.save_log` is set.
///
/// # Errors
///
/// Returns `BuildError::Process` if Maven cannot be started or fails, or
/// `BuildError::Logs`/`BuildError::Io` if the build log cannot be written.
pub fn build(
    settings: &Settings,
    options: BuildOptions,
    mode: &BuildMode,
    passthrough: &[String],
) -> Result<(), BuildError> {
    let mut cmd = maven_command(settings, mode, passthrough);
    let log_dir = logs::create_log_dir(settings)?;
    info!("Starting {}: {}", mode.label(), process::display(&cmd));

    if !options.save_log {
        if options.quiet {
            cmd.stdout(Stdio::null());
        }
        process::run(&mut cmd)?;
        return Ok(());
    }

    let log_path = log_dir.join(logs::LOG_FILE);
    info!("Saving build log to {}", log_path.display());
    let mut tee = Tee {
        file: File::create(&log_path)?,
        echo: (!options.quiet).then(io::stdout),
    };
    let mut child = cmd
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| process::spawn_error(&cmd, e))?;
    drain_stdout(&mut child, &mut tee)?;
    let status = child.wait().map_err(|e| process::spawn_error(&cmd, e))?;
    process::check_status(&cmd, status)?;
    info!("Build log: {}", log_path.display());
    Ok(())
}

/// Rebuild the modules owning uncommitted changes, plus their dependents.
///
/// Returns the selection that was built.
///
/// # Errors
///
/// Returns `BuildError::NothingToBuild` without running Maven when there are
/// no changes, otherwise as [`build`].
pub fn rebuild_updated(
    settings: &Settings,
    options: BuildOptions,
    passthrough: &[String],
) -> Result<ModuleSelection, BuildError> {
    let selection = changes::updated_modules(settings)?;
    if selection.is_empty() {
        return Err(BuildError::NothingToBuild);
    }
    info!("Updated modules: {}", selection.to_filter());
    build(
        settings,
        options,
        &BuildMode::Incremental(selection.clone()),
        passthrough,
    )?;
    Ok(selection)
}
