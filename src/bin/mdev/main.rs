mod build;
mod dist;
mod logs;
mod vcs;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use mdev::build::{BuildMode, BuildOptions};
use mdev::config_file::Settings;
use mdev::load_config;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(
    name = "mdev",
    about = "Maven workflow wrapper that rebuilds the modules touched by git changes"
)]
struct Cli {
    /// Save the build output in a timestamped log directory
    #[arg(short = 's')]
    save_log: bool,

    /// Suppress build output
    #[arg(short = 'q')]
    quiet: bool,

    /// Path to config file (auto-detected if not specified)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments handed unchanged to the underlying tool
#[derive(Args, Debug)]
pub struct PassArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Quick build: install without tests or static analysis, no snapshot updates
    Qb(PassArgs),
    /// Full build: clean install with every quality gate
    Fb(PassArgs),
    /// Full build without the documentation profile
    Sd(PassArgs),
    /// Full build without tests
    St(PassArgs),
    /// Quick build of the modules with uncommitted changes and their dependents
    Re(PassArgs),
    /// Rebuild updated modules, unpack the distribution over the old one and run it
    Redo(PassArgs),
    /// Print the modules with uncommitted changes
    Updated,
    /// Unpack the distribution archive
    Unzip(dist::UnzipArgs),
    /// Run the unpacked distribution
    Run(PassArgs),
    /// Follow the most recent saved build log
    Tail,
    /// List saved build logs
    List,
    /// Delete saved build logs
    Clean(logs::CleanArgs),
    /// Check out a pull request
    Pr(vcs::PrArgs),
    /// curl with the default flags
    Curl(PassArgs),
    /// curl with the default and extended flags
    Xcurl(PassArgs),
    /// Print the launcher of the unpacked distribution
    Findbin,
    /// Print the distribution archive
    Finddist,
    /// Pull upstream changes and run a quick build
    Upgrade(PassArgs),
}

fn main() -> ExitCode {
    // Usage errors and help exit with status 2 before anything else runs
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(2);
        }
    };

    mdev::logger::init();

    let settings = match load_config(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let notification = settings.notification.clone();

    match run(cli, settings) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            mdev::process::notify(&notification, &e.to_string());
            ExitCode::FAILURE
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn run(cli: Cli, settings: Settings) -> Result<ExitCode, BoxError> {
    let handler = tokio::task::spawn_blocking(move || dispatch(cli, &settings));
    tokio::select! {
        result = handler => result?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            std::process::exit(1);
        }
    }
}

fn dispatch(cli: Cli, settings: &Settings) -> Result<ExitCode, BoxError> {
    let options = BuildOptions {
        quiet: cli.quiet,
        save_log: cli.save_log,
    };
    match cli.command {
        Commands::Qb(pass) => build::run(settings, options, &BuildMode::Quick, &pass.args),
        Commands::Fb(pass) => build::run(settings, options, &BuildMode::Full, &pass.args),
        Commands::Sd(pass) => build::run(settings, options, &BuildMode::SkipDocs, &pass.args),
        Commands::St(pass) => build::run(settings, options, &BuildMode::SkipTests, &pass.args),
        Commands::Re(pass) => build::rebuild(settings, options, &pass.args),
        Commands::Redo(pass) => build::redo(settings, options, &pass.args),
        Commands::Updated => build::updated(settings),
        Commands::Upgrade(pass) => build::upgrade(settings, options, &pass.args),
        Commands::Unzip(ref args) => dist::unzip(settings, args),
        Commands::Run(pass) => dist::run(settings, &pass.args),
        Commands::Findbin => dist::findbin(settings),
        Commands::Finddist => dist::finddist(settings),
        Commands::Tail => logs::tail(settings),
        Commands::List => logs::list(settings),
        Commands::Clean(ref args) => logs::clean(settings, args),
        Commands::Pr(ref args) => vcs::pr(settings, args),
        Commands::Curl(pass) => {
            mdev::http::curl(&settings.curl, false, &pass.args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Xcurl(pass) => {
            mdev::http::curl(&settings.curl, true, &pass.args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
