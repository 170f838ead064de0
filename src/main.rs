//! # deps CLI Entry Point
//!
//! Parses arguments with clap and routes each command to the
//! [`DependencyManager`]; reports are rendered by [`ui`].
//!
//! ## Commands
//!
//! - `get <spec>` - add or re-pin a dependency
//! - `check` - verify pinned dependencies exist locally
//! - `install` - download missing dependencies at their pinned commit
//! - `update [key]` - move dependencies to the latest commit of their ref
//! - `version`, `completion <shell>`

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use deps::config::Config;
use deps::deps::DependencyManager;
use deps::lock::LockStore;
use deps::remote::GitHubClient;
use deps::ui;

#[derive(Parser)]
#[command(name = "deps")]
#[command(about = "Fetch and pin source dependencies", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a dependency: <host>/<owner>/<repo>[@<ref>]
    Get {
        /// Dependency spec, e.g. github.com/fmtlib/fmt@11.0.2
        spec: String,
    },
    /// Check that every locked dependency is present locally
    Check,
    /// Download locked dependencies that are missing locally
    Install,
    /// Update dependencies to the latest commit of their ref
    Update {
        /// Only update this dependency (<host>/<owner>/<repo>)
        key: Option<String>,
    },
    /// Print version information
    Version,
    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("DEPS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("deps={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Configuration and manager for the working directory.
fn load() -> Result<(Config, DependencyManager<GitHubClient>)> {
    let cwd = std::env::current_dir().context("Could not determine working directory")?;
    let config = Config::load(&cwd)?;
    let manager = DependencyManager::new(
        GitHubClient::new(&config),
        LockStore::new(&config.lockfile),
        &config.root,
    );
    Ok((config, manager))
}

fn run(cli: Cli) -> Result<ExitCode> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::FAILURE);
    };

    match command {
        Commands::Version => {
            println!("deps {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "deps", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Get { spec } => {
            let (_, manager) = load()?;
            println!("{} Fetching {}...", "📦".blue(), spec.bold());
            let report = manager.get(&spec)?;
            ui::print_get(&report);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => {
            let (config, manager) = load()?;
            let report = manager.check();
            if ui::print_check(&report, &config.lockfile) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Install => {
            let (config, manager) = load()?;
            let report = manager.install();
            ui::print_install(&report, &config.lockfile);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Update { key } => {
            let (config, manager) = load()?;
            let report = manager.update(key.as_deref())?;
            ui::print_update(&report, &config.lockfile);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            ui::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
