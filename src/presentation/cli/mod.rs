pub mod commands;

use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::process::exit;
use tracing_subscriber::EnvFilter;

use crate::common::error::MessError;
use crate::infrastructure::filesystem::DEFAULT_MANIFEST_FILE;
use crate::presentation::ui::display::{helpers::auto_display, DisplayHelper};
use commands::{app::AppCommand, init::InitCommand, repo::RepoCommand};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("GIT_HASH"),
    "\nbuilt: ",
    env!("BUILD_DATE"),
    "\ntarget: ",
    env!("BUILD_TARGET"),
);

/// mess - Orchestrate multi-repository projects from a single manifest
#[derive(Parser)]
#[command(name = "mess")]
#[command(about = "Clone repositories, assemble application workspaces and run their scripts")]
#[command(version, long_version = LONG_VERSION)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Manifest file
    #[arg(short, long, global = true, default_value = DEFAULT_MANIFEST_FILE)]
    pub file: PathBuf,

    /// Working directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new manifest
    Init {
        /// Project name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Write a sample manifest with example repositories and an application
        #[arg(long)]
        sample: bool,

        /// Overwrite an existing manifest
        #[arg(long)]
        force: bool,
    },

    /// Manage repositories
    Repo {
        /// Repository name
        name: String,

        #[command(subcommand)]
        action: RepoAction,
    },

    /// Manage applications
    #[command(visible_alias = "application")]
    App {
        /// Application name
        name: String,

        #[command(subcommand)]
        action: AppAction,
    },
}

#[derive(Subcommand)]
pub enum RepoAction {
    /// Add a repository
    Add {
        /// Clone URL
        url: String,
    },

    /// Remove a repository and unlink it from every application
    #[command(visible_alias = "rm")]
    Remove {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Clone the repository
    #[command(visible_alias = "clone")]
    Get,

    /// Any other git subcommand, run inside the cloned repository
    #[command(external_subcommand)]
    Git(Vec<String>),
}

#[derive(Subcommand)]
pub enum AppAction {
    /// Create the application
    Init,

    /// Add repositories to the application
    Link {
        /// Repository names
        #[arg(required = true)]
        repos: Vec<String>,
    },

    /// Clone dependencies, link them and run the pre/post-setup commands
    Setup,

    /// Clone dependencies and link them without lifecycle commands
    Clone,

    /// Run a named script in the application directory
    Run {
        /// Script name
        script: String,
    },
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        init_tracing(self.cli.verbose);

        let display = auto_display(self.cli.no_color).with_verbose(self.cli.verbose);
        colored::control::set_override(display.use_color);

        // Change directory if specified
        if let Some(ref dir) = self.cli.directory {
            env::set_current_dir(dir)?;
        }

        match self.handle_command(&display).await {
            Ok(()) => Ok(()),
            Err(e) => {
                display.error(&e.to_string());
                let code = e
                    .downcast_ref::<MessError>()
                    .map(MessError::exit_code)
                    .unwrap_or(1);
                exit(code);
            }
        }
    }

    async fn handle_command(&self, display: &DisplayHelper) -> anyhow::Result<()> {
        let manifest_path = self.cli.file.clone();

        match &self.cli.command {
            Commands::Init { name, sample, force } => {
                InitCommand::new(manifest_path, name.clone(), *sample, *force, display.clone())
                    .execute()
                    .await?
            }
            Commands::Repo { name, action } => {
                RepoCommand::new(manifest_path, name.clone(), display.clone())
                    .execute(action)
                    .await?
            }
            Commands::App { name, action } => {
                AppCommand::new(manifest_path, name.clone(), display.clone())
                    .execute(action)
                    .await?
            }
        }

        Ok(())
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "mess=debug" } else { "mess=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_repo_git_passthrough() {
        let cli = Cli::parse_from(["mess", "repo", "backend", "log", "--oneline", "-n", "3"]);
        match cli.command {
            Commands::Repo {
                name,
                action: RepoAction::Git(args),
            } => {
                assert_eq!(name, "backend");
                assert_eq!(args, vec!["log", "--oneline", "-n", "3"]);
            }
            _ => panic!("expected git passthrough"),
        }
    }

    #[test]
    fn test_repo_aliases() {
        let cli = Cli::parse_from(["mess", "repo", "backend", "rm", "-y"]);
        assert!(matches!(
            cli.command,
            Commands::Repo {
                action: RepoAction::Remove { yes: true },
                ..
            }
        ));

        let cli = Cli::parse_from(["mess", "repo", "backend", "clone"]);
        assert!(matches!(
            cli.command,
            Commands::Repo {
                action: RepoAction::Get,
                ..
            }
        ));
    }

    #[test]
    fn test_application_alias_and_global_file() {
        let cli = Cli::parse_from(["mess", "application", "web", "run", "start", "-f", "other.json"]);
        assert_eq!(cli.file, PathBuf::from("other.json"));
        match cli.command {
            Commands::App {
                name,
                action: AppAction::Run { script },
            } => {
                assert_eq!(name, "web");
                assert_eq!(script, "start");
            }
            _ => panic!("expected app run"),
        }
    }

    #[test]
    fn test_manifest_defaults_to_mess_json() {
        let cli = Cli::parse_from(["mess", "app", "web", "setup"]);
        assert_eq!(cli.file, PathBuf::from("mess.json"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_link_requires_repositories() {
        assert!(Cli::try_parse_from(["mess", "app", "web", "link"]).is_err());
    }
}
