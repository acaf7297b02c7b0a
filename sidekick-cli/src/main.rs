//! Sidekick CLI - Command line interface for Code Sidekick
//!
//! Runs the HTTP API, or drives the agent directly from the terminal with
//! a personal access token.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sidekick_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ConfigArgs, ReposArgs, RunArgs, ServeArgs, TaskArgs};

const VERBOSE_FILTER: &str =
    "info,sidekick_core=debug,sidekick_github=debug,sidekick_server=debug,tower_http=debug";

/// Code Sidekick: a language-model agent that works on your GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "sidekick")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Model to use (overrides config and env)
    #[arg(long, global = true, env = "SIDEKICK_MODEL")]
    model: Option<String>,

    /// Config file (defaults to ~/.config/sidekick/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Serve the HTTP API
    Serve(ServeArgs),

    /// Run a templated task against a repository
    #[command(visible_alias = "t")]
    Task(TaskArgs),

    /// Run the agent on a free-form goal
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// List repositories the token can access
    Repos(ReposArgs),

    /// Show current configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { VERBOSE_FILTER } else { "info" })
    });
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let port = match &cli.command {
        Some(Commands::Serve(args)) => args.port,
        _ => None,
    };
    let config = Config::load_with_overrides(cli.config.as_deref(), cli.model.clone(), port)?;

    if cli.verbose {
        tracing::info!(
            model = %config.agent.model,
            base_url = %config.agent.base_url,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("sidekick {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Task(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Run(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Repos(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Config(args)) => {
            args.execute(&config, cli.config.as_deref())?;
        }
        None => {
            println!("Code Sidekick - a coding agent for your GitHub repositories");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
