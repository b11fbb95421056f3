//! dopo CLI: the main entry point.
//!
//! Commands:
//! - `run`        Score every sector with every configured method, write the report
//! - `match`      Show the activities a sector's filters select
//! - `methods`    List impact assessment methods
//! - `compare`    Relative score changes between two databases
//! - `config`     Validate, show, or locate the configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "dopo",
    about = "dopo: sector-level LCA score analysis",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.dopo/config.toml
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the report
    Run {
        /// Override the aggregation cutoff
        #[arg(long)]
        cutoff: Option<f64>,

        /// Override the report path (`.jsonl` writes dashboard records)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the activities matched for each technology of a sector
    Match {
        sector: String,

        /// Restrict matching to one database
        #[arg(short, long)]
        database: Option<String>,
    },

    /// List available impact assessment methods
    Methods {
        /// Case-insensitive text filter
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Compare scores of the configured sectors between two databases
    Compare {
        base_db: String,
        other_db: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Check the configuration for errors
    Validate,
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run { cutoff, output } => commands::run::run(config_path, cutoff, output).await?,
        Commands::Match { sector, database } => {
            commands::match_cmd::run(config_path, &sector, database).await?
        }
        Commands::Methods { search } => commands::methods::run(config_path, search).await?,
        Commands::Compare {
            base_db,
            other_db,
            output,
        } => commands::compare::run(config_path, &base_db, &other_db, output).await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
        },
    }

    Ok(())
}
