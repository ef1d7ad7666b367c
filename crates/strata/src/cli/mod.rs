mod add;
mod project;
mod status;
mod up;

pub use add::AddCommand;
pub use project::Project;
pub use status::StatusCommand;
pub use up::UpCommand;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// strata - schema migrations with per-context history
#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path.
    #[arg(short, long, default_value = "strata.toml", global = true)]
    pub config: String,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Author a migration from the model file.
    Add(AddCommand),

    /// Apply all pending migrations.
    Up(UpCommand),

    /// Show applied and pending migrations.
    Status(StatusCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let log_level = if self.verbose { "debug" } else { "info" };
        tracing_subscriber::fmt()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()))
            .init();

        // Load .env if present
        dotenvy::dotenv().ok();

        let project = Project::load(Path::new(&self.config))?;

        match self.command {
            Commands::Add(cmd) => cmd.execute(&project).await,
            Commands::Up(cmd) => cmd.execute(&project).await,
            Commands::Status(cmd) => cmd.execute(&project).await,
        }
    }
}
