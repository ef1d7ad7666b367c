use anyhow::Result;
use clap::Parser;
use console::style;
use tracing::{error, info};

use strata_core::StrataError;
use strata_runtime::Database;

use super::Project;

/// Apply all pending migrations.
#[derive(Parser)]
pub struct UpCommand {}

impl UpCommand {
    pub async fn execute(self, project: &Project) -> Result<()> {
        println!();
        println!(
            "  {}  {} Migrations",
            style("⛰").bold(),
            style("STRATA").bold().cyan()
        );
        println!();

        info!("Connecting to database...");
        let db = Database::from_config(&project.config.database).await?;
        let orchestrator = project.orchestrator(&db, project.model(false)?)?;

        if orchestrator.catalog().is_empty() {
            println!(
                "  {} No migrations found in {}",
                style("ℹ").blue(),
                project.migrations_dir().display()
            );
            db.close().await;
            return Ok(());
        }

        println!("  {} Running pending migrations...", style("→").dim());
        let result = orchestrator.upgrade().await;
        db.close().await;

        match result {
            Ok(report) if report.is_empty() => {
                println!("  {} Database is up to date", style("✓").green());
            }
            Ok(report) => {
                for record in &report.applied {
                    println!("  {} Applied: {}", style("✓").green(), record);
                }
                println!();
                println!(
                    "  {} Applied {} migration(s)",
                    style("✓").green(),
                    report.applied.len()
                );
            }
            Err(e) => {
                error!("Upgrade failed: {}", e);
                if let StrataError::Execution { ref migration, .. } = e {
                    println!("  {} Failed: {}", style("✗").red(), style(migration).red());
                }
                return Err(e.into());
            }
        }
        println!();

        Ok(())
    }
}
