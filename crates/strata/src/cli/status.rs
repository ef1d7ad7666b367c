use anyhow::Result;
use clap::Parser;
use console::style;

use strata_runtime::Database;

use super::Project;

/// Show applied and pending migrations.
#[derive(Parser)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(self, project: &Project) -> Result<()> {
        println!();
        println!(
            "  {}  {} Migration Status",
            style("⛰").bold(),
            style("STRATA").bold().cyan()
        );
        println!();

        let db = Database::from_config(&project.config.database).await?;
        let orchestrator = project.orchestrator(&db, project.model(false)?)?;
        let status = orchestrator.status().await;
        db.close().await;
        let status = status?;

        println!(
            "  {} Context: {}",
            style("ℹ").blue(),
            style(&status.context_key).cyan()
        );
        println!();

        if status.applied.is_empty() && status.pending.is_empty() && status.unknown.is_empty() {
            println!("  {} No migrations found", style("ℹ").blue());
            return Ok(());
        }

        if !status.applied.is_empty() {
            println!("  {} Applied:", style("✓").green());
            for m in &status.applied {
                println!("    {} {}", style("-").dim(), style(m).cyan());
            }
        }

        if !status.pending.is_empty() {
            if !status.applied.is_empty() {
                println!();
            }
            println!("  {} Pending:", style("○").yellow());
            for m in &status.pending {
                println!("    {} {}", style("→").dim(), style(m).yellow());
            }
        }

        if !status.unknown.is_empty() {
            println!();
            println!("  {} In history but not found locally:", style("!").red());
            for m in &status.unknown {
                println!("    {} {}", style("?").dim(), style(m).red());
            }
        }

        println!();
        println!(
            "  {} {} applied, {} pending",
            style("ℹ").blue(),
            status.applied.len(),
            status.pending.len()
        );
        println!();

        Ok(())
    }
}
