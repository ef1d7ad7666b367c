use anyhow::Result;
use clap::Parser;
use console::style;
use tracing::info;

use strata_runtime::Database;

use super::Project;

/// Author a migration from the model file.
#[derive(Parser)]
pub struct AddCommand {
    /// Migration name (letters, digits, '_' and '-').
    pub name: String,
}

impl AddCommand {
    pub async fn execute(self, project: &Project) -> Result<()> {
        let model = project.model(true)?;

        // Authoring never touches the database.
        let db = Database::connect_lazy(&project.config.database)?;
        let orchestrator = project.orchestrator(&db, model)?;

        let migration = orchestrator.add_migration(&self.name)?;
        let path = project.scaffolder()?.migration_path(&migration);
        info!(
            "Authored migration {} with {} upgrade operation(s)",
            migration.name,
            migration.upgrade_operations.len()
        );

        println!();
        println!(
            "  {} Created migration {}",
            style("✓").green(),
            style(migration.file_stem()).cyan()
        );
        println!(
            "    {} {} upgrade / {} downgrade operations",
            style("→").dim(),
            migration.upgrade_operations.len(),
            migration.downgrade_operations.len()
        );
        for op in &migration.upgrade_operations {
            println!("      {} {}", style("+").green(), op.describe());
        }
        println!("    {} {}", style("→").dim(), style(path.display()).dim());
        println!();

        Ok(())
    }
}
