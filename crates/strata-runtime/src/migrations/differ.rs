use strata_core::migration::{DiffEngine, Operation};
use strata_core::schema::Snapshot;

/// Structural differ over tables, columns and indexes.
///
/// Operations come out in an order the database accepts: stale indexes are
/// dropped first, then tables and columns change, then indexes are created.
/// Primary keys are fixed at table creation and not diffed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelDiffer;

impl ModelDiffer {
    pub fn new() -> Self {
        Self
    }

    /// Whether two snapshots describe the same schema, ignoring declaration order.
    pub fn equivalent(&self, a: &Snapshot, b: &Snapshot) -> bool {
        self.diff(a, b).is_empty()
    }
}

impl DiffEngine for ModelDiffer {
    fn diff(&self, source: &Snapshot, target: &Snapshot) -> Vec<Operation> {
        let mut ops = Vec::new();

        // Indexes that disappear or change shape
        for index in &source.indexes {
            if target.index(&index.name) != Some(index) {
                ops.push(Operation::DropIndex {
                    name: index.name.clone(),
                });
            }
        }

        for table in &target.tables {
            let Some(existing) = source.table(&table.name) else {
                ops.push(Operation::CreateTable {
                    table: table.clone(),
                });
                continue;
            };

            for column in &table.columns {
                match existing.get_column(&column.name) {
                    None => ops.push(Operation::AddColumn {
                        table: table.name.clone(),
                        column: column.clone(),
                    }),
                    Some(old) if old != column => ops.push(Operation::AlterColumn {
                        table: table.name.clone(),
                        column: column.clone(),
                    }),
                    Some(_) => {}
                }
            }

            for old in &existing.columns {
                if table.get_column(&old.name).is_none() {
                    ops.push(Operation::DropColumn {
                        table: table.name.clone(),
                        column: old.name.clone(),
                    });
                }
            }
        }

        for table in &source.tables {
            if target.table(&table.name).is_none() {
                ops.push(Operation::DropTable {
                    name: table.name.clone(),
                });
            }
        }

        for index in &target.indexes {
            if source.index(&index.name) != Some(index) {
                ops.push(Operation::CreateIndex {
                    index: index.clone(),
                });
            }
        }

        ops
    }

    fn diff_from_empty(&self, target: &Snapshot) -> Vec<Operation> {
        self.diff(&Snapshot::new(), target)
    }

    fn diff_to_empty(&self, target: &Snapshot) -> Vec<Operation> {
        self.diff(target, &Snapshot::new())
    }
}
