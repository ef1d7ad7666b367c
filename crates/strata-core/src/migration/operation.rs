use serde::{Deserialize, Serialize};

use crate::schema::{ColumnDef, IndexDef, TableDef};

/// An atomic structural change produced by diffing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateTable { table: TableDef },
    DropTable { name: String },
    AddColumn { table: String, column: ColumnDef },
    DropColumn { table: String, column: String },
    /// Replace a column's type, nullability and default.
    AlterColumn { table: String, column: ColumnDef },
    CreateIndex { index: IndexDef },
    DropIndex { name: String },
    /// Hand-written SQL. Must be safe to run twice.
    Sql { sql: String },
}

impl Operation {
    /// Short human-readable description, used in logs and status output.
    pub fn describe(&self) -> String {
        match self {
            Operation::CreateTable { table } => format!("create table {}", table.name),
            Operation::DropTable { name } => format!("drop table {}", name),
            Operation::AddColumn { table, column } => {
                format!("add column {}.{}", table, column.name)
            }
            Operation::DropColumn { table, column } => format!("drop column {}.{}", table, column),
            Operation::AlterColumn { table, column } => {
                format!("alter column {}.{}", table, column.name)
            }
            Operation::CreateIndex { index } => format!("create index {}", index.name),
            Operation::DropIndex { name } => format!("drop index {}", name),
            Operation::Sql { .. } => "raw sql".to_string(),
        }
    }
}
