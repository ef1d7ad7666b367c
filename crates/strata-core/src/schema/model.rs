use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::SqlType;
use crate::error::{Result, StrataError};
use crate::migration::Operation;

/// A complete description of a schema at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tables, in declaration order.
    #[serde(default)]
    pub tables: Vec<TableDef>,

    /// Indexes, in declaration order.
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a model definition from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StrataError::Config(format!("Failed to read model {}: {}", path.display(), e))
        })?;
        Self::parse_toml(&content)
    }

    /// Parse a model definition from TOML.
    ///
    /// Table names, index names, and column names within a table must be
    /// unique.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let snapshot: Self = toml::from_str(content)
            .map_err(|e| StrataError::Config(format!("Failed to parse model: {}", e)))?;

        ensure_unique("table", snapshot.tables.iter().map(|t| t.name.as_str()))?;
        ensure_unique("index", snapshot.indexes.iter().map(|i| i.name.as_str()))?;
        for table in &snapshot.tables {
            ensure_unique(
                "column",
                table.columns.iter().map(|c| format!("{}.{}", table.name, c.name)),
            )?;
        }

        Ok(snapshot)
    }

    /// Builder-style table registration.
    pub fn with_table(mut self, table: TableDef) -> Self {
        self.add_table(table);
        self
    }

    /// Builder-style index registration.
    pub fn with_index(mut self, index: IndexDef) -> Self {
        self.add_index(index);
        self
    }

    /// Add a table, replacing any table with the same name.
    pub fn add_table(&mut self, table: TableDef) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    /// Add an index, replacing any index with the same name.
    pub fn add_index(&mut self, index: IndexDef) {
        match self.indexes.iter_mut().find(|i| i.name == index.name) {
            Some(existing) => *existing = index,
            None => self.indexes.push(index),
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn index(&self, name: &str) -> Option<&IndexDef> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Whether the snapshot declares no schema objects.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.indexes.is_empty()
    }

    /// Apply operations to this in-memory model.
    ///
    /// Mirrors the guarded SQL: creating something that exists or dropping
    /// something that is missing leaves the model unchanged. Raw SQL
    /// operations are opaque and ignored.
    pub fn apply(&mut self, operations: &[Operation]) {
        for op in operations {
            self.apply_one(op);
        }
    }

    fn apply_one(&mut self, op: &Operation) {
        match op {
            Operation::CreateTable { table } => {
                if self.table(&table.name).is_none() {
                    self.tables.push(table.clone());
                }
            }
            Operation::DropTable { name } => self.tables.retain(|t| &t.name != name),
            Operation::AddColumn { table, column } => {
                if let Some(t) = self.table_mut(table) {
                    if t.get_column(&column.name).is_none() {
                        t.columns.push(column.clone());
                    }
                }
            }
            Operation::DropColumn { table, column } => {
                if let Some(t) = self.table_mut(table) {
                    t.columns.retain(|c| &c.name != column);
                }
            }
            Operation::AlterColumn { table, column } => {
                if let Some(existing) = self
                    .table_mut(table)
                    .and_then(|t| t.columns.iter_mut().find(|c| c.name == column.name))
                {
                    *existing = column.clone();
                }
            }
            Operation::CreateIndex { index } => {
                if self.index(&index.name).is_none() {
                    self.indexes.push(index.clone());
                }
            }
            Operation::DropIndex { name } => self.indexes.retain(|i| &i.name != name),
            Operation::Sql { .. } => {}
        }
    }

    fn table_mut(&mut self, name: &str) -> Option<&mut TableDef> {
        self.tables.iter_mut().find(|t| t.name == name)
    }
}

fn ensure_unique<T>(kind: &str, names: impl IntoIterator<Item = T>) -> Result<()>
where
    T: Eq + Hash + Display,
{
    let mut seen = HashSet::new();
    for name in names {
        if seen.contains(&name) {
            return Err(StrataError::Config(format!(
                "Duplicate {} '{}' in model",
                kind, name
            )));
        }
        seen.insert(name);
    }
    Ok(())
}

/// Definition of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name in SQL.
    pub name: String,

    /// Columns, in declaration order.
    #[serde(default)]
    pub columns: Vec<ColumnDef>,

    /// Primary key column names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
}

impl TableDef {
    /// Create a new table definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Look up a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Definition of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name in SQL.
    pub name: String,

    /// SQL type.
    #[serde(rename = "type")]
    pub sql_type: SqlType,

    /// Whether the column accepts NULL.
    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// Default value expression (SQL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDef {
    /// Create a nullable column without a default.
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: true,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }
}

/// Definition of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexDef {
    pub fn new<I, S>(name: impl Into<String>, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}
