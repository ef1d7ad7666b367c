//! PostgreSQL rendering of migration operations.
//!
//! Every statement produced here can run twice. A crash between executing a
//! migration and recording it in history means the next upgrade executes it
//! again, so creation is guarded with `IF NOT EXISTS`, removal with
//! `IF EXISTS`, and alterations set absolute state.

use strata_core::migration::{Operation, SqlTranslator};
use strata_core::schema::{ColumnDef, IndexDef, TableDef};

/// Idempotent SQL generator for PostgreSQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgSqlGenerator;

impl PgSqlGenerator {
    pub fn new() -> Self {
        Self
    }

    fn render(&self, op: &Operation, out: &mut Vec<String>) {
        match op {
            Operation::CreateTable { table } => out.push(create_table_sql(table)),
            Operation::DropTable { name } => {
                out.push(format!("DROP TABLE IF EXISTS {}", quote_ident(name)))
            }
            Operation::AddColumn { table, column } => out.push(format!(
                "ALTER TABLE IF EXISTS {} ADD COLUMN IF NOT EXISTS {}",
                quote_ident(table),
                column_sql(column)
            )),
            Operation::DropColumn { table, column } => out.push(format!(
                "ALTER TABLE IF EXISTS {} DROP COLUMN IF EXISTS {}",
                quote_ident(table),
                quote_ident(column)
            )),
            Operation::AlterColumn { table, column } => alter_column_sql(table, column, out),
            Operation::CreateIndex { index } => out.push(create_index_sql(index)),
            Operation::DropIndex { name } => {
                out.push(format!("DROP INDEX IF EXISTS {}", quote_ident(name)))
            }
            Operation::Sql { sql } => out.extend(
                split_sql_statements(sql)
                    .into_iter()
                    .filter(|s| !is_comment_only(s)),
            ),
        }
    }
}

impl SqlTranslator for PgSqlGenerator {
    fn generate_idempotent_sql(&self, operations: &[Operation]) -> Vec<String> {
        let mut statements = Vec::new();
        for op in operations {
            self.render(op, &mut statements);
        }
        statements
    }
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_sql(column: &ColumnDef) -> String {
    let mut sql = format!("{} {}", quote_ident(&column.name), column.sql_type.to_sql());
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(ref default) = column.default {
        sql.push_str(&format!(" DEFAULT {}", default));
    }
    sql
}

fn create_table_sql(table: &TableDef) -> String {
    let mut lines: Vec<String> = table.columns.iter().map(column_sql).collect();

    if !table.primary_key.is_empty() {
        let keys: Vec<String> = table.primary_key.iter().map(|k| quote_ident(k)).collect();
        lines.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote_ident(&table.name),
        lines.join(",\n    ")
    )
}

fn alter_column_sql(table: &str, column: &ColumnDef, out: &mut Vec<String>) {
    let prefix = format!(
        "ALTER TABLE IF EXISTS {} ALTER COLUMN {}",
        quote_ident(table),
        quote_ident(&column.name)
    );
    let ty = column.sql_type.to_sql();

    out.push(format!(
        "{} TYPE {} USING {}::{}",
        prefix,
        ty,
        quote_ident(&column.name),
        ty
    ));
    out.push(if column.nullable {
        format!("{} DROP NOT NULL", prefix)
    } else {
        format!("{} SET NOT NULL", prefix)
    });
    out.push(match column.default {
        Some(ref default) => format!("{} SET DEFAULT {}", prefix, default),
        None => format!("{} DROP DEFAULT", prefix),
    });
}

fn create_index_sql(index: &IndexDef) -> String {
    let columns: Vec<String> = index.columns.iter().map(|c| quote_ident(c)).collect();
    format!(
        "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        quote_ident(&index.name),
        quote_ident(&index.table),
        columns.join(", ")
    )
}

fn is_comment_only(statement: &str) -> bool {
    statement.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with("--")
    })
}

/// Breaks a raw SQL script into the statements executed one by one.
///
/// A `;` ends a statement only outside quoting. Both `'...'` literals and
/// dollar-quoted bodies (`$$ ... $$`, `$fn$ ... $fn$`) are opaque, so function
/// bodies and string values keep their semicolons. Terminators are dropped and
/// blank pieces are skipped.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut open_tag: Option<String> = None;
    let mut in_literal = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        match c {
            '\'' if open_tag.is_none() => in_literal = !in_literal,
            '$' if !in_literal => {
                let Some(tag) = read_dollar_tag(&mut chars, &mut current) else {
                    continue;
                };
                match &open_tag {
                    Some(open) if *open == tag => open_tag = None,
                    Some(_) => {}
                    None => open_tag = Some(tag),
                }
            }
            ';' if !in_literal && open_tag.is_none() => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => {}
        }
    }

    push_statement(&mut statements, &current);
    statements
}

/// Consumes the rest of a `$tag$` delimiter after its opening `$`.
/// Returns `None` when the `$` is a positional parameter or plain text.
fn read_dollar_tag<I>(chars: &mut std::iter::Peekable<I>, current: &mut String) -> Option<String>
where
    I: Iterator<Item = char>,
{
    let mut tag = String::from("$");
    while let Some(&next) = chars.peek() {
        if next == '$' {
            chars.next();
            current.push(next);
            tag.push(next);
            return Some(tag);
        }
        if !(next.is_alphanumeric() || next == '_') {
            break;
        }
        chars.next();
        current.push(next);
        tag.push(next);
    }
    None
}

fn push_statement(statements: &mut Vec<String>, piece: &str) {
    let statement = piece.trim().trim_end_matches(';').trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
}
