//! Script rendering and assembly.
//!
//! Turns a schema plus its [`CreatePlan`] into ordered statements and joins
//! formatted statements into a delimited script.

use crate::dialect::Dialect;
use crate::error::UnsupportedTypeError;
use crate::format::format;
use crate::schema::{CreatePlan, ForeignKey, FkRef, Schema};
use std::fmt;

/// Kind of DDL statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    CreateTable,
    CreateIndex,
    AddConstraint,
    DropConstraint,
    DropTable,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::CreateTable => "create-table",
            StatementKind::CreateIndex => "create-index",
            StatementKind::AddConstraint => "add-constraint",
            StatementKind::DropConstraint => "drop-constraint",
            StatementKind::DropTable => "drop-table",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dialect-specific SQL text for one statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStatement {
    pub kind: StatementKind,
    /// Table the statement acts on
    pub table: String,
    /// Raw, unformatted SQL without delimiter
    pub sql: String,
}

impl RenderedStatement {
    pub fn new(kind: StatementKind, table: &str, sql: String) -> Self {
        Self {
            kind,
            table: table.to_string(),
            sql,
        }
    }
}

fn fk_at<'s>(schema: &'s Schema, r: FkRef) -> Option<&'s ForeignKey> {
    schema
        .table(r.table)
        .and_then(|t| t.foreign_keys.get(r.index))
}

/// Statements of the create script, in execution order.
///
/// Every table (followed by its indexes) comes first; deferred foreign keys
/// are attached afterwards.
pub fn render_create(
    schema: &Schema,
    plan: &CreatePlan,
    dialect: &dyn Dialect,
) -> Result<Vec<RenderedStatement>, UnsupportedTypeError> {
    let mut statements = Vec::with_capacity(plan.order.len() * 2 + plan.deferred.len());

    for &table_id in &plan.order {
        let Some(table) = schema.table(table_id) else {
            continue;
        };
        let inline: Vec<&ForeignKey> = table
            .foreign_keys
            .iter()
            .enumerate()
            .filter(|(i, _)| !plan.is_deferred(table_id, *i))
            .map(|(_, fk)| fk)
            .collect();
        statements.push(dialect.render_create_table(table, &inline)?);
        for index in &table.indexes {
            statements.push(dialect.render_create_index(table, index));
        }
    }

    for &r in &plan.deferred {
        if let Some(fk) = fk_at(schema, r) {
            statements.push(dialect.render_add_foreign_key(fk));
        }
    }

    Ok(statements)
}

/// Statements of the drop script: the create phases in reverse.
pub fn render_drop(schema: &Schema, plan: &CreatePlan, dialect: &dyn Dialect) -> Vec<RenderedStatement> {
    let mut statements = Vec::with_capacity(plan.order.len() + plan.deferred.len());

    for r in plan.drop_constraints() {
        if let Some(fk) = fk_at(schema, r) {
            statements.push(dialect.render_drop_constraint(fk));
        }
    }
    for table_id in plan.drop_order() {
        if let Some(table) = schema.table(table_id) {
            statements.push(dialect.render_drop_table(table));
        }
    }

    statements
}

/// Join statements into one script.
///
/// Each statement becomes its formatted text, a newline, the delimiter and
/// a newline. Blocks are separated by one blank line.
pub fn assemble(statements: &[RenderedStatement], delimiter: &str) -> String {
    let blocks: Vec<String> = statements
        .iter()
        .map(|s| format!("{}\n{}\n", format(&s.sql), delimiter))
        .collect();
    blocks.join("\n")
}
