//! SQL dialect rendering.
//!
//! A [`Dialect`] maps logical column types to vendor type names, quotes
//! identifiers and renders the DDL statements of a script. Statement
//! rendering is shared; dialects override the pieces that differ.

mod ansi;
mod mysql;
mod postgres;

pub use ansi::AnsiDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;

use crate::error::UnsupportedTypeError;
use crate::schema::{ForeignKey, IndexDef, LogicalType, Table};
use crate::script::{RenderedStatement, StatementKind};
use std::fmt;

/// Capability interface every SQL dialect implements.
///
/// Implementations hold no state, so one instance serves concurrent
/// renderers.
pub trait Dialect: Send + Sync {
    /// Short identifier used in messages (`ansi`, `mysql`, ...)
    fn name(&self) -> &'static str;

    /// Concrete type name for a logical type
    fn map_type(&self, ty: LogicalType) -> Result<String, UnsupportedTypeError>;

    /// Quote an identifier when the dialect requires it
    fn quote_identifier(&self, name: &str) -> String;

    /// Text appended after the closing parenthesis of CREATE TABLE
    fn table_suffix(&self) -> &'static str {
        ""
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE {}", self.quote_identifier(table))
    }

    fn drop_constraint_sql(&self, table: &str, constraint: &str) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_identifier(table),
            self.quote_identifier(constraint)
        )
    }

    /// Comma-separated, quoted column list
    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `FOREIGN KEY (...) REFERENCES t(...)` body shared by inline and ALTER forms
    fn foreign_key_clause(&self, fk: &ForeignKey) -> String {
        format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
            self.quote_identifier(&fk.name),
            self.column_list(&fk.columns),
            self.quote_identifier(&fk.referenced_table),
            self.column_list(&fk.referenced_columns)
        )
    }

    /// Render CREATE TABLE with the given foreign keys declared inline.
    fn render_create_table(
        &self,
        table: &Table,
        inline_fks: &[&ForeignKey],
    ) -> Result<RenderedStatement, UnsupportedTypeError> {
        let single_pk = table.primary_key.len() == 1;
        let mut defs = Vec::with_capacity(table.columns.len() + 2);

        for column in &table.columns {
            let type_name = self
                .map_type(column.col_type)
                .map_err(|e| e.at(&table.name, &column.name))?;
            let mut def = format!("{} {}", self.quote_identifier(&column.name), type_name);
            if let Some(default) = &column.default {
                def.push_str(" DEFAULT ");
                def.push_str(default);
            }
            if !column.is_nullable {
                def.push_str(" NOT NULL");
            }
            if single_pk && table.is_pk_column(column.ordinal) {
                def.push_str(" PRIMARY KEY");
            }
            defs.push(def);
        }

        if table.primary_key.len() > 1 {
            let columns: Vec<String> = table
                .primary_key_columns()
                .map(|c| c.name.clone())
                .collect();
            defs.push(format!(
                "CONSTRAINT {} PRIMARY KEY ({})",
                self.quote_identifier(&format!("pk_{}", table.name)),
                self.column_list(&columns)
            ));
        }

        for unique in &table.unique_constraints {
            defs.push(format!(
                "CONSTRAINT {} UNIQUE ({})",
                self.quote_identifier(&unique.name),
                self.column_list(&unique.columns)
            ));
        }

        for fk in inline_fks {
            defs.push(self.foreign_key_clause(fk));
        }

        let sql = format!(
            "CREATE TABLE {} ({}){}",
            self.quote_identifier(&table.name),
            defs.join(", "),
            self.table_suffix()
        );
        Ok(RenderedStatement::new(StatementKind::CreateTable, &table.name, sql))
    }

    fn render_create_index(&self, table: &Table, index: &IndexDef) -> RenderedStatement {
        let sql = format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.is_unique { "UNIQUE " } else { "" },
            self.quote_identifier(&index.name),
            self.quote_identifier(&table.name),
            self.column_list(&index.columns)
        );
        RenderedStatement::new(StatementKind::CreateIndex, &table.name, sql)
    }

    fn render_add_foreign_key(&self, fk: &ForeignKey) -> RenderedStatement {
        let sql = format!(
            "ALTER TABLE {} ADD {}",
            self.quote_identifier(&fk.table),
            self.foreign_key_clause(fk)
        );
        RenderedStatement::new(StatementKind::AddConstraint, &fk.table, sql)
    }

    fn render_drop_table(&self, table: &Table) -> RenderedStatement {
        RenderedStatement::new(
            StatementKind::DropTable,
            &table.name,
            self.drop_table_sql(&table.name),
        )
    }

    fn render_drop_constraint(&self, fk: &ForeignKey) -> RenderedStatement {
        RenderedStatement::new(
            StatementKind::DropConstraint,
            &fk.table,
            self.drop_constraint_sql(&fk.table, &fk.name),
        )
    }
}

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SqlDialect {
    /// Generic ANSI SQL
    #[default]
    Ansi,
    /// MySQL / MariaDB
    MySql,
    /// PostgreSQL
    Postgres,
}

static ANSI: AnsiDialect = AnsiDialect;
static MYSQL: MySqlDialect = MySqlDialect;
static POSTGRES: PostgresDialect = PostgresDialect;

impl SqlDialect {
    /// All supported dialects
    pub const ALL: [SqlDialect; 3] = [SqlDialect::Ansi, SqlDialect::MySql, SqlDialect::Postgres];

    /// The renderer for this dialect
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            SqlDialect::Ansi => &ANSI,
            SqlDialect::MySql => &MYSQL,
            SqlDialect::Postgres => &POSTGRES,
        }
    }
}

impl std::str::FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ansi" | "sql" => Ok(SqlDialect::Ansi),
            "mysql" | "mariadb" => Ok(SqlDialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(SqlDialect::Postgres),
            _ => Err(format!(
                "Unknown dialect: {}. Valid options: ansi, mysql, postgres",
                s
            )),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
