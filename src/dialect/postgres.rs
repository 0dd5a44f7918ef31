//! PostgreSQL.

use super::ansi::double_quote;
use super::Dialect;
use crate::error::UnsupportedTypeError;
use crate::format::is_keyword;
use crate::schema::LogicalType;
use once_cell::sync::Lazy;
use regex::Regex;

/// Identifiers that survive case folding unchanged
static LOWER_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn map_type(&self, ty: LogicalType) -> Result<String, UnsupportedTypeError> {
        let name = match ty {
            LogicalType::Boolean => "BOOLEAN".to_string(),
            LogicalType::SmallInt => "SMALLINT".to_string(),
            LogicalType::Integer => "INTEGER".to_string(),
            LogicalType::BigInt => "BIGINT".to_string(),
            LogicalType::Float => "REAL".to_string(),
            LogicalType::Double => "DOUBLE PRECISION".to_string(),
            LogicalType::Decimal { precision, scale } => {
                format!("NUMERIC({}, {})", precision, scale)
            }
            LogicalType::String { length } => format!("VARCHAR({})", length),
            LogicalType::Char { length } => format!("CHAR({})", length),
            LogicalType::Text => "TEXT".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::Timestamp => "TIMESTAMP".to_string(),
            LogicalType::Uuid => "UUID".to_string(),
            LogicalType::Binary { .. } | LogicalType::Blob => "BYTEA".to_string(),
        };
        Ok(name)
    }

    /// Quoted unless the name is lower case and not reserved
    fn quote_identifier(&self, name: &str) -> String {
        if LOWER_IDENTIFIER_RE.is_match(name) && !is_keyword(name) {
            name.to_string()
        } else {
            double_quote(name)
        }
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE", self.quote_identifier(table))
    }

    fn drop_constraint_sql(&self, table: &str, constraint: &str) -> String {
        format!(
            "ALTER TABLE IF EXISTS {} DROP CONSTRAINT IF EXISTS {}",
            self.quote_identifier(table),
            self.quote_identifier(constraint)
        )
    }
}
