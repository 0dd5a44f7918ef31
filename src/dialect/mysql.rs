//! MySQL / MariaDB.

use super::Dialect;
use crate::error::UnsupportedTypeError;
use crate::schema::LogicalType;

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn map_type(&self, ty: LogicalType) -> Result<String, UnsupportedTypeError> {
        let name = match ty {
            LogicalType::Boolean => "TINYINT(1)".to_string(),
            LogicalType::SmallInt => "SMALLINT".to_string(),
            LogicalType::Integer => "INT".to_string(),
            LogicalType::BigInt => "BIGINT".to_string(),
            LogicalType::Float => "FLOAT".to_string(),
            LogicalType::Double => "DOUBLE".to_string(),
            LogicalType::Decimal { precision, scale } => {
                format!("DECIMAL({}, {})", precision, scale)
            }
            LogicalType::String { length } => format!("VARCHAR({})", length),
            LogicalType::Char { length } => format!("CHAR({})", length),
            LogicalType::Text => "LONGTEXT".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::Timestamp => "DATETIME".to_string(),
            LogicalType::Uuid => "CHAR(36)".to_string(),
            LogicalType::Binary { length } => format!("VARBINARY({})", length),
            LogicalType::Blob => "LONGBLOB".to_string(),
        };
        Ok(name)
    }

    /// Always backtick-quoted; embedded backticks are doubled
    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn table_suffix(&self) -> &'static str {
        " ENGINE=InnoDB"
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_identifier(table))
    }

    fn drop_constraint_sql(&self, table: &str, constraint: &str) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quote_identifier(table),
            self.quote_identifier(constraint)
        )
    }
}
