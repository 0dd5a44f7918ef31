//! Generic ANSI SQL.

use super::Dialect;
use crate::error::UnsupportedTypeError;
use crate::format::is_keyword;
use crate::schema::LogicalType;
use once_cell::sync::Lazy;
use regex::Regex;

/// Regular identifier: letter or underscore, then letters, digits, underscores
static PLAIN_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Double-quote `name`, doubling embedded quotes
pub(super) fn double_quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ansi"
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
                format!("DECIMAL({}, {})", precision, scale)
            }
            LogicalType::String { length } => format!("VARCHAR({})", length),
            LogicalType::Char { length } => format!("CHAR({})", length),
            LogicalType::Text => "CLOB".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::Timestamp => "TIMESTAMP".to_string(),
            LogicalType::Binary { length } => format!("VARBINARY({})", length),
            LogicalType::Blob => "BLOB".to_string(),
            LogicalType::Uuid => return Err(UnsupportedTypeError::new(self.name(), ty)),
        };
        Ok(name)
    }

    fn quote_identifier(&self, name: &str) -> String {
        if PLAIN_IDENTIFIER_RE.is_match(name) && !is_keyword(name) {
            name.to_string()
        } else {
            double_quote(name)
        }
    }
}
